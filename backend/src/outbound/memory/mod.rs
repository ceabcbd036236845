//! In-process implementation of every persistence port.
//!
//! [`InMemoryStore`] keeps outbox records, mappings and members behind one
//! mutex and offers [`InMemoryStore::transaction`], which restores the
//! previous state when the closure fails. It follows the same uniqueness and
//! ordering rules as the PostgreSQL adapters, which makes it suitable for
//! single-process deployments and for exercising the services without a
//! database.

mod mappings;
mod members;
mod outbox;
mod state;


use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mockable::Clock;

use state::MemoryState;
pub use state::MemoryTransaction;

/// Shared in-memory store; clones share state.
#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    /// Create an empty store stamping writes with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            clock,
        }
    }

    /// Run `operation` atomically.
    ///
    /// Every change made through the transaction is discarded when
    /// `operation` returns `Err`.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use hybrid_cloud::domain::{NewOutboxRecord, OrganizationId, OutboxCategory, ShardKey};
    /// use hybrid_cloud::outbound::memory::InMemoryStore;
    /// use mockable::DefaultClock;
    ///
    /// let store = InMemoryStore::new(Arc::new(DefaultClock));
    /// let record = NewOutboxRecord::new(
    ///     ShardKey::organization(OrganizationId::new(1)),
    ///     OutboxCategory::OrganizationUpdate,
    ///     1,
    ///     Default::default(),
    /// );
    /// let result: Result<(), &str> = store.transaction(|tx| {
    ///     tx.enqueue(&record);
    ///     Err("abort")
    /// });
    /// assert!(result.is_err());
    /// assert_eq!(store.pending_outbox_len(), 0);
    /// ```
    pub fn transaction<T, E>(
        &self,
        operation: impl FnOnce(&mut MemoryTransaction<'_>) -> Result<T, E>,
    ) -> Result<T, E> {
        let now = self.clock.utc();
        let mut guard = self.lock();
        let snapshot = guard.clone();
        let result = {
            let mut tx = MemoryTransaction::new(&mut guard, now);
            operation(&mut tx)
        };
        if result.is_err() {
            *guard = snapshot;
        }
        result
    }

    /// Number of outbox records not yet acknowledged.
    pub fn pending_outbox_len(&self) -> usize {
        self.lock().outbox_len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
