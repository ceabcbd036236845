//! Silo-aware service resolution.
//!
//! Each service port declares, per [`SiloMode`], whether the process builds a
//! local implementation or installs a stub that rejects every call on behalf
//! of the authoritative silo. Resolution happens once, at startup, and yields
//! a plain `Arc<dyn Port>` that callers use without knowing which silo they
//! run in.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::domain::SiloMode;

/// Ports that can be replaced by a stub in silos that do not own them.
pub trait StubbedService {
    /// Build the stub used when `current` is not authoritative; calls are
    /// redirected in error messages to `authority`.
    fn stubbed(current: SiloMode, authority: SiloMode) -> Arc<Self>;
}

/// How one silo obtains an implementation of `S`.
pub enum Delegate<S: ?Sized> {
    /// Build the local implementation.
    Local(Box<dyn FnOnce() -> Arc<S> + Send>),
    /// Install a stub; the operations belong to `authority`.
    Stubbed { authority: SiloMode },
}

impl<S: ?Sized> Delegate<S> {
    /// Local delegate from a constructor.
    pub fn local(constructor: impl FnOnce() -> Arc<S> + Send + 'static) -> Self {
        Self::Local(Box::new(constructor))
    }

    /// Stub delegate for operations owned by `authority`.
    pub fn stubbed(authority: SiloMode) -> Self {
        Self::Stubbed { authority }
    }
}

impl<S: ?Sized> fmt::Debug for Delegate<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(_) => f.write_str("Local"),
            Self::Stubbed { authority } => f
                .debug_struct("Stubbed")
                .field("authority", authority)
                .finish(),
        }
    }
}

/// Per-silo delegation table for one service port.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use hybrid_cloud::domain::ports::OrganizationMappingService;
/// use hybrid_cloud::domain::{Delegate, SiloDelegation, SiloMode};
///
/// let table: SiloDelegation<dyn OrganizationMappingService> = SiloDelegation::new(
///     Delegate::stubbed(SiloMode::Control),
///     Delegate::stubbed(SiloMode::Control),
///     Delegate::stubbed(SiloMode::Control),
/// );
/// let _service: Arc<dyn OrganizationMappingService> = table.resolve(SiloMode::Region);
/// ```
#[derive(Debug)]
pub struct SiloDelegation<S: ?Sized> {
    monolith: Delegate<S>,
    region: Delegate<S>,
    control: Delegate<S>,
}

impl<S> SiloDelegation<S>
where
    S: StubbedService + ?Sized,
{
    pub fn new(monolith: Delegate<S>, region: Delegate<S>, control: Delegate<S>) -> Self {
        Self {
            monolith,
            region,
            control,
        }
    }

    /// Consume the table and build the implementation for `mode`.
    pub fn resolve(self, mode: SiloMode) -> Arc<S> {
        let delegate = match mode {
            SiloMode::Monolith => self.monolith,
            SiloMode::Region => self.region,
            SiloMode::Control => self.control,
        };
        match delegate {
            Delegate::Local(constructor) => {
                info!(silo = %mode, "resolved local service implementation");
                constructor()
            }
            Delegate::Stubbed { authority } => {
                info!(silo = %mode, %authority, "resolved stubbed service implementation");
                S::stubbed(mode, authority)
            }
        }
    }
}
