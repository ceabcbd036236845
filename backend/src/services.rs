//! Startup wiring: pick a store and resolve every port for the silo mode.
//!
//! [`SiloServices::from_settings`] is called once per process: it reads the
//! silo mode, connects the configured store and resolves every port. It
//! consults one
//! [`SiloDelegation`] table per stubbable port, so a region silo ends up
//! with a mapping service that refuses every call and a control silo with a
//! member repository that does the same. Stub constructors never touch the
//! store.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::config::HybridCloudSettings;
use crate::domain::ports::{
    OrganizationMappingRepository, OrganizationMappingService, OrganizationMemberRepository,
    OutboxStore,
};
use crate::domain::{
    Delegate, MembershipChangePropagator, OrganizationMappingServiceImpl, ParseSiloModeError,
    SiloDelegation, SiloMode,
};
use crate::outbound::memory::InMemoryStore;
use crate::outbound::persistence::{
    DbPool, DieselOrganizationMappingRepository, DieselOrganizationMemberRepository,
    DieselOutboxStore, PoolError,
};

/// Store backing every port of a process.
#[derive(Clone)]
pub enum PersistenceBackend {
    /// PostgreSQL through a shared Diesel pool.
    Postgres(DbPool),
    /// Process-local state; nothing survives a restart.
    InMemory(InMemoryStore),
}

impl PersistenceBackend {
    /// Connect to the configured database, or fall back to memory when no
    /// database URL is configured.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError`] when a database is configured but the pool
    /// cannot be built.
    pub async fn from_settings(
        settings: &HybridCloudSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PoolError> {
        match settings.pool_config() {
            Some(config) => Ok(Self::Postgres(DbPool::new(config).await?)),
            None => {
                info!("no database configured; using the in-memory store");
                Ok(Self::InMemory(InMemoryStore::new(clock)))
            }
        }
    }

    fn mapping_repository(&self) -> Arc<dyn OrganizationMappingRepository> {
        match self {
            Self::Postgres(pool) => Arc::new(DieselOrganizationMappingRepository::new(pool.clone())),
            Self::InMemory(store) => Arc::new(store.clone()),
        }
    }

    fn member_repository(&self) -> Arc<dyn OrganizationMemberRepository> {
        match self {
            Self::Postgres(pool) => Arc::new(DieselOrganizationMemberRepository::new(pool.clone())),
            Self::InMemory(store) => Arc::new(store.clone()),
        }
    }

    fn outbox_store(&self) -> Arc<dyn OutboxStore> {
        match self {
            Self::Postgres(pool) => Arc::new(DieselOutboxStore::new(pool.clone())),
            Self::InMemory(store) => Arc::new(store.clone()),
        }
    }
}

/// Startup failures of [`SiloServices::from_settings`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    SiloMode(#[from] ParseSiloModeError),
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Delegation table for the mapping service: the control silo owns slugs.
fn mapping_delegation(
    backend: &PersistenceBackend,
    default_region: Option<&str>,
) -> SiloDelegation<dyn OrganizationMappingService> {
    let local = |backend: PersistenceBackend| {
        let default_region = default_region.map(str::to_owned);
        Delegate::local(move || {
            let service = OrganizationMappingServiceImpl::new(backend.mapping_repository());
            let service = match default_region {
                Some(region) => service.with_default_region(region),
                None => service,
            };
            Arc::new(service) as Arc<dyn OrganizationMappingService>
        })
    };
    SiloDelegation::new(
        local(backend.clone()),
        Delegate::stubbed(SiloMode::Control),
        local(backend.clone()),
    )
}

/// Delegation table for member storage: region silos own memberships.
fn member_delegation(backend: &PersistenceBackend) -> SiloDelegation<dyn OrganizationMemberRepository> {
    let local = |backend: PersistenceBackend| {
        Delegate::local(move || backend.member_repository())
    };
    SiloDelegation::new(
        local(backend.clone()),
        local(backend.clone()),
        Delegate::stubbed(SiloMode::Region),
    )
}

/// Every port of the consistency core, resolved for one silo.
#[derive(Clone)]
pub struct SiloServices {
    silo_mode: SiloMode,
    organization_mapping: Arc<dyn OrganizationMappingService>,
    membership: MembershipChangePropagator<dyn OrganizationMemberRepository>,
    outbox: Arc<dyn OutboxStore>,
}

impl SiloServices {
    /// Read the silo mode and store from `settings` and resolve every port.
    ///
    /// New mappings without a region get `settings.region_name()`.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] for an unknown silo mode or a database that
    /// cannot be pooled.
    pub async fn from_settings(
        settings: &HybridCloudSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StartupError> {
        let mode = settings.silo_mode()?;
        let backend = PersistenceBackend::from_settings(settings, Arc::clone(&clock)).await?;
        Ok(Self::resolve(
            mode,
            &backend,
            clock,
            Some(settings.region_name()),
        ))
    }

    /// Resolve every port for `mode` against `backend`.
    pub fn build(mode: SiloMode, backend: &PersistenceBackend, clock: Arc<dyn Clock>) -> Self {
        Self::resolve(mode, backend, clock, None)
    }

    fn resolve(
        mode: SiloMode,
        backend: &PersistenceBackend,
        clock: Arc<dyn Clock>,
        default_region: Option<&str>,
    ) -> Self {
        let organization_mapping = mapping_delegation(backend, default_region).resolve(mode);
        let members = member_delegation(backend).resolve(mode);
        info!(silo = %mode, "silo services resolved");
        Self {
            silo_mode: mode,
            organization_mapping,
            membership: MembershipChangePropagator::new(members, clock),
            outbox: backend.outbox_store(),
        }
    }

    /// Silo the services were resolved for.
    pub fn silo_mode(&self) -> SiloMode {
        self.silo_mode
    }

    /// Slug mapping service; a stub outside the owning silo.
    pub fn organization_mapping(&self) -> Arc<dyn OrganizationMappingService> {
        Arc::clone(&self.organization_mapping)
    }

    /// Membership writes with their outbox records.
    pub fn membership(&self) -> &MembershipChangePropagator<dyn OrganizationMemberRepository> {
        &self.membership
    }

    /// Outbox of this silo's store.
    pub fn outbox(&self) -> Arc<dyn OutboxStore> {
        Arc::clone(&self.outbox)
    }
}
