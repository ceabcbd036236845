//! Process configuration loaded via OrthoConfig.
//!
//! Values come from `HYBRID_CLOUD_*` environment variables (or a matching
//! configuration file) layered over the defaults declared on each field.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{ParseSiloModeError, SiloMode};
use crate::outbound::persistence::PoolConfig;

const DEFAULT_SILO_MODE: &str = "monolith";
const DEFAULT_REGION_NAME: &str = "us";
const DEFAULT_POOL_CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Settings shared by every process embedding the consistency core.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HYBRID_CLOUD")]
pub struct HybridCloudSettings {
    /// Silo this process runs in: `monolith`, `region` or `control`.
    #[ortho_config(default = String::from(DEFAULT_SILO_MODE))]
    pub silo_mode: String,
    /// PostgreSQL connection URL. Without one, stores are kept in memory.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    #[ortho_config(default = PoolConfig::DEFAULT_MAX_SIZE)]
    pub pool_max_size: u32,
    /// Idle connections the pool keeps open.
    #[ortho_config(default = PoolConfig::DEFAULT_MIN_IDLE)]
    pub pool_min_idle: u32,
    /// Seconds to wait for a pooled connection.
    #[ortho_config(default = DEFAULT_POOL_CONNECTION_TIMEOUT_SECS)]
    pub pool_connection_timeout_secs: u64,
    /// Region this silo serves; new mappings without a region get it.
    #[ortho_config(default = String::from(DEFAULT_REGION_NAME))]
    pub region_name: String,
}

impl Default for HybridCloudSettings {
    fn default() -> Self {
        Self {
            silo_mode: DEFAULT_SILO_MODE.to_owned(),
            database_url: None,
            pool_max_size: PoolConfig::DEFAULT_MAX_SIZE,
            pool_min_idle: PoolConfig::DEFAULT_MIN_IDLE,
            pool_connection_timeout_secs: DEFAULT_POOL_CONNECTION_TIMEOUT_SECS,
            region_name: DEFAULT_REGION_NAME.to_owned(),
        }
    }
}

impl HybridCloudSettings {
    /// Configured silo mode.
    ///
    /// # Errors
    ///
    /// Returns [`ParseSiloModeError`] for unrecognised values.
    pub fn silo_mode(&self) -> Result<SiloMode, ParseSiloModeError> {
        self.silo_mode.parse()
    }

    /// Configured database URL, if any.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    /// Region this silo serves.
    pub fn region_name(&self) -> &str {
        &self.region_name
    }

    /// Pool configuration for the configured database, if any.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        let database_url = self.database_url()?;
        Some(
            PoolConfig::new(database_url)
                .with_max_size(self.pool_max_size)
                .with_min_idle(Some(self.pool_min_idle))
                .with_connection_timeout(Duration::from_secs(
                    self.pool_connection_timeout_secs,
                )),
        )
    }
}
