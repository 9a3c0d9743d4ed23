//! Storage configuration loaded via OrthoConfig.

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/warehouse";

/// Configuration values for the PostgreSQL connection pool.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "WAREHOUSE_DB")]
pub struct StorageSettings {
    /// Database connection URL.
    pub database_url: Option<String>,
    /// Maximum pool size.
    #[ortho_config(default = 10)]
    pub max_connections: u32,
    /// Minimum idle connections to keep warm.
    pub min_idle: Option<u32>,
    /// Connection checkout timeout in seconds.
    #[ortho_config(default = 30)]
    pub connection_timeout_secs: u64,
}

impl StorageSettings {
    /// Return the configured database URL, falling back to the default.
    pub fn database_url(&self) -> &str {
        self.database_url.as_deref().unwrap_or(DEFAULT_DATABASE_URL)
    }
}
