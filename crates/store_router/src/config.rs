//! Application configuration
//!
//! One document with a section per store. Environment variables override
//! the defaults with an `APP` prefix and `__` section separator, e.g.
//! `APP_STORE_A__DATABASE_URL` or `APP_STORE_B__API_KEY`; a local `.env`
//! file is honored.

use serde::{Deserialize, Serialize};

/// Store A pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreAConfig {
    /// MySQL connection string
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Store B endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreBConfig {
    /// Base URL of the PostgREST deployment
    pub base_url: String,
    /// Project api key sent alongside per-caller bearers
    pub api_key: String,
}

/// Top-level configuration for the routing layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub store_a: StoreAConfig,
    pub store_b: StoreBConfig,
    /// Log level filter
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_a: StoreAConfig {
                database_url: "mysql://localhost/finance".to_string(),
                max_connections: 10,
                min_connections: 2,
            },
            store_b: StoreBConfig {
                base_url: "http://localhost:3000".to_string(),
                api_key: "change-me-in-production".to_string(),
            },
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the environment over the defaults
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }
}
