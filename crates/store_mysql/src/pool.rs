//! MySQL connection pool management for Store A

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::time::Duration;
use tracing::info;

use core_kernel::StoreError;

use crate::error::STORE_NAME;

/// Type alias for the MySQL connection pool
pub type StorePool = MySqlPool;

/// Configuration options for the connection pool
#[derive(Debug, Clone)]
pub struct MySqlConfig {
    /// MySQL connection string
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Maximum lifetime of a connection
    pub max_lifetime: Duration,
    /// Idle timeout before closing a connection
    pub idle_timeout: Duration,
}

impl MySqlConfig {
    /// Creates a configuration with sensible defaults for the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
            max_lifetime: Duration::from_secs(30 * 60),
            idle_timeout: Duration::from_secs(10 * 60),
        }
    }

    /// Sets the maximum number of connections in the pool
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections to maintain
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout duration
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn options(&self) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.connect_timeout)
            .max_lifetime(self.max_lifetime)
            .idle_timeout(self.idle_timeout)
    }
}

/// Creates a connection pool and verifies connectivity
pub async fn create_pool(config: &MySqlConfig) -> Result<StorePool, StoreError> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "creating mysql pool"
    );

    let pool = config
        .options()
        .connect(&config.url)
        .await
        .map_err(|e| StoreError::unavailable_from(STORE_NAME, e))?;

    info!("mysql pool ready");
    Ok(pool)
}

/// Creates a connection pool without touching the network
///
/// Connections are established on first use, so the router can be
/// constructed before the database is reachable. Unreachability then
/// surfaces as `Unavailable` on the first operation, not at startup.
pub fn connect_lazy(config: &MySqlConfig) -> Result<StorePool, StoreError> {
    config
        .options()
        .connect_lazy(&config.url)
        .map_err(|e| StoreError::unavailable_from(STORE_NAME, e))
}

/// Process-wide pool, created on first use and reused for the life of the
/// process
///
/// Deployments that talk only to Store A can call this instead of carrying
/// a pool of their own. The first caller's configuration wins; later
/// configurations are ignored.
pub async fn shared_pool(config: &MySqlConfig) -> Result<&'static StorePool, StoreError> {
    static SHARED: tokio::sync::OnceCell<StorePool> = tokio::sync::OnceCell::const_new();
    SHARED.get_or_try_init(|| create_pool(config)).await
}

/// The embedded schema migrations for Store A
pub fn migrator() -> &'static sqlx::migrate::Migrator {
    static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
    &MIGRATOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = MySqlConfig::new("mysql://test")
            .max_connections(50)
            .min_connections(10)
            .connect_timeout(Duration::from_secs(60));

        assert_eq!(config.max_connections, 50);
        assert_eq!(config.min_connections, 10);
        assert_eq!(config.connect_timeout, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn lazy_pool_needs_no_server() {
        let pool = connect_lazy(&MySqlConfig::new("mysql://nobody@localhost:1/none"));
        assert!(pool.is_ok());
    }
}
