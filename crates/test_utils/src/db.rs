//! Database Test Utilities
//!
//! Container management for the opt-in live Store-A tests. The store
//! crate applies its own migrations; this module only provides a running
//! MySQL and a pool pointed at it.

use std::time::Duration;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use testcontainers_modules::{
    mysql::Mysql,
    testcontainers::{runners::AsyncRunner, ContainerAsync},
};

/// A MySQL test container and a pool connected to it
///
/// The container is torn down when this value drops.
pub struct TestMySql {
    _container: ContainerAsync<Mysql>,
    pool: MySqlPool,
}

impl TestMySql {
    /// Starts a fresh MySQL container (needs Docker)
    pub async fn start() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let container = Mysql::default().start().await?;
        let host = container.get_host().await?.to_string();
        let port = container.get_host_port_ipv4(3306).await?;

        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&format!("mysql://root@{host}:{port}/test"))
            .await?;

        Ok(Self {
            _container: container,
            pool,
        })
    }

    /// The pool connected to the container
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

/// Initializes a test-friendly tracing subscriber, once per process
pub fn init_test_tracing() {
    static INIT: once_cell::sync::OnceCell<()> = once_cell::sync::OnceCell::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .with_test_writer()
            .try_init();
    });
}
