//! The adapter factory
//!
//! The single place where a caller's role picks a store. Everything else
//! in the system asks the router for a trait object and never learns
//! which backend answered, so no code path can reach the store a caller
//! does not own.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use core_kernel::{CallerIdentity, Role, StoreError};
use domain_budget::BudgetStore;
use domain_debt::DebtStore;
use domain_recurring::RecurringStore;
use store_mysql::{MySqlBudgetStore, MySqlConfig, MySqlDebtStore, MySqlRecurringStore, StorePool};
use store_postgrest::{
    PostgrestBudgetStore, PostgrestClient, PostgrestConfig, PostgrestDebtStore,
    PostgrestRecurringStore,
};

use crate::config::AppConfig;

/// Which of the two fixed backends a caller routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Store A: MySQL, keyed by numeric admin id
    Relational,
    /// Store B: PostgREST, keyed by opaque id with a per-caller bearer
    Rest,
}

/// Routes callers to the store their role owns
#[derive(Debug, Clone)]
pub struct StoreRouter {
    pool: StorePool,
    http: reqwest::Client,
    postgrest: PostgrestConfig,
}

static SHARED: OnceCell<StoreRouter> = OnceCell::const_new();

impl StoreRouter {
    pub fn new(pool: StorePool, http: reqwest::Client, postgrest: PostgrestConfig) -> Self {
        Self {
            pool,
            http,
            postgrest,
        }
    }

    /// Builds a router from configuration without touching the network
    ///
    /// The MySQL pool is lazy, so construction succeeds even when Store A
    /// is down; unavailability surfaces on first use.
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let pool = store_mysql::connect_lazy(
            &MySqlConfig::new(&config.store_a.database_url)
                .max_connections(config.store_a.max_connections)
                .min_connections(config.store_a.min_connections),
        )?;
        Ok(Self::new(
            pool,
            reqwest::Client::new(),
            PostgrestConfig {
                base_url: config.store_b.base_url.clone(),
                api_key: config.store_b.api_key.clone(),
            },
        ))
    }

    /// The process-wide router, created at most once from the environment
    /// and never torn down
    pub async fn shared() -> Result<&'static StoreRouter, StoreError> {
        SHARED
            .get_or_try_init(|| async {
                let config = AppConfig::from_env()
                    .map_err(|e| StoreError::routing(format!("configuration error: {e}")))?;
                Self::from_config(&config)
            })
            .await
    }

    /// The routing decision: a pure match on the caller's role
    ///
    /// `Admin` requires a numeric id, `User` requires a credential; either
    /// precondition failing is a fatal `Routing` error at factory time,
    /// never a sentinel value flowing onward.
    pub fn backend(&self, identity: &CallerIdentity) -> Result<StoreKind, StoreError> {
        match identity.role {
            Role::Admin => {
                identity.require_numeric()?;
                Ok(StoreKind::Relational)
            }
            Role::User => {
                identity.require_credential()?;
                Ok(StoreKind::Rest)
            }
        }
    }

    fn rest_client(&self, identity: &CallerIdentity) -> Result<PostgrestClient, StoreError> {
        let credential = identity.require_credential()?;
        Ok(PostgrestClient::for_caller(
            self.http.clone(),
            self.postgrest.clone(),
            identity.canonical_id.clone(),
            credential,
        ))
    }

    /// Recurring-pattern store for this caller
    pub fn recurring(
        &self,
        identity: &CallerIdentity,
    ) -> Result<Arc<dyn RecurringStore>, StoreError> {
        let kind = self.backend(identity)?;
        debug!(role = %identity.role, backend = ?kind, "recurring adapter");
        match kind {
            StoreKind::Relational => Ok(Arc::new(MySqlRecurringStore::new(
                self.pool.clone(),
                identity.require_numeric()?,
            ))),
            StoreKind::Rest => Ok(Arc::new(PostgrestRecurringStore::new(
                self.rest_client(identity)?,
            )?)),
        }
    }

    /// Debt store for this caller
    pub fn debts(&self, identity: &CallerIdentity) -> Result<Arc<dyn DebtStore>, StoreError> {
        let kind = self.backend(identity)?;
        debug!(role = %identity.role, backend = ?kind, "debt adapter");
        match kind {
            StoreKind::Relational => Ok(Arc::new(MySqlDebtStore::new(
                self.pool.clone(),
                identity.require_numeric()?,
            ))),
            StoreKind::Rest => Ok(Arc::new(PostgrestDebtStore::new(
                self.rest_client(identity)?,
            )?)),
        }
    }

    /// Budget store for this caller
    pub fn budget(&self, identity: &CallerIdentity) -> Result<Arc<dyn BudgetStore>, StoreError> {
        let kind = self.backend(identity)?;
        debug!(role = %identity.role, backend = ?kind, "budget adapter");
        match kind {
            StoreKind::Relational => Ok(Arc::new(MySqlBudgetStore::new(
                self.pool.clone(),
                identity.require_numeric()?,
            ))),
            StoreKind::Rest => Ok(Arc::new(PostgrestBudgetStore::new(
                self.rest_client(identity)?,
            )?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::RawIdentity;

    const OPAQUE: &str = "3f2b8c1a-9d4e-4f6b-8a2c-1e5d7f9b0c3a";

    fn test_router() -> StoreRouter {
        StoreRouter::from_config(&AppConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn admin_routes_to_the_relational_store() {
        let identity = CallerIdentity::normalize(RawIdentity::new("42"));
        assert_eq!(
            test_router().backend(&identity).unwrap(),
            StoreKind::Relational
        );
    }

    #[tokio::test]
    async fn user_with_credential_routes_to_the_rest_store() {
        let identity =
            CallerIdentity::normalize(RawIdentity::new(OPAQUE).with_credential("bearer"));
        assert_eq!(test_router().backend(&identity).unwrap(), StoreKind::Rest);
    }

    #[tokio::test]
    async fn admin_without_numeric_id_fails_at_the_factory() {
        let identity =
            CallerIdentity::normalize(RawIdentity::new(OPAQUE).with_role(Role::Admin));
        let error = test_router().backend(&identity).unwrap_err();
        assert!(error.is_fatal());
    }

    #[tokio::test]
    async fn user_without_credential_fails_at_the_factory() {
        let identity = CallerIdentity::normalize(RawIdentity::new(OPAQUE));
        let error = test_router().recurring(&identity).err().unwrap();
        assert!(error.is_fatal());
    }

    #[tokio::test]
    async fn typed_factories_build_for_both_roles() {
        let router = test_router();
        let admin = CallerIdentity::normalize(RawIdentity::new("42"));
        let user =
            CallerIdentity::normalize(RawIdentity::new(OPAQUE).with_credential("bearer"));

        assert!(router.recurring(&admin).is_ok());
        assert!(router.debts(&admin).is_ok());
        assert!(router.budget(&admin).is_ok());
        assert!(router.recurring(&user).is_ok());
        assert!(router.debts(&user).is_ok());
        assert!(router.budget(&user).is_ok());
    }
}
