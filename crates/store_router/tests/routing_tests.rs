//! Routing determinism and fail-fast properties
//!
//! The router is built over a lazy pool, so none of these tests need a
//! running database; the decision under test is pure.

use proptest::prelude::*;

use core_kernel::{normalize, Role};
use store_router::{AppConfig, StoreKind, StoreRouter};
use test_utils::generators::any_raw_identity_strategy;
use test_utils::{admin_identity, user_identity};

fn test_router() -> StoreRouter {
    // sqlx's lazy pool spawns its maintenance tasks at construction time,
    // so even the network-free router needs a Tokio context to exist.
    static RT: std::sync::OnceLock<tokio::runtime::Runtime> = std::sync::OnceLock::new();
    let _guard = RT
        .get_or_init(|| tokio::runtime::Runtime::new().expect("tokio runtime"))
        .enter();
    StoreRouter::from_config(&AppConfig::default()).expect("lazy router")
}

proptest! {
    /// Admin identities land on Store A, user identities on Store B, and
    /// every malformed identity dies at the factory; no input ever
    /// crosses stores.
    #[test]
    fn role_alone_picks_the_store(raw in any_raw_identity_strategy()) {
        let router = test_router();
        let identity = normalize(raw);

        match router.backend(&identity) {
            Ok(StoreKind::Relational) => {
                prop_assert_eq!(identity.role, Role::Admin);
                prop_assert!(identity.numeric_id.is_some());
            }
            Ok(StoreKind::Rest) => {
                prop_assert_eq!(identity.role, Role::User);
                prop_assert!(identity.credential.is_some());
            }
            Err(error) => prop_assert!(error.is_fatal()),
        }
    }

    /// The decision is a pure function of the identity
    #[test]
    fn routing_is_deterministic(raw in any_raw_identity_strategy()) {
        let router = test_router();
        let identity = normalize(raw);

        let first = router.backend(&identity).map_err(|e| e.to_string());
        let second = router.backend(&identity).map_err(|e| e.to_string());
        prop_assert_eq!(first, second);
    }
}

#[test]
fn fixture_identities_route_as_documented() {
    let router = test_router();
    assert_eq!(
        router.backend(&admin_identity()).unwrap(),
        StoreKind::Relational
    );
    assert_eq!(router.backend(&user_identity()).unwrap(), StoreKind::Rest);
}

#[test]
fn every_domain_factory_shares_the_one_decision() {
    let router = test_router();
    let admin = admin_identity();
    let user = user_identity();

    assert!(router.recurring(&admin).is_ok());
    assert!(router.debts(&admin).is_ok());
    assert!(router.budget(&admin).is_ok());
    assert!(router.recurring(&user).is_ok());
    assert!(router.debts(&user).is_ok());
    assert!(router.budget(&user).is_ok());
}
