//! Property-Based Test Generators
//!
//! Proptest strategies for identities, amounts and frequencies. The
//! identity strategies deliberately include degenerate shapes (users
//! without credentials, admin overrides on opaque ids) so routing tests
//! exercise the fail-fast paths.

use proptest::prelude::*;

use core_kernel::{Frequency, RawIdentity, Role};

/// Strategy for opaque hyphenated-hex id strings
pub fn opaque_id_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex(
        "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
    )
    .expect("valid opaque id regex")
}

/// Strategy for admin-population raw identities (integer ids)
pub fn admin_raw_identity_strategy() -> impl Strategy<Value = RawIdentity> {
    (1i64..1_000_000i64).prop_map(|id| RawIdentity::new(id.to_string()))
}

/// Strategy for user-population raw identities carrying a credential
pub fn user_raw_identity_strategy() -> impl Strategy<Value = RawIdentity> {
    opaque_id_strategy()
        .prop_map(|id| RawIdentity::new(id.clone()).with_credential(format!("bearer-{id}")))
}

/// Strategy for user-population raw identities missing their credential
pub fn credentialless_user_strategy() -> impl Strategy<Value = RawIdentity> {
    opaque_id_strategy().prop_map(RawIdentity::new)
}

/// Strategy mixing well-formed and degenerate identities
pub fn any_raw_identity_strategy() -> impl Strategy<Value = RawIdentity> {
    prop_oneof![
        4 => admin_raw_identity_strategy(),
        4 => user_raw_identity_strategy(),
        1 => credentialless_user_strategy(),
        1 => opaque_id_strategy()
            .prop_map(|id| RawIdentity::new(id).with_role(Role::Admin)),
    ]
}

/// Strategy for positive minor-unit amounts
pub fn amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..10_000_000i64
}

/// Strategy for recurrence frequencies
pub fn frequency_strategy() -> impl Strategy<Value = Frequency> {
    prop_oneof![
        Just(Frequency::Weekly),
        Just(Frequency::Biweekly),
        Just(Frequency::Monthly),
        Just(Frequency::Quarterly),
        Just(Frequency::Yearly),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::is_opaque_id;

    proptest! {
        #[test]
        fn generated_opaque_ids_match_the_shape(id in opaque_id_strategy()) {
            prop_assert!(is_opaque_id(&id));
        }

        #[test]
        fn generated_admin_ids_parse_numeric(raw in admin_raw_identity_strategy()) {
            let identity = core_kernel::normalize(raw);
            prop_assert_eq!(identity.role, Role::Admin);
            prop_assert!(identity.numeric_id.is_some());
        }
    }
}
