//! Deterministic caller identities and credential minting

use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;

use core_kernel::{CallerIdentity, Credential, RawIdentity};

/// Numeric id of the fixture admin caller
pub const ADMIN_ID: i64 = 42;

/// Opaque id of the fixture user caller
pub const USER_ID: &str = "3f2b8c1a-9d4e-4f6b-8a2c-1e5d7f9b0c3a";

/// Signing secret for minted test credentials
pub const TEST_JWT_SECRET: &[u8] = b"test-signing-secret";

#[derive(Debug, Serialize)]
struct CredentialClaims<'a> {
    sub: &'a str,
    role: &'static str,
    exp: u64,
}

/// Mints an HS256 bearer shaped like the tokens the REST store expects
///
/// The subject is the caller's canonical id, which is what the store's
/// row-level-security policies key on.
pub fn mint_user_credential(canonical_id: &str) -> Credential {
    let claims = CredentialClaims {
        sub: canonical_id,
        role: "authenticated",
        exp: 4_102_444_800, // far future; fixtures never expire mid-test
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET),
    )
    .expect("fixture credential minting");
    Credential::new(token)
}

/// The fixture admin identity (relational-store caller)
pub fn admin_identity() -> CallerIdentity {
    CallerIdentity::normalize(RawIdentity::new(ADMIN_ID.to_string()))
}

/// The fixture user identity with a minted credential (REST-store caller)
pub fn user_identity() -> CallerIdentity {
    CallerIdentity::normalize(
        RawIdentity::new(USER_ID).with_credential(mint_user_credential(USER_ID)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Role;

    #[test]
    fn admin_fixture_is_relational_shaped() {
        let identity = admin_identity();
        assert_eq!(identity.role, Role::Admin);
        assert_eq!(identity.require_numeric().unwrap(), ADMIN_ID);
    }

    #[test]
    fn user_fixture_carries_a_jwt() {
        let identity = user_identity();
        assert_eq!(identity.role, Role::User);
        let credential = identity.require_credential().unwrap();
        // HS256 JWTs are three dot-separated segments
        assert_eq!(credential.expose().split('.').count(), 3);
    }
}
