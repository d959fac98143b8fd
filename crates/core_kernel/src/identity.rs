//! Caller identity normalization
//!
//! The upstream authentication collaborator hands over a raw, already
//! verified identity: an id that is either an integer (administrative
//! population, Store A) or an opaque hyphenated-hex string (general user
//! population, Store B), plus a role claim and an optional bearer
//! credential. This module turns that into the canonical `CallerIdentity`
//! every other component works with.
//!
//! Normalization never fails. A caller whose id cannot be parsed as an
//! integer simply gets `numeric_id = None`; the failure is deferred to the
//! point where a Store-A adapter is actually requested, so user-role
//! callers who never need a numeric id incur no cost.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;

/// Role discriminant of the caller identity union
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Administrative population, integer keys, Store A
    Admin,
    /// General user population, opaque string keys, Store B
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

/// Opaque bearer credential used to authenticate row-level-secured queries
///
/// `Debug` redacts the secret so credentials never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a bearer token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Exposes the secret for attaching to a store request
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(****)")
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

/// What the authentication collaborator hands over
///
/// The routing layer trusts the role claim completely; it performs no
/// independent authorization.
#[derive(Debug, Clone)]
pub struct RawIdentity {
    /// Raw caller id: integer text or opaque hyphenated-hex string
    pub id: String,
    /// Explicit role claim; when absent the role is inferred from the id shape
    pub role_override: Option<Role>,
    /// Bearer credential for row-level-secured queries (Store B callers)
    pub credential: Option<Credential>,
}

impl RawIdentity {
    /// Creates a raw identity with no explicit role claim or credential
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role_override: None,
            credential: None,
        }
    }

    /// Sets an explicit role claim
    pub fn with_role(mut self, role: Role) -> Self {
        self.role_override = Some(role);
        self
    }

    /// Attaches the caller's bearer credential
    pub fn with_credential(mut self, credential: impl Into<Credential>) -> Self {
        self.credential = Some(credential.into());
        self
    }
}

/// Canonical caller identity used by every other component
///
/// Invariants: an `Admin` caller routed anywhere that needs a numeric key
/// must have `numeric_id: Some`; a `User` caller owns a stable opaque
/// `canonical_id`. Asking a `User` identity for its numeric id fails fast
/// rather than coercing to a sentinel.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    /// The id exactly as received
    pub raw_id: String,
    /// Stable string form of the id; authoritative key for Store B
    pub canonical_id: String,
    /// Integer form of the id where one exists; authoritative key for Store A
    pub numeric_id: Option<i64>,
    /// Trusted role claim
    pub role: Role,
    /// Bearer credential for Store B callers
    pub credential: Option<Credential>,
}

impl CallerIdentity {
    /// Normalizes a raw identity into the canonical form
    ///
    /// An id matching the opaque-string shape infers role `User` unless an
    /// explicit override is present; any other id infers `Admin`. This
    /// function never errors, even when no numeric id can be produced.
    pub fn normalize(raw: RawIdentity) -> Self {
        let role = raw.role_override.unwrap_or(if is_opaque_id(&raw.id) {
            Role::User
        } else {
            Role::Admin
        });
        let numeric_id = raw.id.trim().parse::<i64>().ok();

        Self {
            canonical_id: raw.id.clone(),
            raw_id: raw.id,
            numeric_id,
            role,
            credential: raw.credential,
        }
    }

    /// Fail-fast accessor for the Store-A key
    ///
    /// Returns `StoreError::Routing` when this identity carries no numeric
    /// id. There is no sentinel fallback, ever.
    pub fn require_numeric(&self) -> Result<i64, StoreError> {
        self.numeric_id.ok_or_else(|| {
            StoreError::routing(format!(
                "identity '{}' ({} role) has no numeric id; this operation requires a relational-store caller",
                self.canonical_id, self.role
            ))
        })
    }

    /// Fail-fast accessor for the Store-B bearer credential
    pub fn require_credential(&self) -> Result<&Credential, StoreError> {
        self.credential.as_ref().ok_or_else(|| {
            StoreError::routing(format!(
                "identity '{}' ({} role) carries no credential; this operation requires a row-level-secured caller",
                self.canonical_id, self.role
            ))
        })
    }
}

/// Normalizes a raw identity; free-function form of [`CallerIdentity::normalize`]
pub fn normalize(raw: RawIdentity) -> CallerIdentity {
    CallerIdentity::normalize(raw)
}

/// Tests whether an id matches the opaque-string shape
///
/// The shape is fixed: 36 characters, hyphens at positions 8, 13, 18 and
/// 23, hexadecimal digits everywhere else. This is a shape test, not a
/// semantic validation; it exists only to infer the caller population.
pub fn is_opaque_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        8 | 13 | 18 | 23 => *b == b'-',
        _ => b.is_ascii_hexdigit(),
    })
}
