//! Store error taxonomy shared by every adapter and domain contract
//!
//! Four kinds cover the whole routing layer:
//!
//! - `Routing`: programmer/configuration error caught at factory time
//!   (role/id mismatch, missing credential). Fatal; abort the request.
//! - `Unavailable`: the underlying store could not be reached. Wraps the
//!   driver error as `source` but never exposes the driver type itself.
//! - `NotFound`: the entity does not exist **or** belongs to another caller.
//!   The two are deliberately indistinguishable so that cross-caller
//!   existence never leaks.
//! - `Validation`: malformed input rejected at the adapter boundary before
//!   it reaches a store.

use thiserror::Error;

/// Error type for all store and routing operations
///
/// Adapters never let a raw driver error escape; every store call site
/// re-wraps into one of these variants.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Role/id mismatch or missing credential at factory time
    #[error("routing error: {message}")]
    Routing { message: String },

    /// The underlying store could not be reached
    #[error("{store} store unavailable: {message}")]
    Unavailable {
        store: &'static str,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Entity absent, or owned by another caller (indistinguishable by design)
    #[error("not found: {entity}")]
    NotFound { entity: String },

    /// Malformed input caught at the adapter boundary
    #[error("validation error: {message}")]
    Validation { message: String },
}

impl StoreError {
    /// Creates a Routing error
    pub fn routing(message: impl Into<String>) -> Self {
        StoreError::Routing {
            message: message.into(),
        }
    }

    /// Creates an Unavailable error with a plain message
    pub fn unavailable(store: &'static str, message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            store,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an Unavailable error wrapping the driver error as `source`
    pub fn unavailable_from(
        store: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::Unavailable {
            store,
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a NotFound error for the given entity description
    pub fn not_found(entity: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation {
            message: message.into(),
        }
    }

    /// Returns true if the entity was not found (or not owned by the caller)
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Returns true if this is a fatal programmer/config error
    ///
    /// Fatal errors should abort the request with a server fault rather
    /// than being reported as an ordinary domain failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Routing { .. })
    }

    /// Returns true if the underlying store was unreachable
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_predicate() {
        let error = StoreError::not_found("debt 42");
        assert!(error.is_not_found());
        assert!(!error.is_fatal());
        assert!(error.to_string().contains("debt 42"));
    }

    #[test]
    fn routing_is_fatal() {
        let error = StoreError::routing("user-role identity has no numeric id");
        assert!(error.is_fatal());
        assert!(!error.is_not_found());
    }

    #[test]
    fn unavailable_carries_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let error = StoreError::unavailable_from("mysql", io);
        assert!(error.is_unavailable());
        assert!(std::error::Error::source(&error).is_some());
        assert!(error.to_string().contains("mysql"));
    }

    #[test]
    fn validation_is_not_fatal() {
        let error = StoreError::validation("amount must be non-negative");
        assert!(!error.is_fatal());
        assert!(!error.is_unavailable());
    }
}
