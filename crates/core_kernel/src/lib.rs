//! Core Kernel - Canonical types for the role-based persistence routing layer
//!
//! This crate provides the backend-independent building blocks shared by
//! every domain and both store adapters:
//! - Caller identity normalization (integer admin keys vs opaque user keys)
//! - Currency marshaling between minor units and decimal major units
//! - The recurrence frequency model
//! - The store error taxonomy

pub mod error;
pub mod identity;
pub mod money;
pub mod schedule;

pub use error::StoreError;
pub use identity::{is_opaque_id, normalize, CallerIdentity, Credential, RawIdentity, Role};
pub use money::{round_minor, to_major_units, to_minor_units, MoneyError};
pub use schedule::{Frequency, ParseFrequencyError};
