//! Test Utilities Crate
//!
//! Shared test infrastructure for the routing-layer test suite.
//!
//! # Modules
//!
//! - `fixtures`: Deterministic caller identities and credential minting
//! - `builders`: Builder patterns for transaction history and debts
//! - `generators`: Property-based test data generators
//! - `db`: MySQL container management for live Store-A tests

pub mod builders;
pub mod db;
pub mod fixtures;
pub mod generators;

pub use builders::*;
pub use fixtures::*;
pub use generators::*;
