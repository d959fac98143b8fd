//! Store Router
//!
//! The role-based adapter factory. Upstream code normalizes a caller
//! identity once, asks the router for domain stores, and works against
//! the domain traits; which of the two backends answers is decided here
//! and nowhere else.

pub mod config;
pub mod router;

pub use config::{AppConfig, StoreAConfig, StoreBConfig};
pub use router::{StoreKind, StoreRouter};
