//! Store B: PostgREST adapters
//!
//! The REST side of the routing layer. Every adapter is built from a
//! per-caller [`PostgrestClient`] carrying that caller's own bearer, so
//! the store's row-level security is the enforcement boundary; the
//! explicit `user_id=eq.<uuid>` filters on top of it fail closed if a
//! policy is missing.

pub mod budget;
pub mod client;
pub mod debt;
pub mod recurring;

pub use budget::PostgrestBudgetStore;
pub use client::{PostgrestClient, PostgrestConfig, STORE_NAME};
pub use debt::PostgrestDebtStore;
pub use recurring::PostgrestRecurringStore;
