//! Budget Domain
//!
//! Categories and transactions in canonical shape, plus the `BudgetStore`
//! contract both store adapters implement. The transaction history kept
//! here is what the recurring-transaction detector reads.

pub mod model;
pub mod store;

pub use model::{
    validate_request, BudgetTransaction, Category, NewCategory, NewTransaction, TransactionQuery,
};
pub use store::BudgetStore;

#[cfg(any(test, feature = "mock"))]
pub use store::mock::MockBudgetStore;
