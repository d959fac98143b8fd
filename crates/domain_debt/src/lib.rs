//! Debt Domain
//!
//! Debts, payments and the payoff lifecycle in canonical shape, plus the
//! `DebtStore` contract both store adapters implement.

pub mod debt;
pub mod store;

pub use debt::{
    validate_request, Debt, DebtPayment, DebtStatus, DebtUpdate, NewDebt, NewDebtPayment,
    ParseDebtStatusError,
};
pub use store::DebtStore;

#[cfg(any(test, feature = "mock"))]
pub use store::mock::MockDebtStore;
