//! Recurring-Transaction Domain
//!
//! The statistical detector, canonical pattern entities and the
//! `RecurringStore` contract both store adapters implement. Everything
//! here is backend-independent; persistence lives in the store crates.

pub mod detector;
pub mod pattern;
pub mod store;

pub use detector::{
    analyze, DetectedPattern, TransactionObservation, MAX_AMOUNT_CV, MIN_HISTORY,
    SUBSCRIPTION_KEYWORDS,
};
pub use pattern::{
    DetectionOutcome, PatternSettings, RecurringPattern, SpendProjection, UpcomingCharge,
};
pub use store::{RecurringStore, DEFAULT_UPCOMING_HORIZON_DAYS};

#[cfg(any(test, feature = "mock"))]
pub use store::mock::MockRecurringStore;
