//! Canonical budget entities
//!
//! Categories and transactions in their backend-independent shape: integer
//! minor-unit amounts, absolute instants, integer entity ids. The stores'
//! physical representations (decimal major units, snake-case wire fields)
//! never appear above the adapter boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::StoreError;

/// A spending category owned by one caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Free-form kind such as "expense" or "income"
    pub category_type: Option<String>,
    /// Budget ceiling in minor units, when one is set
    pub monthly_limit_minor: Option<i64>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to create a category
#[derive(Debug, Clone, Validate)]
pub struct NewCategory {
    #[validate(length(min = 1, message = "category name must not be empty"))]
    pub name: String,
    pub category_type: Option<String>,
    #[validate(range(min = 0, message = "monthly limit must be non-negative"))]
    pub monthly_limit_minor: Option<i64>,
    pub color: Option<String>,
}

impl NewCategory {
    /// Creates a request with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category_type: None,
            monthly_limit_minor: None,
            color: None,
        }
    }
}

/// A single budget transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetTransaction {
    pub id: i64,
    pub category_id: Option<i64>,
    /// Amount in minor units; spending is positive
    pub amount_minor: i64,
    pub description: Option<String>,
    pub transaction_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Request to record a transaction
#[derive(Debug, Clone, Validate)]
pub struct NewTransaction {
    pub category_id: Option<i64>,
    #[validate(range(min = 1, message = "amount must be positive"))]
    pub amount_minor: i64,
    pub description: Option<String>,
    /// Defaults to now when absent
    pub transaction_date: Option<DateTime<Utc>>,
}

/// Filters for listing transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    pub category_id: Option<i64>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TransactionQuery {
    /// Transactions within a date window
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }
}

/// Runs derive-based validation and reports failures in the store taxonomy
pub fn validate_request(request: &impl Validate) -> Result<(), StoreError> {
    request
        .validate()
        .map_err(|e| StoreError::validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_category_name_is_rejected() {
        let request = NewCategory::named("");
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn negative_monthly_limit_is_rejected() {
        let mut request = NewCategory::named("Groceries");
        request.monthly_limit_minor = Some(-1);
        assert!(validate_request(&request).is_err());
        request.monthly_limit_minor = Some(50_000);
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn zero_amount_transaction_is_rejected() {
        let request = NewTransaction {
            category_id: None,
            amount_minor: 0,
            description: None,
            transaction_date: None,
        };
        let error = validate_request(&request).unwrap_err();
        assert!(!error.is_fatal());
    }
}
