//! Canonical debt entities
//!
//! Amounts are integer minor units and interest rates are integer
//! hundredths of a percent; the REST store's decimal major-unit wire form
//! is an adapter concern. The canonical field is `name`; the physical
//! `debt_name` column on the Store B wire is part of the fixed per-entity
//! mapping table, not a generic case transform.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

use core_kernel::StoreError;

/// Lifecycle of a debt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    Active,
    PaidOff,
    Closed,
}

/// Error for an unrecognized status wire value
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown debt status: {0}")]
pub struct ParseDebtStatusError(String);

impl DebtStatus {
    /// The lowercase wire form
    pub fn as_str(self) -> &'static str {
        match self {
            DebtStatus::Active => "active",
            DebtStatus::PaidOff => "paid_off",
            DebtStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DebtStatus {
    type Err = ParseDebtStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(DebtStatus::Active),
            "paid_off" => Ok(DebtStatus::PaidOff),
            "closed" => Ok(DebtStatus::Closed),
            other => Err(ParseDebtStatusError(other.to_string())),
        }
    }
}

/// A debt owned by one caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub id: i64,
    pub name: String,
    /// Free-form kind such as "credit_card" or "student_loan"
    pub debt_type: String,
    pub original_amount_minor: i64,
    pub current_balance_minor: i64,
    /// Annual interest rate in hundredths of a percent (1899 = 18.99%)
    pub interest_rate_bp: i64,
    pub minimum_payment_minor: i64,
    pub due_date: Option<NaiveDate>,
    /// Day of month the payment is due, when the debt bills monthly
    pub due_day: Option<u32>,
    pub status: DebtStatus,
    pub creditor: Option<String>,
    pub account_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a debt
#[derive(Debug, Clone, Validate)]
pub struct NewDebt {
    #[validate(length(min = 1, message = "debt name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "debt type must not be empty"))]
    pub debt_type: String,
    #[validate(range(min = 0, message = "original amount must be non-negative"))]
    pub original_amount_minor: i64,
    #[validate(range(min = 0, message = "current balance must be non-negative"))]
    pub current_balance_minor: i64,
    #[validate(range(min = 0, message = "interest rate must be non-negative"))]
    pub interest_rate_bp: i64,
    #[validate(range(min = 0, message = "minimum payment must be non-negative"))]
    pub minimum_payment_minor: i64,
    pub due_date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 31, message = "due day must be a day of month"))]
    pub due_day: Option<u32>,
    pub creditor: Option<String>,
    pub account_number: Option<String>,
    pub notes: Option<String>,
}

/// Partial update; only provided fields change
#[derive(Debug, Clone, Default)]
pub struct DebtUpdate {
    pub name: Option<String>,
    pub current_balance_minor: Option<i64>,
    pub interest_rate_bp: Option<i64>,
    pub minimum_payment_minor: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub due_day: Option<u32>,
    pub creditor: Option<String>,
    pub notes: Option<String>,
}

impl DebtUpdate {
    /// True when no field is provided; adapters reject such updates
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.current_balance_minor.is_none()
            && self.interest_rate_bp.is_none()
            && self.minimum_payment_minor.is_none()
            && self.due_date.is_none()
            && self.due_day.is_none()
            && self.creditor.is_none()
            && self.notes.is_none()
    }
}

/// A recorded payment toward a debt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtPayment {
    pub id: i64,
    pub debt_id: i64,
    pub amount_minor: i64,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to record a payment
#[derive(Debug, Clone, Validate)]
pub struct NewDebtPayment {
    pub debt_id: i64,
    #[validate(range(min = 1, message = "payment amount must be positive"))]
    pub amount_minor: i64,
    pub payment_date: NaiveDate,
    pub note: Option<String>,
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

    fn new_debt() -> NewDebt {
        NewDebt {
            name: "Visa".to_string(),
            debt_type: "credit_card".to_string(),
            original_amount_minor: 250_000,
            current_balance_minor: 180_000,
            interest_rate_bp: 1899,
            minimum_payment_minor: 3_500,
            due_date: None,
            due_day: Some(15),
            creditor: Some("First Bank".to_string()),
            account_number: None,
            notes: None,
        }
    }

    #[test]
    fn valid_debt_passes() {
        assert!(validate_request(&new_debt()).is_ok());
    }

    #[test]
    fn empty_name_fails() {
        let mut debt = new_debt();
        debt.name = String::new();
        assert!(validate_request(&debt).is_err());
    }

    #[test]
    fn negative_balance_fails() {
        let mut debt = new_debt();
        debt.current_balance_minor = -1;
        assert!(validate_request(&debt).is_err());
    }

    #[test]
    fn due_day_out_of_range_fails() {
        let mut debt = new_debt();
        debt.due_day = Some(32);
        assert!(validate_request(&debt).is_err());
    }

    #[test]
    fn status_wire_round_trip() {
        for status in [DebtStatus::Active, DebtStatus::PaidOff, DebtStatus::Closed] {
            assert_eq!(status.as_str().parse::<DebtStatus>().unwrap(), status);
        }
        assert!("overdue".parse::<DebtStatus>().is_err());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(DebtUpdate::default().is_empty());
        let update = DebtUpdate {
            current_balance_minor: Some(100_000),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
