//! Builder patterns for test data construction

use chrono::{Days, NaiveDate};

use domain_debt::NewDebt;
use domain_recurring::TransactionObservation;

/// Builds a run of evenly spaced transaction observations
///
/// Spacing and the optional alternating day jitter are deterministic so
/// detector tests stay reproducible.
#[derive(Debug, Clone)]
pub struct HistoryBuilder {
    description: String,
    amount_minor: i64,
    start: NaiveDate,
    spacing_days: u64,
    jitter_days: u64,
    count: usize,
    category_id: Option<i64>,
}

impl HistoryBuilder {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            amount_minor: 999,
            start: NaiveDate::from_ymd_opt(2024, 1, 5).expect("valid date"),
            spacing_days: 30,
            jitter_days: 0,
            count: 3,
            category_id: None,
        }
    }

    pub fn amount_minor(mut self, amount: i64) -> Self {
        self.amount_minor = amount;
        self
    }

    pub fn starting(mut self, start: NaiveDate) -> Self {
        self.start = start;
        self
    }

    pub fn every_days(mut self, days: u64) -> Self {
        self.spacing_days = days;
        self
    }

    /// Alternating day offset applied to every other occurrence
    pub fn jitter_days(mut self, days: u64) -> Self {
        self.jitter_days = days;
        self
    }

    pub fn occurrences(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn build(self) -> Vec<TransactionObservation> {
        (0..self.count)
            .map(|i| {
                let mut date = self.start + Days::new(self.spacing_days * i as u64);
                if i % 2 == 1 {
                    date = date + Days::new(self.jitter_days);
                }
                TransactionObservation {
                    amount_minor: self.amount_minor,
                    date,
                    description: self.description.clone(),
                    category_id: self.category_id,
                }
            })
            .collect()
    }
}

/// Builds a valid debt-creation request with overridable fields
#[derive(Debug, Clone)]
pub struct DebtBuilder {
    request: NewDebt,
}

impl DebtBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            request: NewDebt {
                name: name.into(),
                debt_type: "credit_card".to_string(),
                original_amount_minor: 250_000,
                current_balance_minor: 180_000,
                interest_rate_bp: 1899,
                minimum_payment_minor: 3_500,
                due_date: None,
                due_day: Some(15),
                creditor: None,
                account_number: None,
                notes: None,
            },
        }
    }

    pub fn balance_minor(mut self, balance: i64) -> Self {
        self.request.current_balance_minor = balance;
        self
    }

    pub fn original_amount_minor(mut self, amount: i64) -> Self {
        self.request.original_amount_minor = amount;
        self
    }

    pub fn interest_rate_bp(mut self, rate: i64) -> Self {
        self.request.interest_rate_bp = rate;
        self
    }

    pub fn debt_type(mut self, debt_type: impl Into<String>) -> Self {
        self.request.debt_type = debt_type.into();
        self
    }

    pub fn creditor(mut self, creditor: impl Into<String>) -> Self {
        self.request.creditor = Some(creditor.into());
        self
    }

    pub fn build(self) -> NewDebt {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_recurring::analyze;

    #[test]
    fn history_builder_produces_detectable_patterns() {
        let history = HistoryBuilder::new("Netflix")
            .amount_minor(999)
            .every_days(30)
            .occurrences(4)
            .build();
        assert_eq!(history.len(), 4);

        let patterns = analyze(&history);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].description, "netflix");
    }

    #[test]
    fn jitter_alternates() {
        let history = HistoryBuilder::new("Gym")
            .every_days(30)
            .jitter_days(2)
            .occurrences(3)
            .build();
        assert_eq!((history[1].date - history[0].date).num_days(), 32);
        assert_eq!((history[2].date - history[1].date).num_days(), 28);
    }

    #[test]
    fn debt_builder_defaults_are_valid() {
        let request = DebtBuilder::new("Visa").build();
        assert!(domain_debt::validate_request(&request).is_ok());
    }
}
