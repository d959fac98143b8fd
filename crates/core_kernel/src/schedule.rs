//! Recurrence frequency model
//!
//! Classification thresholds, calendar-aware period advancement and the
//! monthly-equivalent projection factors used by the recurring-transaction
//! detector and its spend projections.

use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How often a recurring pattern repeats
///
/// The wire form on both stores is the lowercase word (`"weekly"`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

/// Error for an unrecognized frequency wire value
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown frequency: {0}")]
pub struct ParseFrequencyError(String);

impl Frequency {
    /// Classifies a mean occurrence interval (in days) into a frequency
    ///
    /// Fixed thresholds: `<10` weekly, `<20` biweekly, `<40` monthly,
    /// `<120` quarterly, else yearly.
    pub fn classify(avg_interval_days: f64) -> Self {
        if avg_interval_days < 10.0 {
            Frequency::Weekly
        } else if avg_interval_days < 20.0 {
            Frequency::Biweekly
        } else if avg_interval_days < 40.0 {
            Frequency::Monthly
        } else if avg_interval_days < 120.0 {
            Frequency::Quarterly
        } else {
            Frequency::Yearly
        }
    }

    /// Advances a date by one period of this frequency
    ///
    /// Weekly and biweekly add whole days; monthly, quarterly and yearly
    /// use calendar arithmetic that clamps at month ends (Jan 31 + 1 month
    /// is Feb 28/29).
    pub fn advance(self, date: NaiveDate) -> NaiveDate {
        let advanced = match self {
            Frequency::Weekly => date.checked_add_days(Days::new(7)),
            Frequency::Biweekly => date.checked_add_days(Days::new(14)),
            Frequency::Monthly => date.checked_add_months(Months::new(1)),
            Frequency::Quarterly => date.checked_add_months(Months::new(3)),
            Frequency::Yearly => date.checked_add_months(Months::new(12)),
        };
        // Only fails at the edge of chrono's representable range
        advanced.unwrap_or(date)
    }

    /// Scales a per-occurrence amount to its monthly equivalent
    ///
    /// Factors: 4.33 average weeks per month, 2.17 average biweeks per
    /// month, 1 for monthly, then 1/3 and 1/12.
    pub fn monthly_equivalent(self, amount_minor: i64) -> Decimal {
        let amount = Decimal::from(amount_minor);
        match self {
            Frequency::Weekly => amount * dec!(4.33),
            Frequency::Biweekly => amount * dec!(2.17),
            Frequency::Monthly => amount,
            Frequency::Quarterly => amount / dec!(3),
            Frequency::Yearly => amount / dec!(12),
        }
    }

    /// The lowercase wire form
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Frequency::Weekly),
            "biweekly" => Ok(Frequency::Biweekly),
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(ParseFrequencyError(other.to_string())),
        }
    }
}
