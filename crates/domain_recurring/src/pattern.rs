//! Canonical recurring-pattern entities
//!
//! A pattern is derived, never entered by hand: the detector creates and
//! refreshes rows, user-facing toggles flip the settings, and nothing is
//! ever deleted, only deactivated.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use core_kernel::{round_minor, Frequency};

/// A recognized repeating transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringPattern {
    pub id: i64,
    /// Normalized description key (case-folded, trimmed)
    pub description: String,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub average_amount_minor: i64,
    pub frequency: Frequency,
    /// 0 to 100, capped at 95 by the detector
    pub confidence: u8,
    pub next_expected_date: NaiveDate,
    pub last_occurrence: NaiveDate,
    pub is_subscription: bool,
    pub is_active: bool,
    pub reminder_enabled: bool,
    pub auto_add: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User-facing toggles; only provided fields change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternSettings {
    pub reminder_enabled: Option<bool>,
    pub auto_add: Option<bool>,
    pub is_active: Option<bool>,
    pub notes: Option<String>,
}

impl PatternSettings {
    /// True when no field is provided; adapters reject such updates
    pub fn is_empty(&self) -> bool {
        self.reminder_enabled.is_none()
            && self.auto_add.is_none()
            && self.is_active.is_none()
            && self.notes.is_none()
    }
}

/// Result of one detector run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionOutcome {
    /// Patterns created (not updated) in this run
    pub patterns_found: usize,
}

/// Projected recurring spend, all amounts in minor units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendProjection {
    pub monthly_total_minor: i64,
    pub quarterly_total_minor: i64,
    pub yearly_total_minor: i64,
    pub by_category: BTreeMap<String, i64>,
}

impl SpendProjection {
    /// Projects spend from a set of active patterns
    ///
    /// Each pattern is scaled to its monthly equivalent; quarterly and
    /// yearly totals are straight multiples. Patterns without a category
    /// fall into "Other".
    pub fn from_patterns(patterns: &[RecurringPattern]) -> Self {
        let mut monthly_total = rust_decimal::Decimal::ZERO;
        let mut by_category: BTreeMap<String, rust_decimal::Decimal> = BTreeMap::new();

        for pattern in patterns {
            let monthly = pattern
                .frequency
                .monthly_equivalent(pattern.average_amount_minor);
            monthly_total += monthly;

            let category = pattern
                .category_name
                .clone()
                .unwrap_or_else(|| "Other".to_string());
            *by_category.entry(category).or_default() += monthly;
        }

        Self {
            monthly_total_minor: round_minor(monthly_total),
            quarterly_total_minor: round_minor(monthly_total * rust_decimal::Decimal::from(3)),
            yearly_total_minor: round_minor(monthly_total * rust_decimal::Decimal::from(12)),
            by_category: by_category
                .into_iter()
                .map(|(category, amount)| (category, round_minor(amount)))
                .collect(),
        }
    }
}

/// One entry in the upcoming-charges view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingCharge {
    pub id: i64,
    pub description: String,
    pub amount_minor: i64,
    pub due_date: NaiveDate,
    pub days_until_due: i64,
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(
        amount_minor: i64,
        frequency: Frequency,
        category: Option<&str>,
    ) -> RecurringPattern {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        RecurringPattern {
            id: 1,
            description: "x".to_string(),
            category_id: None,
            category_name: category.map(str::to_string),
            average_amount_minor: amount_minor,
            frequency,
            confidence: 90,
            next_expected_date: today,
            last_occurrence: today,
            is_subscription: false,
            is_active: true,
            reminder_enabled: true,
            auto_add: false,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn projection_scales_to_monthly_equivalents() {
        let patterns = vec![
            pattern(1_000, Frequency::Monthly, Some("Streaming")),
            pattern(12_000, Frequency::Yearly, Some("Insurance")),
        ];
        let projection = SpendProjection::from_patterns(&patterns);
        assert_eq!(projection.monthly_total_minor, 2_000);
        assert_eq!(projection.quarterly_total_minor, 6_000);
        assert_eq!(projection.yearly_total_minor, 24_000);
        assert_eq!(projection.by_category["Streaming"], 1_000);
        assert_eq!(projection.by_category["Insurance"], 1_000);
    }

    #[test]
    fn uncategorized_patterns_fall_into_other() {
        let projection = SpendProjection::from_patterns(&[pattern(500, Frequency::Monthly, None)]);
        assert_eq!(projection.by_category["Other"], 500);
    }

    #[test]
    fn weekly_projection_rounds_the_fractional_factor() {
        let projection =
            SpendProjection::from_patterns(&[pattern(1_000, Frequency::Weekly, None)]);
        // 1000 * 4.33 = 4330
        assert_eq!(projection.monthly_total_minor, 4_330);
    }

    #[test]
    fn empty_settings_detection() {
        assert!(PatternSettings::default().is_empty());
        let settings = PatternSettings {
            auto_add: Some(true),
            ..Default::default()
        };
        assert!(!settings.is_empty());
    }
}
