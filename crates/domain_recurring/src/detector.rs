//! Statistical recurring-transaction detector
//!
//! Pure analysis over a slice of observations; store adapters feed it
//! history and persist the output. Grouping keys are case-folded trimmed
//! descriptions, and groups are visited in sorted-key order so repeated
//! runs over the same history produce identical results.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use core_kernel::Frequency;

/// Minimum total observations before any detection is attempted
pub const MIN_HISTORY: usize = 3;

/// Amount coefficient-of-variation ceiling; noisier groups are rejected
pub const MAX_AMOUNT_CV: f64 = 0.25;

/// Description fragments that mark a pattern as a subscription
pub const SUBSCRIPTION_KEYWORDS: &[&str] = &[
    "netflix",
    "spotify",
    "hulu",
    "prime",
    "subscription",
    "membership",
    "monthly fee",
    "annual fee",
];

/// One historical transaction as the detector sees it
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionObservation {
    pub amount_minor: i64,
    pub date: NaiveDate,
    pub description: String,
    pub category_id: Option<i64>,
}

/// A group the detector judged to be recurring
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedPattern {
    /// Normalized description key
    pub description: String,
    pub category_id: Option<i64>,
    pub average_amount_minor: i64,
    pub frequency: Frequency,
    pub confidence: u8,
    pub next_expected_date: NaiveDate,
    pub last_occurrence: NaiveDate,
    pub is_subscription: bool,
}

/// Analyzes transaction history and returns detected patterns
///
/// Fewer than [`MIN_HISTORY`] observations total means no analysis at
/// all. Within a group, at least two occurrences are required, amounts
/// must be stable (cv below [`MAX_AMOUNT_CV`]) and the average gap
/// between occurrences picks the frequency. Confidence is derived from
/// amount stability and capped at 95.
pub fn analyze(observations: &[TransactionObservation]) -> Vec<DetectedPattern> {
    if observations.len() < MIN_HISTORY {
        return Vec::new();
    }

    let mut groups: BTreeMap<String, Vec<&TransactionObservation>> = BTreeMap::new();
    for observation in observations {
        let key = observation.description.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        groups.entry(key).or_default().push(observation);
    }

    let mut patterns = Vec::new();
    for (key, mut group) in groups {
        if group.len() < 2 {
            continue;
        }
        group.sort_by_key(|o| o.date);

        let amounts: Vec<f64> = group.iter().map(|o| o.amount_minor as f64).collect();
        let mean = amounts.iter().sum::<f64>() / amounts.len() as f64;
        if mean <= 0.0 {
            continue;
        }
        let variance = amounts
            .iter()
            .map(|amount| (amount - mean).powi(2))
            .sum::<f64>()
            / amounts.len() as f64;
        let cv = variance.sqrt() / mean;
        if cv >= MAX_AMOUNT_CV {
            continue;
        }

        let intervals: Vec<f64> = group
            .windows(2)
            .map(|pair| (pair[1].date - pair[0].date).num_days() as f64)
            .collect();
        let average_interval = intervals.iter().sum::<f64>() / intervals.len() as f64;
        let frequency = Frequency::classify(average_interval);

        let last = group[group.len() - 1];
        let confidence = ((1.0 - cv) * 100.0).round().min(95.0) as u8;
        let is_subscription = SUBSCRIPTION_KEYWORDS
            .iter()
            .any(|keyword| key.contains(keyword));

        patterns.push(DetectedPattern {
            description: key,
            category_id: last.category_id,
            average_amount_minor: mean.round() as i64,
            frequency,
            confidence,
            next_expected_date: frequency.advance(last.date),
            last_occurrence: last.date,
            is_subscription,
        });
    }
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(amount_minor: i64, date: &str, description: &str) -> TransactionObservation {
        TransactionObservation {
            amount_minor,
            date: date.parse().unwrap(),
            description: description.to_string(),
            category_id: None,
        }
    }

    #[test]
    fn too_little_history_yields_nothing() {
        let history = vec![
            observation(1_000, "2024-01-01", "Gym"),
            observation(1_000, "2024-02-01", "Gym"),
        ];
        assert!(analyze(&history).is_empty());
    }

    #[test]
    fn monthly_pattern_with_stable_amounts() {
        let history = vec![
            observation(999, "2024-01-05", "Netflix"),
            observation(999, "2024-02-04", "Netflix"),
            observation(1_000, "2024-03-05", "netflix "),
        ];
        let patterns = analyze(&history);
        assert_eq!(patterns.len(), 1);
        let pattern = &patterns[0];
        assert_eq!(pattern.description, "netflix");
        assert_eq!(pattern.frequency, Frequency::Monthly);
        assert!(pattern.confidence >= 90);
        assert!(pattern.is_subscription);
        assert_eq!(pattern.last_occurrence.to_string(), "2024-03-05");
        assert_eq!(pattern.next_expected_date.to_string(), "2024-04-05");
    }

    #[test]
    fn noisy_amounts_are_rejected() {
        let history = vec![
            observation(1_000, "2024-01-01", "Groceries"),
            observation(5_000, "2024-02-01", "Groceries"),
            observation(9_000, "2024-03-01", "Groceries"),
        ];
        assert!(analyze(&history).is_empty());
    }

    #[test]
    fn zero_variance_confidence_is_capped() {
        let history = vec![
            observation(1_099, "2024-01-10", "Spotify"),
            observation(1_099, "2024-02-10", "Spotify"),
            observation(1_099, "2024-03-10", "Spotify"),
        ];
        let patterns = analyze(&history);
        assert_eq!(patterns[0].confidence, 95);
    }

    #[test]
    fn weekly_intervals_classify_as_weekly() {
        let history = vec![
            observation(2_500, "2024-03-01", "Cleaner"),
            observation(2_500, "2024-03-08", "Cleaner"),
            observation(2_500, "2024-03-15", "Cleaner"),
        ];
        assert_eq!(analyze(&history)[0].frequency, Frequency::Weekly);
    }

    #[test]
    fn singleton_groups_are_dropped() {
        let history = vec![
            observation(999, "2024-01-05", "Netflix"),
            observation(999, "2024-02-04", "Netflix"),
            observation(12_000, "2024-02-15", "Dentist"),
        ];
        let patterns = analyze(&history);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].description, "netflix");
    }

    #[test]
    fn groups_come_back_in_sorted_key_order() {
        let history = vec![
            observation(999, "2024-01-05", "Zebra Gym"),
            observation(999, "2024-02-05", "Zebra Gym"),
            observation(499, "2024-01-10", "Apple Music"),
            observation(499, "2024-02-10", "Apple Music"),
        ];
        let keys: Vec<_> = analyze(&history)
            .into_iter()
            .map(|p| p.description)
            .collect();
        assert_eq!(keys, vec!["apple music", "zebra gym"]);
    }
}
