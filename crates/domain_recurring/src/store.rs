//! Recurring store contract
//!
//! Adapters are constructed for exactly one caller. Detection is an
//! explicit operation: it re-reads recent history, runs the detector and
//! reconciles the result against the caller's active patterns by
//! normalized description.

use async_trait::async_trait;

use core_kernel::StoreError;

use crate::pattern::{
    DetectionOutcome, PatternSettings, RecurringPattern, SpendProjection, UpcomingCharge,
};

/// Default lookahead for the upcoming-charges view, in days
pub const DEFAULT_UPCOMING_HORIZON_DAYS: u32 = 30;

/// Backend-independent recurring-pattern operations
#[async_trait]
pub trait RecurringStore: Send + Sync {
    /// Re-analyzes recent history and upserts patterns; the outcome
    /// counts newly created patterns only
    async fn detect_patterns(&self) -> Result<DetectionOutcome, StoreError>;

    /// Lists the caller's patterns; inactive ones only when asked for
    async fn list_patterns(&self, active_only: bool) -> Result<Vec<RecurringPattern>, StoreError>;

    /// Projects recurring spend over active patterns
    async fn project_spend(&self) -> Result<SpendProjection, StoreError>;

    /// Updates user-facing toggles; an all-empty update is a
    /// `Validation` error, an unknown id is `NotFound`
    async fn update_settings(
        &self,
        pattern_id: i64,
        settings: PatternSettings,
    ) -> Result<(), StoreError>;

    /// Active patterns expected to charge within the horizon, soonest
    /// first
    async fn upcoming(&self, horizon_days: u32) -> Result<Vec<UpcomingCharge>, StoreError>;

    /// [`Self::upcoming`] with the default 30-day horizon
    async fn upcoming_default(&self) -> Result<Vec<UpcomingCharge>, StoreError> {
        self.upcoming(DEFAULT_UPCOMING_HORIZON_DAYS).await
    }
}

/// In-memory mock for tests without a live store
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use crate::detector::{analyze, TransactionObservation};
    use chrono::{NaiveDate, Utc};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Mock store fed with canned history and a fixed "today"
    #[derive(Debug)]
    pub struct MockRecurringStore {
        history: RwLock<Vec<TransactionObservation>>,
        today: NaiveDate,
        patterns: Arc<RwLock<Vec<RecurringPattern>>>,
        next_id: AtomicI64,
    }

    impl MockRecurringStore {
        pub fn new(history: Vec<TransactionObservation>, today: NaiveDate) -> Self {
            Self {
                history: RwLock::new(history),
                today,
                patterns: Arc::new(RwLock::new(Vec::new())),
                next_id: AtomicI64::new(1),
            }
        }

        /// Swaps the canned history, as if more transactions arrived
        /// between detection runs
        pub async fn replace_history(&self, history: Vec<TransactionObservation>) {
            *self.history.write().await = history;
        }

        fn allocate_id(&self) -> i64 {
            self.next_id.fetch_add(1, Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl RecurringStore for MockRecurringStore {
        async fn detect_patterns(&self) -> Result<DetectionOutcome, StoreError> {
            let detected = analyze(&self.history.read().await);
            let mut patterns = self.patterns.write().await;
            let mut created = 0;
            for candidate in detected {
                let now = Utc::now();
                // Only an active pattern absorbs a re-detection; a
                // deactivated one stays untouched and a fresh row is made
                match patterns
                    .iter_mut()
                    .find(|p| p.is_active && p.description == candidate.description)
                {
                    Some(existing) => {
                        existing.category_id = candidate.category_id;
                        existing.average_amount_minor = candidate.average_amount_minor;
                        existing.frequency = candidate.frequency;
                        existing.confidence = candidate.confidence;
                        existing.next_expected_date = candidate.next_expected_date;
                        existing.last_occurrence = candidate.last_occurrence;
                        existing.is_subscription = candidate.is_subscription;
                        existing.updated_at = now;
                    }
                    None => {
                        patterns.push(RecurringPattern {
                            id: self.allocate_id(),
                            description: candidate.description,
                            category_id: candidate.category_id,
                            category_name: None,
                            average_amount_minor: candidate.average_amount_minor,
                            frequency: candidate.frequency,
                            confidence: candidate.confidence,
                            next_expected_date: candidate.next_expected_date,
                            last_occurrence: candidate.last_occurrence,
                            is_subscription: candidate.is_subscription,
                            is_active: true,
                            reminder_enabled: true,
                            auto_add: false,
                            notes: None,
                            created_at: now,
                            updated_at: now,
                        });
                        created += 1;
                    }
                }
            }
            Ok(DetectionOutcome {
                patterns_found: created,
            })
        }

        async fn list_patterns(
            &self,
            active_only: bool,
        ) -> Result<Vec<RecurringPattern>, StoreError> {
            Ok(self
                .patterns
                .read()
                .await
                .iter()
                .filter(|p| !active_only || p.is_active)
                .cloned()
                .collect())
        }

        async fn project_spend(&self) -> Result<SpendProjection, StoreError> {
            let active = self.list_patterns(true).await?;
            Ok(SpendProjection::from_patterns(&active))
        }

        async fn update_settings(
            &self,
            pattern_id: i64,
            settings: PatternSettings,
        ) -> Result<(), StoreError> {
            if settings.is_empty() {
                return Err(StoreError::validation("no settings to update"));
            }
            let mut patterns = self.patterns.write().await;
            let pattern = patterns
                .iter_mut()
                .find(|p| p.id == pattern_id)
                .ok_or_else(|| StoreError::not_found("recurring pattern"))?;
            if let Some(reminder) = settings.reminder_enabled {
                pattern.reminder_enabled = reminder;
            }
            if let Some(auto_add) = settings.auto_add {
                pattern.auto_add = auto_add;
            }
            if let Some(active) = settings.is_active {
                pattern.is_active = active;
            }
            if let Some(notes) = settings.notes {
                pattern.notes = Some(notes);
            }
            pattern.updated_at = Utc::now();
            Ok(())
        }

        async fn upcoming(&self, horizon_days: u32) -> Result<Vec<UpcomingCharge>, StoreError> {
            let mut charges: Vec<UpcomingCharge> = self
                .patterns
                .read()
                .await
                .iter()
                .filter(|p| p.is_active)
                .filter_map(|p| {
                    let days_until_due = (p.next_expected_date - self.today).num_days();
                    if (0..=i64::from(horizon_days)).contains(&days_until_due) {
                        Some(UpcomingCharge {
                            id: p.id,
                            description: p.description.clone(),
                            amount_minor: p.average_amount_minor,
                            due_date: p.next_expected_date,
                            days_until_due,
                            category: p
                                .category_name
                                .clone()
                                .unwrap_or_else(|| "Other".to_string()),
                        })
                    } else {
                        None
                    }
                })
                .collect();
            charges.sort_by_key(|c| c.due_date);
            Ok(charges)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockRecurringStore;
    use super::*;
    use crate::detector::TransactionObservation;
    use chrono::NaiveDate;

    fn observation(amount_minor: i64, date: &str, description: &str) -> TransactionObservation {
        TransactionObservation {
            amount_minor,
            date: date.parse().unwrap(),
            description: description.to_string(),
            category_id: None,
        }
    }

    fn two_pattern_history() -> Vec<TransactionObservation> {
        vec![
            observation(999, "2024-01-05", "Netflix"),
            observation(999, "2024-02-05", "Netflix"),
            observation(999, "2024-03-05", "Netflix"),
            observation(4_500, "2024-01-20", "Gym Membership"),
            observation(4_500, "2024-02-20", "Gym Membership"),
            observation(4_500, "2024-03-20", "Gym Membership"),
        ]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 25).unwrap()
    }

    #[tokio::test]
    async fn repeated_detection_is_idempotent() {
        let store = MockRecurringStore::new(two_pattern_history(), today());

        let first = store.detect_patterns().await.unwrap();
        assert_eq!(first.patterns_found, 2);

        let second = store.detect_patterns().await.unwrap();
        assert_eq!(second.patterns_found, 0);
        assert_eq!(store.list_patterns(true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn upcoming_respects_the_horizon() {
        let store = MockRecurringStore::new(two_pattern_history(), today());
        store.detect_patterns().await.unwrap();

        // Netflix due 2024-04-05 (11 days), gym due 2024-04-20 (26 days)
        let narrow = store.upcoming(10).await.unwrap();
        assert!(narrow.is_empty());

        let wide = store.upcoming(45).await.unwrap();
        assert_eq!(wide.len(), 2);
        assert_eq!(wide[0].description, "netflix");
        assert_eq!(wide[0].days_until_due, 11);
    }

    #[tokio::test]
    async fn deactivated_pattern_does_not_absorb_redetection() {
        let store = MockRecurringStore::new(two_pattern_history(), today());
        store.detect_patterns().await.unwrap();
        let netflix = store
            .list_patterns(true)
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.description == "netflix")
            .unwrap();
        store
            .update_settings(
                netflix.id,
                PatternSettings {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // The still-recurring spend comes back as a fresh active pattern;
        // the deactivated row stays on record untouched
        let rerun = store.detect_patterns().await.unwrap();
        assert_eq!(rerun.patterns_found, 1);

        let active = store.list_patterns(true).await.unwrap();
        assert_eq!(active.len(), 2);
        let fresh = active.iter().find(|p| p.description == "netflix").unwrap();
        assert_ne!(fresh.id, netflix.id);
        assert_eq!(store.list_patterns(false).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn redetection_refreshes_derived_fields_in_place() {
        let store = MockRecurringStore::new(two_pattern_history(), today());
        store.detect_patterns().await.unwrap();

        let updated_history = vec![
            TransactionObservation {
                category_id: Some(7),
                ..observation(1_099, "2024-02-05", "Netflix")
            },
            TransactionObservation {
                category_id: Some(7),
                ..observation(1_099, "2024-03-05", "Netflix")
            },
            TransactionObservation {
                category_id: Some(7),
                ..observation(1_099, "2024-04-05", "Netflix")
            },
        ];
        store.replace_history(updated_history).await;

        let rerun = store.detect_patterns().await.unwrap();
        assert_eq!(rerun.patterns_found, 0);

        let netflix = store
            .list_patterns(true)
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.description == "netflix")
            .unwrap();
        assert_eq!(netflix.average_amount_minor, 1_099);
        assert_eq!(netflix.category_id, Some(7));
        assert_eq!(netflix.last_occurrence.to_string(), "2024-04-05");
        assert!(netflix.is_subscription);
    }

    #[tokio::test]
    async fn deactivated_patterns_leave_every_view() {
        let store = MockRecurringStore::new(two_pattern_history(), today());
        store.detect_patterns().await.unwrap();
        let netflix = store
            .list_patterns(true)
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.description == "netflix")
            .unwrap();

        store
            .update_settings(
                netflix.id,
                PatternSettings {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(store.list_patterns(true).await.unwrap().len(), 1);
        assert_eq!(store.list_patterns(false).await.unwrap().len(), 2);
        assert!(store
            .upcoming_default()
            .await
            .unwrap()
            .iter()
            .all(|c| c.description != "netflix"));
    }

    #[tokio::test]
    async fn empty_settings_update_is_rejected() {
        let store = MockRecurringStore::new(two_pattern_history(), today());
        store.detect_patterns().await.unwrap();
        let error = store
            .update_settings(1, PatternSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(error, StoreError::Validation { .. }));
    }

    #[tokio::test]
    async fn unknown_pattern_is_not_found() {
        let store = MockRecurringStore::new(two_pattern_history(), today());
        let error = store
            .update_settings(
                404,
                PatternSettings {
                    auto_add: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn projection_covers_active_patterns() {
        let store = MockRecurringStore::new(two_pattern_history(), today());
        store.detect_patterns().await.unwrap();

        let projection = store.project_spend().await.unwrap();
        assert_eq!(projection.monthly_total_minor, 999 + 4_500);
        assert_eq!(projection.yearly_total_minor, (999 + 4_500) * 12);
    }
}
