//! PostgREST recurring adapter
//!
//! Runs the shared detector over the caller's trailing six months of
//! budget transactions, then reconciles against the caller's **active**
//! patterns with a select-then-insert-or-update pass; a deactivated
//! pattern stays untouched and re-detected spend gets a fresh active
//! row. Category names are resolved through a second lookup instead of
//! a joined representation.

use async_trait::async_trait;
use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

use core_kernel::{to_major_units, to_minor_units, Frequency, StoreError};
use domain_recurring::{
    analyze, DetectionOutcome, PatternSettings, RecurringPattern, RecurringStore, SpendProjection,
    TransactionObservation, UpcomingCharge,
};

use crate::client::{eq, gte, lte, order, PostgrestClient, STORE_NAME};

const PATTERNS: &str = "recurring_transactions";
const TRANSACTIONS: &str = "budget_transactions";
const CATEGORIES: &str = "budget_categories";

/// How far back detection looks, in months
const HISTORY_MONTHS: u32 = 6;

/// Store B implementation of [`RecurringStore`]
#[derive(Debug, Clone)]
pub struct PostgrestRecurringStore {
    client: PostgrestClient,
    user_id: String,
}

fn amount_from_wire(amount: Decimal) -> Result<i64, StoreError> {
    to_minor_units(amount).map_err(|e| StoreError::unavailable(STORE_NAME, e.to_string()))
}

#[derive(Debug, Deserialize)]
struct HistoryWire {
    amount: Decimal,
    transaction_date: DateTime<Utc>,
    description: Option<String>,
    category_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PatternWire {
    id: i64,
    description: String,
    category_id: Option<i64>,
    average_amount: Decimal,
    frequency: String,
    confidence: u8,
    next_expected_date: NaiveDate,
    last_occurrence: NaiveDate,
    is_subscription: bool,
    is_active: bool,
    reminder_enabled: bool,
    auto_add: bool,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PatternWire {
    fn into_pattern(
        self,
        category_names: &HashMap<i64, String>,
    ) -> Result<RecurringPattern, StoreError> {
        let frequency: Frequency = self.frequency.parse().map_err(|_| {
            StoreError::unavailable(
                STORE_NAME,
                format!("unexpected frequency '{}'", self.frequency),
            )
        })?;
        Ok(RecurringPattern {
            id: self.id,
            description: self.description,
            category_id: self.category_id,
            category_name: self
                .category_id
                .and_then(|id| category_names.get(&id).cloned()),
            average_amount_minor: amount_from_wire(self.average_amount)?,
            frequency,
            confidence: self.confidence,
            next_expected_date: self.next_expected_date,
            last_occurrence: self.last_occurrence,
            is_subscription: self.is_subscription,
            is_active: self.is_active,
            reminder_enabled: self.reminder_enabled,
            auto_add: self.auto_add,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Serialize)]
struct NewPatternWire<'a> {
    user_id: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<i64>,
    average_amount: Decimal,
    frequency: &'static str,
    confidence: u8,
    next_expected_date: NaiveDate,
    last_occurrence: NaiveDate,
    is_subscription: bool,
    is_active: bool,
    reminder_enabled: bool,
    auto_add: bool,
}

#[derive(Debug, Serialize)]
struct PatternRefreshWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<i64>,
    average_amount: Decimal,
    frequency: &'static str,
    confidence: u8,
    next_expected_date: NaiveDate,
    last_occurrence: NaiveDate,
    is_subscription: bool,
}

#[derive(Debug, Serialize)]
struct SettingsWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    reminder_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_add: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryNameWire {
    id: i64,
    name: String,
}

impl PostgrestRecurringStore {
    /// Refuses a client without a caller id; Store B request paths are
    /// always per-caller
    pub fn new(client: PostgrestClient) -> Result<Self, StoreError> {
        let user_id = client.require_caller()?.to_string();
        Ok(Self { client, user_id })
    }

    async fn recent_history(&self) -> Result<Vec<TransactionObservation>, StoreError> {
        let today = Utc::now().date_naive();
        let since = today
            .checked_sub_months(Months::new(HISTORY_MONTHS))
            .unwrap_or(today);

        let rows: Vec<HistoryWire> = self
            .client
            .select(
                TRANSACTIONS,
                &[
                    eq("user_id", &self.user_id),
                    gte("transaction_date", since.to_string()),
                ],
            )
            .await?;

        let mut observations = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(description) = row.description else {
                continue;
            };
            observations.push(TransactionObservation {
                amount_minor: amount_from_wire(row.amount)?,
                date: row.transaction_date.date_naive(),
                description,
                category_id: row.category_id,
            });
        }
        Ok(observations)
    }

    async fn category_names(&self) -> Result<HashMap<i64, String>, StoreError> {
        let rows: Vec<CategoryNameWire> = self
            .client
            .select(
                CATEGORIES,
                &[
                    eq("user_id", &self.user_id),
                    ("select".to_string(), "id,name".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|c| (c.id, c.name)).collect())
    }
}

#[async_trait]
impl RecurringStore for PostgrestRecurringStore {
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn detect_patterns(&self) -> Result<DetectionOutcome, StoreError> {
        let history = self.recent_history().await?;
        let detected = analyze(&history);
        if detected.is_empty() {
            return Ok(DetectionOutcome { patterns_found: 0 });
        }

        let active: Vec<PatternWire> = self
            .client
            .select(
                PATTERNS,
                &[eq("user_id", &self.user_id), eq("is_active", "true")],
            )
            .await?;
        let active_ids: HashMap<String, i64> = active
            .into_iter()
            .map(|p| (p.description, p.id))
            .collect();

        let mut created = 0;
        for pattern in detected {
            match active_ids.get(&pattern.description) {
                Some(&id) => {
                    self.client
                        .update(
                            "recurring pattern",
                            PATTERNS,
                            &[eq("id", id), eq("user_id", &self.user_id)],
                            &PatternRefreshWire {
                                category_id: pattern.category_id,
                                average_amount: to_major_units(pattern.average_amount_minor),
                                frequency: pattern.frequency.as_str(),
                                confidence: pattern.confidence,
                                next_expected_date: pattern.next_expected_date,
                                last_occurrence: pattern.last_occurrence,
                                is_subscription: pattern.is_subscription,
                            },
                        )
                        .await?;
                }
                None => {
                    let _: PatternWire = self
                        .client
                        .insert_returning(
                            "recurring pattern",
                            PATTERNS,
                            &NewPatternWire {
                                user_id: &self.user_id,
                                description: &pattern.description,
                                category_id: pattern.category_id,
                                average_amount: to_major_units(pattern.average_amount_minor),
                                frequency: pattern.frequency.as_str(),
                                confidence: pattern.confidence,
                                next_expected_date: pattern.next_expected_date,
                                last_occurrence: pattern.last_occurrence,
                                is_subscription: pattern.is_subscription,
                                is_active: true,
                                reminder_enabled: true,
                                auto_add: false,
                            },
                        )
                        .await?;
                    created += 1;
                }
            }
        }

        debug!(patterns_found = created, "detection run complete");
        Ok(DetectionOutcome {
            patterns_found: created,
        })
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn list_patterns(&self, active_only: bool) -> Result<Vec<RecurringPattern>, StoreError> {
        let mut params = vec![eq("user_id", &self.user_id)];
        if active_only {
            params.push(eq("is_active", "true"));
        }
        params.push(order("description.asc"));

        let rows: Vec<PatternWire> = self.client.select(PATTERNS, &params).await?;
        let names = self.category_names().await?;
        rows.into_iter().map(|p| p.into_pattern(&names)).collect()
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn project_spend(&self) -> Result<SpendProjection, StoreError> {
        let active = self.list_patterns(true).await?;
        Ok(SpendProjection::from_patterns(&active))
    }

    #[instrument(skip(self, settings), fields(user_id = %self.user_id))]
    async fn update_settings(
        &self,
        pattern_id: i64,
        settings: PatternSettings,
    ) -> Result<(), StoreError> {
        if settings.is_empty() {
            return Err(StoreError::validation("no settings to update"));
        }
        self.client
            .update(
                "recurring pattern",
                PATTERNS,
                &[eq("id", pattern_id), eq("user_id", &self.user_id)],
                &SettingsWire {
                    reminder_enabled: settings.reminder_enabled,
                    auto_add: settings.auto_add,
                    is_active: settings.is_active,
                    notes: settings.notes,
                },
            )
            .await
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn upcoming(&self, horizon_days: u32) -> Result<Vec<UpcomingCharge>, StoreError> {
        let today = Utc::now().date_naive();
        let end = today + chrono::Days::new(u64::from(horizon_days));

        let rows: Vec<PatternWire> = self
            .client
            .select(
                PATTERNS,
                &[
                    eq("user_id", &self.user_id),
                    eq("is_active", "true"),
                    gte("next_expected_date", today.to_string()),
                    lte("next_expected_date", end.to_string()),
                    order("next_expected_date.asc"),
                ],
            )
            .await?;
        let names = self.category_names().await?;

        let mut charges = Vec::with_capacity(rows.len());
        for row in rows {
            let pattern = row.into_pattern(&names)?;
            charges.push(UpcomingCharge {
                id: pattern.id,
                description: pattern.description,
                amount_minor: pattern.average_amount_minor,
                due_date: pattern.next_expected_date,
                days_until_due: (pattern.next_expected_date - today).num_days(),
                category: pattern
                    .category_name
                    .unwrap_or_else(|| "Other".to_string()),
            });
        }
        Ok(charges)
    }
}
