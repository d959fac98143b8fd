//! MySQL recurring adapter
//!
//! Detection reads the last six months of budget transactions, runs the
//! shared detector and reconciles against the caller's **active**
//! patterns: a match refreshes the row in place, anything else inserts
//! a fresh active row. A deactivated pattern stays on record untouched;
//! re-detected spend surfaces as a new pattern instead of silently
//! feeding the inactive one. Only inserts count toward the outcome.

use async_trait::async_trait;
use chrono::{DateTime, Months, NaiveDate, Utc};
use sqlx::{MySqlPool, QueryBuilder};
use std::collections::HashMap;
use tracing::{debug, instrument};

use core_kernel::{Frequency, StoreError};
use domain_recurring::{
    analyze, DetectionOutcome, PatternSettings, RecurringPattern, RecurringStore, SpendProjection,
    TransactionObservation, UpcomingCharge,
};

use crate::error::{map_error, STORE_NAME};

/// How far back detection looks, in months
const HISTORY_MONTHS: u32 = 6;

/// Store A implementation of [`RecurringStore`]
#[derive(Debug, Clone)]
pub struct MySqlRecurringStore {
    pool: MySqlPool,
    admin_id: i64,
}

#[derive(sqlx::FromRow)]
struct PatternRow {
    id: i64,
    description: String,
    category_id: Option<i64>,
    category_name: Option<String>,
    average_amount_minor: i64,
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

impl TryFrom<PatternRow> for RecurringPattern {
    type Error = StoreError;

    fn try_from(row: PatternRow) -> Result<Self, Self::Error> {
        let frequency: Frequency = row.frequency.parse().map_err(|_| {
            StoreError::unavailable(
                STORE_NAME,
                format!("unexpected frequency '{}'", row.frequency),
            )
        })?;
        Ok(RecurringPattern {
            id: row.id,
            description: row.description,
            category_id: row.category_id,
            category_name: row.category_name,
            average_amount_minor: row.average_amount_minor,
            frequency,
            confidence: row.confidence,
            next_expected_date: row.next_expected_date,
            last_occurrence: row.last_occurrence,
            is_subscription: row.is_subscription,
            is_active: row.is_active,
            reminder_enabled: row.reminder_enabled,
            auto_add: row.auto_add,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PATTERN_COLUMNS: &str = "r.id, r.description, r.category_id, c.name AS category_name, \
     r.average_amount_minor, r.frequency, r.confidence, r.next_expected_date, \
     r.last_occurrence, r.is_subscription, r.is_active, r.reminder_enabled, r.auto_add, \
     r.notes, r.created_at, r.updated_at";

impl MySqlRecurringStore {
    pub fn new(pool: MySqlPool, admin_id: i64) -> Self {
        Self { pool, admin_id }
    }

    async fn recent_history(&self) -> Result<Vec<TransactionObservation>, StoreError> {
        let today = Utc::now().date_naive();
        let since = today
            .checked_sub_months(Months::new(HISTORY_MONTHS))
            .unwrap_or(today);

        let rows: Vec<(i64, DateTime<Utc>, String, Option<i64>)> = sqlx::query_as(
            "SELECT amount_minor, transaction_date, description, category_id \
             FROM budget_transactions \
             WHERE user_id = ? AND description IS NOT NULL AND transaction_date >= ?",
        )
        .bind(self.admin_id)
        .bind(since.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_error("budget transaction", e))?;

        Ok(rows
            .into_iter()
            .map(
                |(amount_minor, date, description, category_id)| TransactionObservation {
                    amount_minor,
                    date: date.date_naive(),
                    description,
                    category_id,
                },
            )
            .collect())
    }
}

#[async_trait]
impl RecurringStore for MySqlRecurringStore {
    #[instrument(skip(self), fields(user_id = self.admin_id))]
    async fn detect_patterns(&self) -> Result<DetectionOutcome, StoreError> {
        let history = self.recent_history().await?;
        let detected = analyze(&history);
        if detected.is_empty() {
            return Ok(DetectionOutcome { patterns_found: 0 });
        }

        let active: Vec<(i64, String)> = sqlx::query_as(
            "SELECT id, description FROM recurring_transactions \
             WHERE user_id = ? AND is_active",
        )
        .bind(self.admin_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_error("recurring pattern", e))?;
        let active_ids: HashMap<String, i64> = active
            .into_iter()
            .map(|(id, description)| (description, id))
            .collect();

        let mut created = 0;
        for pattern in detected {
            match active_ids.get(&pattern.description) {
                Some(&id) => {
                    sqlx::query(
                        "UPDATE recurring_transactions SET \
                         category_id = ?, average_amount_minor = ?, frequency = ?, \
                         confidence = ?, next_expected_date = ?, last_occurrence = ?, \
                         is_subscription = ?, updated_at = CURRENT_TIMESTAMP \
                         WHERE id = ? AND user_id = ?",
                    )
                    .bind(pattern.category_id)
                    .bind(pattern.average_amount_minor)
                    .bind(pattern.frequency.as_str())
                    .bind(pattern.confidence)
                    .bind(pattern.next_expected_date)
                    .bind(pattern.last_occurrence)
                    .bind(pattern.is_subscription)
                    .bind(id)
                    .bind(self.admin_id)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| map_error("recurring pattern", e))?;
                }
                None => {
                    sqlx::query(
                        "INSERT INTO recurring_transactions \
                         (user_id, description, category_id, average_amount_minor, frequency, \
                          confidence, next_expected_date, last_occurrence, is_subscription) \
                         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    )
                    .bind(self.admin_id)
                    .bind(&pattern.description)
                    .bind(pattern.category_id)
                    .bind(pattern.average_amount_minor)
                    .bind(pattern.frequency.as_str())
                    .bind(pattern.confidence)
                    .bind(pattern.next_expected_date)
                    .bind(pattern.last_occurrence)
                    .bind(pattern.is_subscription)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| map_error("recurring pattern", e))?;
                    created += 1;
                }
            }
        }

        debug!(patterns_found = created, "detection run complete");
        Ok(DetectionOutcome {
            patterns_found: created,
        })
    }

    #[instrument(skip(self), fields(user_id = self.admin_id))]
    async fn list_patterns(&self, active_only: bool) -> Result<Vec<RecurringPattern>, StoreError> {
        let sql = if active_only {
            format!(
                "SELECT {PATTERN_COLUMNS} FROM recurring_transactions r \
                 LEFT JOIN budget_categories c ON c.id = r.category_id \
                 WHERE r.user_id = ? AND r.is_active ORDER BY r.description"
            )
        } else {
            format!(
                "SELECT {PATTERN_COLUMNS} FROM recurring_transactions r \
                 LEFT JOIN budget_categories c ON c.id = r.category_id \
                 WHERE r.user_id = ? ORDER BY r.description"
            )
        };
        let rows: Vec<PatternRow> = sqlx::query_as(&sql)
            .bind(self.admin_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_error("recurring pattern", e))?;
        rows.into_iter().map(RecurringPattern::try_from).collect()
    }

    #[instrument(skip(self), fields(user_id = self.admin_id))]
    async fn project_spend(&self) -> Result<SpendProjection, StoreError> {
        let active = self.list_patterns(true).await?;
        Ok(SpendProjection::from_patterns(&active))
    }

    #[instrument(skip(self, settings), fields(user_id = self.admin_id))]
    async fn update_settings(
        &self,
        pattern_id: i64,
        settings: PatternSettings,
    ) -> Result<(), StoreError> {
        if settings.is_empty() {
            return Err(StoreError::validation("no settings to update"));
        }

        let mut builder = QueryBuilder::new("UPDATE recurring_transactions SET ");
        {
            let mut fields = builder.separated(", ");
            if let Some(reminder) = settings.reminder_enabled {
                fields
                    .push("reminder_enabled = ")
                    .push_bind_unseparated(reminder);
            }
            if let Some(auto_add) = settings.auto_add {
                fields.push("auto_add = ").push_bind_unseparated(auto_add);
            }
            if let Some(active) = settings.is_active {
                fields.push("is_active = ").push_bind_unseparated(active);
            }
            if let Some(notes) = settings.notes {
                fields.push("notes = ").push_bind_unseparated(notes);
            }
            fields.push("updated_at = CURRENT_TIMESTAMP");
        }
        builder
            .push(" WHERE id = ")
            .push_bind(pattern_id)
            .push(" AND user_id = ")
            .push_bind(self.admin_id);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_error("recurring pattern", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("recurring pattern"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = self.admin_id))]
    async fn upcoming(&self, horizon_days: u32) -> Result<Vec<UpcomingCharge>, StoreError> {
        let today = Utc::now().date_naive();
        let end = today + chrono::Days::new(u64::from(horizon_days));

        let rows: Vec<(i64, String, i64, NaiveDate, Option<String>)> = sqlx::query_as(
            "SELECT r.id, r.description, r.average_amount_minor, r.next_expected_date, c.name \
             FROM recurring_transactions r \
             LEFT JOIN budget_categories c ON c.id = r.category_id \
             WHERE r.user_id = ? AND r.is_active \
               AND r.next_expected_date BETWEEN ? AND ? \
             ORDER BY r.next_expected_date, r.description",
        )
        .bind(self.admin_id)
        .bind(today)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_error("recurring pattern", e))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, description, amount_minor, due_date, category)| UpcomingCharge {
                    id,
                    description,
                    amount_minor,
                    due_date,
                    days_until_due: (due_date - today).num_days(),
                    category: category.unwrap_or_else(|| "Other".to_string()),
                },
            )
            .collect())
    }
}
