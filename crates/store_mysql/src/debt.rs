//! MySQL debt adapter
//!
//! Balance and status changes happen inside one transaction so a payment
//! can never land without its balance effect. Deletion is soft: rows are
//! flipped to `closed` and stay on record.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{MySqlPool, QueryBuilder};
use tracing::{debug, instrument};

use core_kernel::StoreError;
use domain_debt::{
    validate_request, Debt, DebtPayment, DebtStatus, DebtStore, DebtUpdate, NewDebt,
    NewDebtPayment,
};

use crate::error::{map_error, STORE_NAME};

/// Store A implementation of [`DebtStore`]
#[derive(Debug, Clone)]
pub struct MySqlDebtStore {
    pool: MySqlPool,
    admin_id: i64,
}

#[derive(sqlx::FromRow)]
struct DebtRow {
    id: i64,
    name: String,
    debt_type: String,
    original_amount_minor: i64,
    current_balance_minor: i64,
    interest_rate_bp: i64,
    minimum_payment_minor: i64,
    due_date: Option<NaiveDate>,
    due_day: Option<u32>,
    status: String,
    creditor: Option<String>,
    account_number: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(value: &str) -> Result<DebtStatus, StoreError> {
    value
        .parse()
        .map_err(|_| StoreError::unavailable(STORE_NAME, format!("unexpected debt status '{value}'")))
}

impl TryFrom<DebtRow> for Debt {
    type Error = StoreError;

    fn try_from(row: DebtRow) -> Result<Self, Self::Error> {
        Ok(Debt {
            id: row.id,
            name: row.name,
            debt_type: row.debt_type,
            original_amount_minor: row.original_amount_minor,
            current_balance_minor: row.current_balance_minor,
            interest_rate_bp: row.interest_rate_bp,
            minimum_payment_minor: row.minimum_payment_minor,
            due_date: row.due_date,
            due_day: row.due_day,
            status: parse_status(&row.status)?,
            creditor: row.creditor,
            account_number: row.account_number,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    debt_id: i64,
    amount_minor: i64,
    payment_date: NaiveDate,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PaymentRow> for DebtPayment {
    fn from(row: PaymentRow) -> Self {
        DebtPayment {
            id: row.id,
            debt_id: row.debt_id,
            amount_minor: row.amount_minor,
            payment_date: row.payment_date,
            note: row.note,
            created_at: row.created_at,
        }
    }
}

const DEBT_COLUMNS: &str = "id, name, debt_type, original_amount_minor, current_balance_minor, \
     interest_rate_bp, minimum_payment_minor, due_date, due_day, status, creditor, \
     account_number, notes, created_at, updated_at";

impl MySqlDebtStore {
    pub fn new(pool: MySqlPool, admin_id: i64) -> Self {
        Self { pool, admin_id }
    }
}

#[async_trait]
impl DebtStore for MySqlDebtStore {
    #[instrument(skip(self, request), fields(user_id = self.admin_id))]
    async fn add_debt(&self, request: NewDebt) -> Result<Debt, StoreError> {
        validate_request(&request)?;
        let result = sqlx::query(
            "INSERT INTO debts \
             (user_id, name, debt_type, original_amount_minor, current_balance_minor, \
              interest_rate_bp, minimum_payment_minor, due_date, due_day, creditor, \
              account_number, notes) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(self.admin_id)
        .bind(&request.name)
        .bind(&request.debt_type)
        .bind(request.original_amount_minor)
        .bind(request.current_balance_minor)
        .bind(request.interest_rate_bp)
        .bind(request.minimum_payment_minor)
        .bind(request.due_date)
        .bind(request.due_day)
        .bind(&request.creditor)
        .bind(&request.account_number)
        .bind(&request.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| map_error("debt", e))?;

        self.get_debt(result.last_insert_id() as i64).await
    }

    #[instrument(skip(self), fields(user_id = self.admin_id))]
    async fn list_debts(&self, include_inactive: bool) -> Result<Vec<Debt>, StoreError> {
        let sql = if include_inactive {
            format!("SELECT {DEBT_COLUMNS} FROM debts WHERE user_id = ? ORDER BY created_at")
        } else {
            format!(
                "SELECT {DEBT_COLUMNS} FROM debts \
                 WHERE user_id = ? AND status = 'active' ORDER BY created_at"
            )
        };
        let rows: Vec<DebtRow> = sqlx::query_as(&sql)
            .bind(self.admin_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_error("debt", e))?;
        rows.into_iter().map(Debt::try_from).collect()
    }

    #[instrument(skip(self), fields(user_id = self.admin_id))]
    async fn get_debt(&self, debt_id: i64) -> Result<Debt, StoreError> {
        let row: DebtRow = sqlx::query_as(&format!(
            "SELECT {DEBT_COLUMNS} FROM debts WHERE id = ? AND user_id = ?"
        ))
        .bind(debt_id)
        .bind(self.admin_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_error("debt", e))?;
        row.try_into()
    }

    #[instrument(skip(self, update), fields(user_id = self.admin_id))]
    async fn update_debt(&self, debt_id: i64, update: DebtUpdate) -> Result<(), StoreError> {
        if update.is_empty() {
            return Err(StoreError::validation("no fields to update"));
        }

        let mut builder = QueryBuilder::new("UPDATE debts SET ");
        {
            let mut fields = builder.separated(", ");
            if let Some(name) = update.name {
                fields.push("name = ").push_bind_unseparated(name);
            }
            if let Some(balance) = update.current_balance_minor {
                fields
                    .push("current_balance_minor = ")
                    .push_bind_unseparated(balance);
            }
            if let Some(rate) = update.interest_rate_bp {
                fields.push("interest_rate_bp = ").push_bind_unseparated(rate);
            }
            if let Some(minimum) = update.minimum_payment_minor {
                fields
                    .push("minimum_payment_minor = ")
                    .push_bind_unseparated(minimum);
            }
            if let Some(due_date) = update.due_date {
                fields.push("due_date = ").push_bind_unseparated(due_date);
            }
            if let Some(due_day) = update.due_day {
                fields.push("due_day = ").push_bind_unseparated(due_day);
            }
            if let Some(creditor) = update.creditor {
                fields.push("creditor = ").push_bind_unseparated(creditor);
            }
            if let Some(notes) = update.notes {
                fields.push("notes = ").push_bind_unseparated(notes);
            }
            fields.push("updated_at = CURRENT_TIMESTAMP");
        }
        builder
            .push(" WHERE id = ")
            .push_bind(debt_id)
            .push(" AND user_id = ")
            .push_bind(self.admin_id);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_error("debt", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("debt"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = self.admin_id))]
    async fn close_debt(&self, debt_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE debts SET status = 'closed', updated_at = CURRENT_TIMESTAMP \
             WHERE id = ? AND user_id = ?",
        )
        .bind(debt_id)
        .bind(self.admin_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_error("debt", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("debt"));
        }
        debug!(debt_id, "closed debt");
        Ok(())
    }

    #[instrument(skip(self, request), fields(user_id = self.admin_id))]
    async fn record_payment(&self, request: NewDebtPayment) -> Result<DebtPayment, StoreError> {
        validate_request(&request)?;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_error("debt payment", e))?;

        let row: Option<(i64, String)> = sqlx::query_as(
            "SELECT current_balance_minor, status FROM debts \
             WHERE id = ? AND user_id = ? FOR UPDATE",
        )
        .bind(request.debt_id)
        .bind(self.admin_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_error("debt", e))?;
        let (balance, status) = row.ok_or_else(|| StoreError::not_found("debt"))?;

        let new_balance = (balance - request.amount_minor).max(0);
        let new_status = if new_balance == 0 {
            DebtStatus::PaidOff
        } else {
            parse_status(&status)?
        };

        sqlx::query(
            "UPDATE debts SET current_balance_minor = ?, status = ?, \
             updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(new_balance)
        .bind(new_status.as_str())
        .bind(request.debt_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_error("debt", e))?;

        let result = sqlx::query(
            "INSERT INTO debt_payments (debt_id, user_id, amount_minor, payment_date, note) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(request.debt_id)
        .bind(self.admin_id)
        .bind(request.amount_minor)
        .bind(request.payment_date)
        .bind(&request.note)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_error("debt payment", e))?;
        let payment_id = result.last_insert_id() as i64;

        tx.commit().await.map_err(|e| map_error("debt payment", e))?;

        let row: PaymentRow = sqlx::query_as(
            "SELECT id, debt_id, amount_minor, payment_date, note, created_at \
             FROM debt_payments WHERE id = ?",
        )
        .bind(payment_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_error("debt payment", e))?;
        Ok(row.into())
    }

    #[instrument(skip(self), fields(user_id = self.admin_id))]
    async fn payment_history(
        &self,
        debt_id: i64,
        limit: u32,
    ) -> Result<Vec<DebtPayment>, StoreError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(
            "SELECT p.id, p.debt_id, p.amount_minor, p.payment_date, p.note, p.created_at \
             FROM debt_payments p JOIN debts d ON d.id = p.debt_id \
             WHERE p.debt_id = ? AND d.user_id = ? \
             ORDER BY p.payment_date DESC, p.id DESC LIMIT ?",
        )
        .bind(debt_id)
        .bind(self.admin_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_error("debt payment", e))?;
        Ok(rows.into_iter().map(DebtPayment::from).collect())
    }
}
