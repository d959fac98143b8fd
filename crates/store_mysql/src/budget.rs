//! MySQL budget adapter
//!
//! Scoped to one admin's numeric id at construction; every statement
//! carries a `user_id` filter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, QueryBuilder};
use tracing::{debug, instrument};

use core_kernel::StoreError;
use domain_budget::{
    validate_request, BudgetStore, BudgetTransaction, Category, NewCategory, NewTransaction,
    TransactionQuery,
};

use crate::error::map_error;

/// Store A implementation of [`BudgetStore`]
#[derive(Debug, Clone)]
pub struct MySqlBudgetStore {
    pool: MySqlPool,
    admin_id: i64,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    category_type: Option<String>,
    monthly_limit_minor: Option<i64>,
    color: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            category_type: row.category_type,
            monthly_limit_minor: row.monthly_limit_minor,
            color: row.color,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    category_id: Option<i64>,
    amount_minor: i64,
    description: Option<String>,
    transaction_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<TransactionRow> for BudgetTransaction {
    fn from(row: TransactionRow) -> Self {
        BudgetTransaction {
            id: row.id,
            category_id: row.category_id,
            amount_minor: row.amount_minor,
            description: row.description,
            transaction_date: row.transaction_date,
            created_at: row.created_at,
        }
    }
}

impl MySqlBudgetStore {
    pub fn new(pool: MySqlPool, admin_id: i64) -> Self {
        Self { pool, admin_id }
    }

    async fn fetch_category(&self, id: i64) -> Result<Category, StoreError> {
        let row: CategoryRow = sqlx::query_as(
            "SELECT id, name, category_type, monthly_limit_minor, color, created_at \
             FROM budget_categories WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(self.admin_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_error("budget category", e))?;
        Ok(row.into())
    }

    async fn fetch_transaction(&self, id: i64) -> Result<BudgetTransaction, StoreError> {
        let row: TransactionRow = sqlx::query_as(
            "SELECT id, category_id, amount_minor, description, transaction_date, created_at \
             FROM budget_transactions WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(self.admin_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_error("budget transaction", e))?;
        Ok(row.into())
    }
}

#[async_trait]
impl BudgetStore for MySqlBudgetStore {
    #[instrument(skip(self, request), fields(user_id = self.admin_id))]
    async fn add_category(&self, request: NewCategory) -> Result<Category, StoreError> {
        validate_request(&request)?;
        let result = sqlx::query(
            "INSERT INTO budget_categories (user_id, name, category_type, monthly_limit_minor, color) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(self.admin_id)
        .bind(&request.name)
        .bind(&request.category_type)
        .bind(request.monthly_limit_minor)
        .bind(&request.color)
        .execute(&self.pool)
        .await
        .map_err(|e| map_error("budget category", e))?;

        self.fetch_category(result.last_insert_id() as i64).await
    }

    #[instrument(skip(self), fields(user_id = self.admin_id))]
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            "SELECT id, name, category_type, monthly_limit_minor, color, created_at \
             FROM budget_categories WHERE user_id = ? ORDER BY name",
        )
        .bind(self.admin_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_error("budget category", e))?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    #[instrument(skip(self, request), fields(user_id = self.admin_id))]
    async fn add_transaction(
        &self,
        request: NewTransaction,
    ) -> Result<BudgetTransaction, StoreError> {
        validate_request(&request)?;
        let transaction_date = request.transaction_date.unwrap_or_else(Utc::now);
        let result = sqlx::query(
            "INSERT INTO budget_transactions \
             (user_id, category_id, amount_minor, description, transaction_date) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(self.admin_id)
        .bind(request.category_id)
        .bind(request.amount_minor)
        .bind(&request.description)
        .bind(transaction_date)
        .execute(&self.pool)
        .await
        .map_err(|e| map_error("budget transaction", e))?;

        self.fetch_transaction(result.last_insert_id() as i64).await
    }

    #[instrument(skip(self, query), fields(user_id = self.admin_id))]
    async fn list_transactions(
        &self,
        query: TransactionQuery,
    ) -> Result<Vec<BudgetTransaction>, StoreError> {
        let mut builder = QueryBuilder::new(
            "SELECT id, category_id, amount_minor, description, transaction_date, created_at \
             FROM budget_transactions WHERE user_id = ",
        );
        builder.push_bind(self.admin_id);
        if let Some(category_id) = query.category_id {
            builder.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(start) = query.start {
            builder.push(" AND transaction_date >= ").push_bind(start);
        }
        if let Some(end) = query.end {
            builder.push(" AND transaction_date <= ").push_bind(end);
        }
        builder.push(" ORDER BY transaction_date DESC, id DESC");

        let rows: Vec<TransactionRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_error("budget transaction", e))?;
        Ok(rows.into_iter().map(BudgetTransaction::from).collect())
    }

    #[instrument(skip(self), fields(user_id = self.admin_id))]
    async fn delete_transaction(&self, transaction_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM budget_transactions WHERE id = ? AND user_id = ?")
            .bind(transaction_id)
            .bind(self.admin_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_error("budget transaction", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("budget transaction"));
        }
        debug!(transaction_id, "deleted budget transaction");
        Ok(())
    }
}
