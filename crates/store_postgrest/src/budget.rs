//! PostgREST budget adapter
//!
//! Row-level security already scopes every request to the bearer, and
//! the `user_id=eq.<uuid>` filter is sent anyway so a misconfigured
//! policy fails closed. Amounts cross the wire as decimal major units;
//! the conversion happens exactly once, in the wire structs here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use core_kernel::{to_major_units, to_minor_units, StoreError};
use domain_budget::{
    validate_request, BudgetStore, BudgetTransaction, Category, NewCategory, NewTransaction,
    TransactionQuery,
};

use crate::client::{eq, gte, lte, order, PostgrestClient, STORE_NAME};

const CATEGORIES: &str = "budget_categories";
const TRANSACTIONS: &str = "budget_transactions";

/// Store B implementation of [`BudgetStore`]
#[derive(Debug, Clone)]
pub struct PostgrestBudgetStore {
    client: PostgrestClient,
    user_id: String,
}

fn amount_from_wire(amount: Decimal) -> Result<i64, StoreError> {
    to_minor_units(amount).map_err(|e| StoreError::unavailable(STORE_NAME, e.to_string()))
}

#[derive(Debug, Deserialize)]
struct CategoryWire {
    id: i64,
    name: String,
    #[serde(rename = "type")]
    category_type: Option<String>,
    monthly_limit: Option<Decimal>,
    color: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CategoryWire> for Category {
    type Error = StoreError;

    fn try_from(wire: CategoryWire) -> Result<Self, Self::Error> {
        Ok(Category {
            id: wire.id,
            name: wire.name,
            category_type: wire.category_type,
            monthly_limit_minor: wire.monthly_limit.map(amount_from_wire).transpose()?,
            color: wire.color,
            created_at: wire.created_at,
        })
    }
}

#[derive(Debug, Serialize)]
struct NewCategoryWire<'a> {
    user_id: &'a str,
    name: &'a str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    category_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    monthly_limit: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TransactionWire {
    id: i64,
    category_id: Option<i64>,
    amount: Decimal,
    description: Option<String>,
    transaction_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionWire> for BudgetTransaction {
    type Error = StoreError;

    fn try_from(wire: TransactionWire) -> Result<Self, Self::Error> {
        Ok(BudgetTransaction {
            id: wire.id,
            category_id: wire.category_id,
            amount_minor: amount_from_wire(wire.amount)?,
            description: wire.description,
            transaction_date: wire.transaction_date,
            created_at: wire.created_at,
        })
    }
}

#[derive(Debug, Serialize)]
struct NewTransactionWire<'a> {
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<i64>,
    amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    transaction_date: DateTime<Utc>,
}

impl PostgrestBudgetStore {
    /// Refuses a client without a caller id; Store B request paths are
    /// always per-caller
    pub fn new(client: PostgrestClient) -> Result<Self, StoreError> {
        let user_id = client.require_caller()?.to_string();
        Ok(Self { client, user_id })
    }
}

#[async_trait]
impl BudgetStore for PostgrestBudgetStore {
    #[instrument(skip(self, request), fields(user_id = %self.user_id))]
    async fn add_category(&self, request: NewCategory) -> Result<Category, StoreError> {
        validate_request(&request)?;
        let wire: CategoryWire = self
            .client
            .insert_returning(
                "budget category",
                CATEGORIES,
                &NewCategoryWire {
                    user_id: &self.user_id,
                    name: &request.name,
                    category_type: request.category_type.as_deref(),
                    monthly_limit: request.monthly_limit_minor.map(to_major_units),
                    color: request.color.as_deref(),
                },
            )
            .await?;
        wire.try_into()
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows: Vec<CategoryWire> = self
            .client
            .select(
                CATEGORIES,
                &[eq("user_id", &self.user_id), order("name.asc")],
            )
            .await?;
        rows.into_iter().map(Category::try_from).collect()
    }

    #[instrument(skip(self, request), fields(user_id = %self.user_id))]
    async fn add_transaction(
        &self,
        request: NewTransaction,
    ) -> Result<BudgetTransaction, StoreError> {
        validate_request(&request)?;
        let wire: TransactionWire = self
            .client
            .insert_returning(
                "budget transaction",
                TRANSACTIONS,
                &NewTransactionWire {
                    user_id: &self.user_id,
                    category_id: request.category_id,
                    amount: to_major_units(request.amount_minor),
                    description: request.description.as_deref(),
                    transaction_date: request.transaction_date.unwrap_or_else(Utc::now),
                },
            )
            .await?;
        wire.try_into()
    }

    #[instrument(skip(self, query), fields(user_id = %self.user_id))]
    async fn list_transactions(
        &self,
        query: TransactionQuery,
    ) -> Result<Vec<BudgetTransaction>, StoreError> {
        let mut params = vec![eq("user_id", &self.user_id)];
        if let Some(category_id) = query.category_id {
            params.push(eq("category_id", category_id));
        }
        if let Some(start) = query.start {
            params.push(gte("transaction_date", start.to_rfc3339()));
        }
        if let Some(end) = query.end {
            params.push(lte("transaction_date", end.to_rfc3339()));
        }
        params.push(order("transaction_date.desc"));

        let rows: Vec<TransactionWire> = self.client.select(TRANSACTIONS, &params).await?;
        rows.into_iter().map(BudgetTransaction::try_from).collect()
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn delete_transaction(&self, transaction_id: i64) -> Result<(), StoreError> {
        self.client
            .delete(
                "budget transaction",
                TRANSACTIONS,
                &[eq("id", transaction_id), eq("user_id", &self.user_id)],
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn absent_fields_are_omitted_not_nulled() {
        let wire = NewCategoryWire {
            user_id: "a2f6f2c1-0000-4000-8000-000000000000",
            name: "Groceries",
            category_type: None,
            monthly_limit: None,
            color: None,
        };
        let json = serde_json::to_value(&wire).unwrap();
        assert!(json.get("monthly_limit").is_none());
        assert!(json.get("type").is_none());
        assert!(json.get("color").is_none());
        assert_eq!(json["name"], "Groceries");
    }

    #[test]
    fn category_type_uses_the_physical_type_column() {
        let wire = NewCategoryWire {
            user_id: "a2f6f2c1-0000-4000-8000-000000000000",
            name: "Salary",
            category_type: Some("income"),
            monthly_limit: Some(dec!(500.00)),
            color: None,
        };
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["type"], "income");
        assert!(json.get("category_type").is_none());
    }

    #[test]
    fn wire_amounts_convert_to_minor_units_once() {
        let wire: TransactionWire = serde_json::from_value(serde_json::json!({
            "id": 5,
            "category_id": null,
            "amount": 9.99,
            "description": "Netflix",
            "transaction_date": "2024-03-05T00:00:00Z",
            "created_at": "2024-03-05T00:00:01Z"
        }))
        .unwrap();
        let canonical = BudgetTransaction::try_from(wire).unwrap();
        assert_eq!(canonical.amount_minor, 999);
        assert_eq!(canonical.category_id, None);
    }
}
