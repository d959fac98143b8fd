//! Budget store contract
//!
//! One trait, two concrete implementations (relational Store A, REST
//! Store B) plus the in-memory mock below for tests. Every operation is
//! scoped to the caller the adapter was constructed for; the caller id
//! never appears in the signatures.

use async_trait::async_trait;

use core_kernel::StoreError;

use crate::model::{BudgetTransaction, Category, NewCategory, NewTransaction, TransactionQuery};

/// Backend-independent budget operations
#[async_trait]
pub trait BudgetStore: Send + Sync {
    /// Creates a category for the caller
    async fn add_category(&self, request: NewCategory) -> Result<Category, StoreError>;

    /// Lists the caller's categories
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    /// Records a transaction for the caller
    async fn add_transaction(
        &self,
        request: NewTransaction,
    ) -> Result<BudgetTransaction, StoreError>;

    /// Lists the caller's transactions, newest first
    async fn list_transactions(
        &self,
        query: TransactionQuery,
    ) -> Result<Vec<BudgetTransaction>, StoreError>;

    /// Deletes a transaction; unknown or unowned ids are `NotFound`
    async fn delete_transaction(&self, transaction_id: i64) -> Result<(), StoreError>;
}

/// In-memory mock for tests without a live store
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use crate::model::validate_request;
    use chrono::Utc;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default)]
    pub struct MockBudgetStore {
        categories: Arc<RwLock<Vec<Category>>>,
        transactions: Arc<RwLock<Vec<BudgetTransaction>>>,
        next_id: AtomicI64,
    }

    impl MockBudgetStore {
        pub fn new() -> Self {
            Self {
                next_id: AtomicI64::new(1),
                ..Default::default()
            }
        }

        fn allocate_id(&self) -> i64 {
            self.next_id.fetch_add(1, Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl BudgetStore for MockBudgetStore {
        async fn add_category(&self, request: NewCategory) -> Result<Category, StoreError> {
            validate_request(&request)?;
            let category = Category {
                id: self.allocate_id(),
                name: request.name,
                category_type: request.category_type,
                monthly_limit_minor: request.monthly_limit_minor,
                color: request.color,
                created_at: Utc::now(),
            };
            self.categories.write().await.push(category.clone());
            Ok(category)
        }

        async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
            Ok(self.categories.read().await.clone())
        }

        async fn add_transaction(
            &self,
            request: NewTransaction,
        ) -> Result<BudgetTransaction, StoreError> {
            validate_request(&request)?;
            let now = Utc::now();
            let transaction = BudgetTransaction {
                id: self.allocate_id(),
                category_id: request.category_id,
                amount_minor: request.amount_minor,
                description: request.description,
                transaction_date: request.transaction_date.unwrap_or(now),
                created_at: now,
            };
            self.transactions.write().await.push(transaction.clone());
            Ok(transaction)
        }

        async fn list_transactions(
            &self,
            query: TransactionQuery,
        ) -> Result<Vec<BudgetTransaction>, StoreError> {
            let transactions = self.transactions.read().await;
            let mut matching: Vec<_> = transactions
                .iter()
                .filter(|t| {
                    if let Some(category_id) = query.category_id {
                        if t.category_id != Some(category_id) {
                            return false;
                        }
                    }
                    if let Some(start) = query.start {
                        if t.transaction_date < start {
                            return false;
                        }
                    }
                    if let Some(end) = query.end {
                        if t.transaction_date > end {
                            return false;
                        }
                    }
                    true
                })
                .cloned()
                .collect();
            matching.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));
            Ok(matching)
        }

        async fn delete_transaction(&self, transaction_id: i64) -> Result<(), StoreError> {
            let mut transactions = self.transactions.write().await;
            let before = transactions.len();
            transactions.retain(|t| t.id != transaction_id);
            if transactions.len() == before {
                return Err(StoreError::not_found("budget transaction"));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockBudgetStore;
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn category_round_trip() {
        let store = MockBudgetStore::new();
        let created = store
            .add_category(NewCategory::named("Streaming"))
            .await
            .unwrap();
        let listed = store.list_categories().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
    }

    #[tokio::test]
    async fn transaction_window_filter() {
        let store = MockBudgetStore::new();
        let now = Utc::now();
        for days_ago in [1i64, 40, 200] {
            store
                .add_transaction(NewTransaction {
                    category_id: None,
                    amount_minor: 999,
                    description: Some("netflix".to_string()),
                    transaction_date: Some(now - Duration::days(days_ago)),
                })
                .await
                .unwrap();
        }

        let recent = store
            .list_transactions(TransactionQuery::between(now - Duration::days(60), now))
            .await
            .unwrap();
        assert_eq!(recent.len(), 2);
        // Newest first
        assert!(recent[0].transaction_date > recent[1].transaction_date);
    }

    #[tokio::test]
    async fn delete_unknown_transaction_is_not_found() {
        let store = MockBudgetStore::new();
        let error = store.delete_transaction(99).await.unwrap_err();
        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_the_store() {
        let store = MockBudgetStore::new();
        let result = store
            .add_transaction(NewTransaction {
                category_id: None,
                amount_minor: -5,
                description: None,
                transaction_date: None,
            })
            .await;
        assert!(result.is_err());
        assert!(store.list_transactions(TransactionQuery::default()).await.unwrap().is_empty());
    }
}
