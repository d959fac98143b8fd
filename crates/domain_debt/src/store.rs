//! Debt store contract
//!
//! Adapters are constructed for exactly one caller; a `debt_id` belonging
//! to another caller behaves identically to one that does not exist.

use async_trait::async_trait;

use core_kernel::StoreError;

use crate::debt::{Debt, DebtPayment, DebtUpdate, NewDebt, NewDebtPayment};

/// Backend-independent debt operations
#[async_trait]
pub trait DebtStore: Send + Sync {
    /// Creates a debt for the caller
    async fn add_debt(&self, request: NewDebt) -> Result<Debt, StoreError>;

    /// Lists the caller's debts; inactive ones only when asked for
    async fn list_debts(&self, include_inactive: bool) -> Result<Vec<Debt>, StoreError>;

    /// Fetches one debt; unknown or unowned ids are `NotFound`
    async fn get_debt(&self, debt_id: i64) -> Result<Debt, StoreError>;

    /// Partial update; an all-empty update is a `Validation` error
    async fn update_debt(&self, debt_id: i64, update: DebtUpdate) -> Result<(), StoreError>;

    /// Soft delete: the debt stays on record with status `Closed`
    async fn close_debt(&self, debt_id: i64) -> Result<(), StoreError>;

    /// Records a payment and reduces the balance; a balance reaching zero
    /// flips the status to `PaidOff`
    async fn record_payment(&self, request: NewDebtPayment) -> Result<DebtPayment, StoreError>;

    /// Payment history for one debt, newest first
    async fn payment_history(
        &self,
        debt_id: i64,
        limit: u32,
    ) -> Result<Vec<DebtPayment>, StoreError>;
}

/// In-memory mock for tests without a live store
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use crate::debt::{validate_request, DebtStatus};
    use chrono::Utc;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default)]
    pub struct MockDebtStore {
        debts: Arc<RwLock<Vec<Debt>>>,
        payments: Arc<RwLock<Vec<DebtPayment>>>,
        next_id: AtomicI64,
    }

    impl MockDebtStore {
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
    impl DebtStore for MockDebtStore {
        async fn add_debt(&self, request: NewDebt) -> Result<Debt, StoreError> {
            validate_request(&request)?;
            let now = Utc::now();
            let debt = Debt {
                id: self.allocate_id(),
                name: request.name,
                debt_type: request.debt_type,
                original_amount_minor: request.original_amount_minor,
                current_balance_minor: request.current_balance_minor,
                interest_rate_bp: request.interest_rate_bp,
                minimum_payment_minor: request.minimum_payment_minor,
                due_date: request.due_date,
                due_day: request.due_day,
                status: DebtStatus::Active,
                creditor: request.creditor,
                account_number: request.account_number,
                notes: request.notes,
                created_at: now,
                updated_at: now,
            };
            self.debts.write().await.push(debt.clone());
            Ok(debt)
        }

        async fn list_debts(&self, include_inactive: bool) -> Result<Vec<Debt>, StoreError> {
            Ok(self
                .debts
                .read()
                .await
                .iter()
                .filter(|d| include_inactive || d.status == DebtStatus::Active)
                .cloned()
                .collect())
        }

        async fn get_debt(&self, debt_id: i64) -> Result<Debt, StoreError> {
            self.debts
                .read()
                .await
                .iter()
                .find(|d| d.id == debt_id)
                .cloned()
                .ok_or_else(|| StoreError::not_found("debt"))
        }

        async fn update_debt(&self, debt_id: i64, update: DebtUpdate) -> Result<(), StoreError> {
            if update.is_empty() {
                return Err(StoreError::validation("no fields to update"));
            }
            let mut debts = self.debts.write().await;
            let debt = debts
                .iter_mut()
                .find(|d| d.id == debt_id)
                .ok_or_else(|| StoreError::not_found("debt"))?;
            if let Some(name) = update.name {
                debt.name = name;
            }
            if let Some(balance) = update.current_balance_minor {
                debt.current_balance_minor = balance;
            }
            if let Some(rate) = update.interest_rate_bp {
                debt.interest_rate_bp = rate;
            }
            if let Some(minimum) = update.minimum_payment_minor {
                debt.minimum_payment_minor = minimum;
            }
            if let Some(due_date) = update.due_date {
                debt.due_date = Some(due_date);
            }
            if let Some(due_day) = update.due_day {
                debt.due_day = Some(due_day);
            }
            if let Some(creditor) = update.creditor {
                debt.creditor = Some(creditor);
            }
            if let Some(notes) = update.notes {
                debt.notes = Some(notes);
            }
            debt.updated_at = Utc::now();
            Ok(())
        }

        async fn close_debt(&self, debt_id: i64) -> Result<(), StoreError> {
            let mut debts = self.debts.write().await;
            let debt = debts
                .iter_mut()
                .find(|d| d.id == debt_id)
                .ok_or_else(|| StoreError::not_found("debt"))?;
            debt.status = DebtStatus::Closed;
            debt.updated_at = Utc::now();
            Ok(())
        }

        async fn record_payment(
            &self,
            request: NewDebtPayment,
        ) -> Result<DebtPayment, StoreError> {
            validate_request(&request)?;
            let mut debts = self.debts.write().await;
            let debt = debts
                .iter_mut()
                .find(|d| d.id == request.debt_id)
                .ok_or_else(|| StoreError::not_found("debt"))?;

            debt.current_balance_minor =
                (debt.current_balance_minor - request.amount_minor).max(0);
            if debt.current_balance_minor == 0 {
                debt.status = DebtStatus::PaidOff;
            }
            debt.updated_at = Utc::now();

            let payment = DebtPayment {
                id: self.allocate_id(),
                debt_id: request.debt_id,
                amount_minor: request.amount_minor,
                payment_date: request.payment_date,
                note: request.note,
                created_at: Utc::now(),
            };
            self.payments.write().await.push(payment.clone());
            Ok(payment)
        }

        async fn payment_history(
            &self,
            debt_id: i64,
            limit: u32,
        ) -> Result<Vec<DebtPayment>, StoreError> {
            let mut payments: Vec<_> = self
                .payments
                .read()
                .await
                .iter()
                .filter(|p| p.debt_id == debt_id)
                .cloned()
                .collect();
            payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
            payments.truncate(limit as usize);
            Ok(payments)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockDebtStore;
    use super::*;
    use crate::debt::DebtStatus;
    use chrono::NaiveDate;

    fn new_debt(balance_minor: i64) -> NewDebt {
        NewDebt {
            name: "Visa".to_string(),
            debt_type: "credit_card".to_string(),
            original_amount_minor: 250_000,
            current_balance_minor: balance_minor,
            interest_rate_bp: 1899,
            minimum_payment_minor: 3_500,
            due_date: None,
            due_day: Some(15),
            creditor: None,
            account_number: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn close_is_a_soft_delete() {
        let store = MockDebtStore::new();
        let debt = store.add_debt(new_debt(100_000)).await.unwrap();

        store.close_debt(debt.id).await.unwrap();

        assert!(store.list_debts(false).await.unwrap().is_empty());
        let all = store.list_debts(true).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, DebtStatus::Closed);
    }

    #[tokio::test]
    async fn payment_reduces_balance_and_pays_off() {
        let store = MockDebtStore::new();
        let debt = store.add_debt(new_debt(5_000)).await.unwrap();

        store
            .record_payment(NewDebtPayment {
                debt_id: debt.id,
                amount_minor: 6_000,
                payment_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                note: None,
            })
            .await
            .unwrap();

        let updated = store.get_debt(debt.id).await.unwrap();
        assert_eq!(updated.current_balance_minor, 0);
        assert_eq!(updated.status, DebtStatus::PaidOff);
    }

    #[tokio::test]
    async fn empty_update_is_a_validation_error() {
        let store = MockDebtStore::new();
        let debt = store.add_debt(new_debt(100_000)).await.unwrap();
        let error = store
            .update_debt(debt.id, DebtUpdate::default())
            .await
            .unwrap_err();
        assert!(!error.is_not_found());
        assert!(matches!(error, StoreError::Validation { .. }));
    }

    #[tokio::test]
    async fn unknown_debt_is_not_found() {
        let store = MockDebtStore::new();
        assert!(store.get_debt(404).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn payment_history_is_newest_first_and_limited() {
        let store = MockDebtStore::new();
        let debt = store.add_debt(new_debt(100_000)).await.unwrap();
        for day in 1..=5 {
            store
                .record_payment(NewDebtPayment {
                    debt_id: debt.id,
                    amount_minor: 1_000,
                    payment_date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
                    note: None,
                })
                .await
                .unwrap();
        }

        let history = store.payment_history(debt.id, 3).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].payment_date.to_string(), "2024-05-05");
    }
}
