//! PostgREST debt adapter
//!
//! The canonical `name` field travels as the physical `debt_name` column
//! and the interest rate as a decimal percent; both mappings are fixed
//! per entity in the wire structs, not inferred from casing. Balance and
//! payment writes are two REST calls, not a transaction; a payment row
//! without its balance effect self-corrects on the next write.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use core_kernel::{to_major_units, to_minor_units, StoreError};
use domain_debt::{
    validate_request, Debt, DebtPayment, DebtStatus, DebtStore, DebtUpdate, NewDebt,
    NewDebtPayment,
};

use crate::client::{eq, limit, order, PostgrestClient, STORE_NAME};

const DEBTS: &str = "debts";
const PAYMENTS: &str = "debt_payments";

/// Store B implementation of [`DebtStore`]
#[derive(Debug, Clone)]
pub struct PostgrestDebtStore {
    client: PostgrestClient,
    user_id: String,
}

fn amount_from_wire(amount: Decimal) -> Result<i64, StoreError> {
    to_minor_units(amount).map_err(|e| StoreError::unavailable(STORE_NAME, e.to_string()))
}

fn status_from_wire(value: &str) -> Result<DebtStatus, StoreError> {
    value
        .parse()
        .map_err(|_| StoreError::unavailable(STORE_NAME, format!("unexpected debt status '{value}'")))
}

#[derive(Debug, Deserialize)]
struct DebtWire {
    id: i64,
    debt_name: String,
    debt_type: String,
    original_amount: Decimal,
    current_balance: Decimal,
    interest_rate: Decimal,
    minimum_payment: Decimal,
    due_date: Option<NaiveDate>,
    due_day: Option<u32>,
    status: String,
    creditor: Option<String>,
    account_number: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DebtWire> for Debt {
    type Error = StoreError;

    fn try_from(wire: DebtWire) -> Result<Self, Self::Error> {
        Ok(Debt {
            id: wire.id,
            name: wire.debt_name,
            debt_type: wire.debt_type,
            original_amount_minor: amount_from_wire(wire.original_amount)?,
            current_balance_minor: amount_from_wire(wire.current_balance)?,
            interest_rate_bp: amount_from_wire(wire.interest_rate)?,
            minimum_payment_minor: amount_from_wire(wire.minimum_payment)?,
            due_date: wire.due_date,
            due_day: wire.due_day,
            status: status_from_wire(&wire.status)?,
            creditor: wire.creditor,
            account_number: wire.account_number,
            notes: wire.notes,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }
}

#[derive(Debug, Serialize)]
struct NewDebtWire<'a> {
    user_id: &'a str,
    debt_name: &'a str,
    debt_type: &'a str,
    original_amount: Decimal,
    current_balance: Decimal,
    interest_rate: Decimal,
    minimum_payment: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    creditor: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_number: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DebtUpdateWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    debt_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interest_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minimum_payment: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    creditor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

#[derive(Debug, Serialize)]
struct BalanceWire {
    current_balance: Decimal,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct StatusWire {
    status: &'static str,
}

#[derive(Debug, Deserialize)]
struct PaymentWire {
    id: i64,
    debt_id: i64,
    amount: Decimal,
    payment_date: NaiveDate,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentWire> for DebtPayment {
    type Error = StoreError;

    fn try_from(wire: PaymentWire) -> Result<Self, Self::Error> {
        Ok(DebtPayment {
            id: wire.id,
            debt_id: wire.debt_id,
            amount_minor: amount_from_wire(wire.amount)?,
            payment_date: wire.payment_date,
            note: wire.note,
            created_at: wire.created_at,
        })
    }
}

#[derive(Debug, Serialize)]
struct NewPaymentWire<'a> {
    user_id: &'a str,
    debt_id: i64,
    amount: Decimal,
    payment_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

impl PostgrestDebtStore {
    /// Refuses a client without a caller id; Store B request paths are
    /// always per-caller
    pub fn new(client: PostgrestClient) -> Result<Self, StoreError> {
        let user_id = client.require_caller()?.to_string();
        Ok(Self { client, user_id })
    }

    fn owned(&self, debt_id: i64) -> Vec<(String, String)> {
        vec![eq("id", debt_id), eq("user_id", &self.user_id)]
    }
}

#[async_trait]
impl DebtStore for PostgrestDebtStore {
    #[instrument(skip(self, request), fields(user_id = %self.user_id))]
    async fn add_debt(&self, request: NewDebt) -> Result<Debt, StoreError> {
        validate_request(&request)?;
        let wire: DebtWire = self
            .client
            .insert_returning(
                "debt",
                DEBTS,
                &NewDebtWire {
                    user_id: &self.user_id,
                    debt_name: &request.name,
                    debt_type: &request.debt_type,
                    original_amount: to_major_units(request.original_amount_minor),
                    current_balance: to_major_units(request.current_balance_minor),
                    interest_rate: to_major_units(request.interest_rate_bp),
                    minimum_payment: to_major_units(request.minimum_payment_minor),
                    due_date: request.due_date,
                    due_day: request.due_day,
                    creditor: request.creditor.as_deref(),
                    account_number: request.account_number.as_deref(),
                    notes: request.notes.as_deref(),
                },
            )
            .await?;
        wire.try_into()
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn list_debts(&self, include_inactive: bool) -> Result<Vec<Debt>, StoreError> {
        let mut params = vec![eq("user_id", &self.user_id)];
        if !include_inactive {
            params.push(eq("status", "active"));
        }
        params.push(order("created_at.asc"));

        let rows: Vec<DebtWire> = self.client.select(DEBTS, &params).await?;
        rows.into_iter().map(Debt::try_from).collect()
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn get_debt(&self, debt_id: i64) -> Result<Debt, StoreError> {
        let wire: DebtWire = self
            .client
            .select_one("debt", DEBTS, &self.owned(debt_id))
            .await?;
        wire.try_into()
    }

    #[instrument(skip(self, update), fields(user_id = %self.user_id))]
    async fn update_debt(&self, debt_id: i64, update: DebtUpdate) -> Result<(), StoreError> {
        if update.is_empty() {
            return Err(StoreError::validation("no fields to update"));
        }
        let wire = DebtUpdateWire {
            debt_name: update.name,
            current_balance: update.current_balance_minor.map(to_major_units),
            interest_rate: update.interest_rate_bp.map(to_major_units),
            minimum_payment: update.minimum_payment_minor.map(to_major_units),
            due_date: update.due_date,
            due_day: update.due_day,
            creditor: update.creditor,
            notes: update.notes,
        };
        self.client
            .update("debt", DEBTS, &self.owned(debt_id), &wire)
            .await
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn close_debt(&self, debt_id: i64) -> Result<(), StoreError> {
        self.client
            .update(
                "debt",
                DEBTS,
                &self.owned(debt_id),
                &StatusWire {
                    status: DebtStatus::Closed.as_str(),
                },
            )
            .await
    }

    #[instrument(skip(self, request), fields(user_id = %self.user_id))]
    async fn record_payment(&self, request: NewDebtPayment) -> Result<DebtPayment, StoreError> {
        validate_request(&request)?;
        let debt = self.get_debt(request.debt_id).await?;

        let new_balance = (debt.current_balance_minor - request.amount_minor).max(0);
        let new_status = if new_balance == 0 {
            DebtStatus::PaidOff
        } else {
            debt.status
        };
        self.client
            .update(
                "debt",
                DEBTS,
                &self.owned(request.debt_id),
                &BalanceWire {
                    current_balance: to_major_units(new_balance),
                    status: new_status.as_str(),
                },
            )
            .await?;

        let wire: PaymentWire = self
            .client
            .insert_returning(
                "debt payment",
                PAYMENTS,
                &NewPaymentWire {
                    user_id: &self.user_id,
                    debt_id: request.debt_id,
                    amount: to_major_units(request.amount_minor),
                    payment_date: request.payment_date,
                    note: request.note.as_deref(),
                },
            )
            .await?;
        wire.try_into()
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn payment_history(
        &self,
        debt_id: i64,
        limit_count: u32,
    ) -> Result<Vec<DebtPayment>, StoreError> {
        let rows: Vec<PaymentWire> = self
            .client
            .select(
                PAYMENTS,
                &[
                    eq("debt_id", debt_id),
                    eq("user_id", &self.user_id),
                    order("payment_date.desc"),
                    limit(limit_count),
                ],
            )
            .await?;
        rows.into_iter().map(DebtPayment::try_from).collect()
    }
}
