//! PostgREST HTTP client for Store B
//!
//! One client per caller: the caller's own bearer credential rides on
//! every request so the store's row-level security applies. There is no
//! shared privileged credential anywhere on this path; the documented
//! exception is [`PostgrestClient::service_role`] below.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

use core_kernel::{Credential, StoreError};

/// Store label used in `Unavailable` errors and logs
pub const STORE_NAME: &str = "postgrest";

/// Endpoint settings for Store B
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Base URL of the PostgREST deployment, without the `/rest/v1` suffix
    pub base_url: String,
    /// Project api key sent alongside the per-caller bearer
    pub api_key: String,
}

/// A PostgREST client bound to one set of credentials
#[derive(Clone)]
pub struct PostgrestClient {
    http: reqwest::Client,
    config: PostgrestConfig,
    bearer: String,
    caller_id: Option<String>,
}

impl fmt::Debug for PostgrestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgrestClient")
            .field("base_url", &self.config.base_url)
            .field("caller_id", &self.caller_id)
            .field("bearer", &"<redacted>")
            .finish()
    }
}

impl PostgrestClient {
    /// Builds a client acting as one caller, with that caller's bearer
    pub fn for_caller(
        http: reqwest::Client,
        config: PostgrestConfig,
        canonical_id: impl Into<String>,
        credential: &Credential,
    ) -> Self {
        Self {
            http,
            config,
            bearer: credential.expose().to_string(),
            caller_id: Some(canonical_id.into()),
        }
    }

    /// Builds a client with the service-role secret, bypassing row-level
    /// security
    ///
    /// For system maintenance only. The adapter factory never constructs
    /// one of these; request-path adapters refuse a client without a
    /// caller id.
    pub fn service_role(
        http: reqwest::Client,
        config: PostgrestConfig,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            config,
            bearer: secret.into(),
            caller_id: None,
        }
    }

    /// The canonical id this client acts as, when it is a per-caller one
    pub fn caller_id(&self) -> Option<&str> {
        self.caller_id.as_deref()
    }

    pub(crate) fn require_caller(&self) -> Result<&str, StoreError> {
        self.caller_id
            .as_deref()
            .ok_or_else(|| StoreError::routing("store B adapters require a per-caller client"))
    }

    fn endpoint(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            table
        )
    }

    fn request(&self, method: Method, table: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.endpoint(table))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.bearer)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<T>, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::unavailable_from(STORE_NAME, e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, body));
        }
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::unavailable_from(STORE_NAME, e))
    }

    /// Fetches all rows matching the filters
    pub(crate) async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(String, String)],
    ) -> Result<Vec<T>, StoreError> {
        self.execute(self.request(Method::GET, table).query(query))
            .await
    }

    /// Fetches exactly one row; an empty result is `NotFound`
    pub(crate) async fn select_one<T: DeserializeOwned>(
        &self,
        entity: &'static str,
        table: &str,
        query: &[(String, String)],
    ) -> Result<T, StoreError> {
        self.select::<T>(table, query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(entity))
    }

    /// Inserts one row and returns its representation
    pub(crate) async fn insert_returning<T: DeserializeOwned, B: Serialize>(
        &self,
        entity: &'static str,
        table: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        self.execute::<T>(
            self.request(Method::POST, table)
                .header("Prefer", "return=representation")
                .json(body),
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::not_found(entity))
    }

    /// Updates matching rows; zero matches is `NotFound`
    pub(crate) async fn update<B: Serialize>(
        &self,
        entity: &'static str,
        table: &str,
        query: &[(String, String)],
        body: &B,
    ) -> Result<(), StoreError> {
        let updated: Vec<serde_json::Value> = self
            .execute(
                self.request(Method::PATCH, table)
                    .query(query)
                    .header("Prefer", "return=representation")
                    .json(body),
            )
            .await?;
        if updated.is_empty() {
            return Err(StoreError::not_found(entity));
        }
        Ok(())
    }

    /// Deletes matching rows; zero matches is `NotFound`
    pub(crate) async fn delete(
        &self,
        entity: &'static str,
        table: &str,
        query: &[(String, String)],
    ) -> Result<(), StoreError> {
        let deleted: Vec<serde_json::Value> = self
            .execute(
                self.request(Method::DELETE, table)
                    .query(query)
                    .header("Prefer", "return=representation"),
            )
            .await?;
        if deleted.is_empty() {
            return Err(StoreError::not_found(entity));
        }
        Ok(())
    }
}

fn map_status(status: StatusCode, body: String) -> StoreError {
    match status.as_u16() {
        400 | 422 => StoreError::validation(body),
        code => StoreError::unavailable(STORE_NAME, format!("http {code}: {body}")),
    }
}

/// `column=eq.value` filter
pub(crate) fn eq(column: &str, value: impl fmt::Display) -> (String, String) {
    (column.to_string(), format!("eq.{value}"))
}

/// `column=gte.value` filter
pub(crate) fn gte(column: &str, value: impl fmt::Display) -> (String, String) {
    (column.to_string(), format!("gte.{value}"))
}

/// `column=lte.value` filter
pub(crate) fn lte(column: &str, value: impl fmt::Display) -> (String, String) {
    (column.to_string(), format!("lte.{value}"))
}

/// `order=spec` parameter
pub(crate) fn order(spec: &str) -> (String, String) {
    ("order".to_string(), spec.to_string())
}

/// `limit=n` parameter
pub(crate) fn limit(n: u32) -> (String, String) {
    ("limit".to_string(), n.to_string())
}
