//! HTTP accessor for the PostgREST-style REST endpoint of the remote store.
//!
//! Every table is reached at `{base_url}/rest/v1/{table}` with the project
//! API key sent both as `apikey` and as a bearer token.

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::models::{Record, StatusRecord, Table};

use super::accessor::{DetailSource, ListSource};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path prefix of the REST interface.
const REST_PATH: &str = "rest/v1";

/// HTTP request timeout in seconds when the config does not set one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// API client for the remote store.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        let api_key = api_key.into();
        if base_url.trim().is_empty() {
            return Err(ApiError::Config("API url is empty".to_string()));
        }
        if api_key.trim().is_empty() {
            return Err(ApiError::Config("API key is empty".to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let base_url = config
            .api_url
            .clone()
            .ok_or_else(|| ApiError::Config("api_url is not set".to_string()))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ApiError::Config("api_key is not set".to_string()))?;
        Self::new(base_url, api_key, config.request_timeout())
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, table)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        let key = header::HeaderValue::from_str(&self.api_key)
            .map_err(|e| ApiError::Config(format!("API key is not a valid header: {}", e)))?;
        let bearer = header::HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| ApiError::Config(format!("API key is not a valid header: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let url = self.table_url(table);
        debug!(url = %url, ?query, "GET");

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .header(header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{} rows: {}", table, e)))
    }

    async fn patch<B: Serialize + ?Sized>(
        &self,
        table: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<(), ApiError> {
        let url = self.table_url(table);
        debug!(url = %url, ?query, "PATCH");

        let response = self
            .client
            .patch(&url)
            .headers(self.auth_headers()?)
            .header("Prefer", "return=minimal")
            .query(query)
            .json(body)
            .send()
            .await?;

        Self::check_response(response).await?;
        Ok(())
    }
}

/// Quote one value for a PostgREST filter list.
fn quote_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Render `ids` as an `in.(...)` filter.
fn in_filter<I: Display>(ids: &[I]) -> String {
    let values: Vec<String> = ids.iter().map(|id| quote_value(&id.to_string())).collect();
    format!("in.({})", values.join(","))
}

fn eq_filter<V: Display>(value: V) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl<R> ListSource<R> for ApiClient
where
    R: StatusRecord + Table + DeserializeOwned,
{
    async fn fetch_by_filter(&self, status: R::Status) -> Result<Vec<R>, ApiError> {
        self.select(
            R::TABLE,
            &[
                ("select", R::SUMMARY_COLUMNS.to_string()),
                ("status", eq_filter(status)),
                ("order", R::ORDER.to_string()),
            ],
        )
        .await
    }

    async fn update_status(&self, id: &R::Id, status: R::Status) -> Result<(), ApiError> {
        let body = serde_json::json!({ "status": status });
        self.patch(R::TABLE, &[("id", eq_filter(id))], &body).await
    }

    async fn update_status_many(&self, ids: &[R::Id], status: R::Status) -> Result<(), ApiError> {
        let body = serde_json::json!({ "status": status });
        self.patch(R::TABLE, &[("id", in_filter(ids))], &body).await
    }
}

#[async_trait]
impl<R> DetailSource<R> for ApiClient
where
    R: Record + Table + DeserializeOwned,
{
    async fn fetch_by_id(&self, id: &R::Id) -> Result<R, ApiError> {
        let rows: Vec<R> = self
            .select(
                R::TABLE,
                &[
                    ("select", "*".to_string()),
                    ("id", eq_filter(id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("{} {}", R::TABLE, id)))
    }
}
