//! Adapter for the hosted relational table store (PostgREST-style API:
//! table name, equality filters, range pagination).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::store::Row;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid backend configuration: {0}")]
    Config(String),
}

/// Row-level operations the sync policy needs from a remote store. The REST
/// implementation below is the production backend; tests substitute a
/// scripted one.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// One page of a full-table read, ordered by `order_by`.
    async fn select_range(
        &self,
        table: &str,
        order_by: &str,
        ascending: bool,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>, RemoteError>;

    /// Single row matching `col = value`, if any.
    async fn select_one(
        &self,
        table: &str,
        col: &str,
        value: &Value,
    ) -> Result<Option<Row>, RemoteError>;

    /// Insert rows, returning the stored representations (server-assigned
    /// identifiers included).
    async fn insert(&self, table: &str, rows: &[Row]) -> Result<Vec<Row>, RemoteError>;

    async fn update_where(
        &self,
        table: &str,
        col: &str,
        value: &Value,
        patch: &Row,
    ) -> Result<(), RemoteError>;

    async fn delete_where(&self, table: &str, col: &str, value: &Value)
        -> Result<(), RemoteError>;

    /// Insert-or-replace keyed on `conflict_col`.
    async fn upsert(&self, table: &str, conflict_col: &str, row: &Row) -> Result<(), RemoteError>;

    async fn count_where(&self, table: &str, col: &str, value: &Value)
        -> Result<u64, RemoteError>;
}

/// PostgREST client over reqwest. Authentication is the hosted store's
/// anon-key scheme: the key rides both the `apikey` header and a bearer
/// token.
pub struct RestBackend {
    base_url: String,
    client: reqwest::Client,
}

impl RestBackend {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        let key_value = HeaderValue::from_str(api_key)
            .map_err(|_| RemoteError::Config("API key is not a valid header value".into()))?;
        headers.insert("apikey", key_value);
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| RemoteError::Config("API key is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Equality filter in PostgREST syntax (`col=eq.value`).
    fn eq_filter(value: &Value) -> String {
        match value {
            Value::String(s) => format!("eq.{}", s),
            other => format!("eq.{}", other),
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl RemoteBackend for RestBackend {
    async fn select_range(
        &self,
        table: &str,
        order_by: &str,
        ascending: bool,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>, RemoteError> {
        let direction = if ascending { "asc" } else { "desc" };
        debug!(table, order_by, offset, limit, "remote select_range");
        let response = self
            .client
            .get(self.table_url(table))
            .query(&[
                ("select", "*".to_string()),
                ("order", format!("{}.{}", order_by, direction)),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;
        let rows = Self::check(response).await?.json::<Vec<Row>>().await?;
        Ok(rows)
    }

    async fn select_one(
        &self,
        table: &str,
        col: &str,
        value: &Value,
    ) -> Result<Option<Row>, RemoteError> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&[
                ("select", "*".to_string()),
                (col, Self::eq_filter(value)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;
        let mut rows = Self::check(response).await?.json::<Vec<Row>>().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn insert(&self, table: &str, rows: &[Row]) -> Result<Vec<Row>, RemoteError> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;
        let stored = Self::check(response).await?.json::<Vec<Row>>().await?;
        Ok(stored)
    }

    async fn update_where(
        &self,
        table: &str,
        col: &str,
        value: &Value,
        patch: &Row,
    ) -> Result<(), RemoteError> {
        let response = self
            .client
            .patch(self.table_url(table))
            .query(&[(col, Self::eq_filter(value))])
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_where(
        &self,
        table: &str,
        col: &str,
        value: &Value,
    ) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.table_url(table))
            .query(&[(col, Self::eq_filter(value))])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn upsert(&self, table: &str, conflict_col: &str, row: &Row) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.table_url(table))
            .query(&[("on_conflict", conflict_col)])
            .header(
                "Prefer",
                "resolution=merge-duplicates,return=minimal",
            )
            .json(std::slice::from_ref(row))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn count_where(
        &self,
        table: &str,
        col: &str,
        value: &Value,
    ) -> Result<u64, RemoteError> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&[
                ("select", "id".to_string()),
                (col, Self::eq_filter(value)),
                ("limit", "1".to_string()),
            ])
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = Self::check(response).await?;
        // Content-Range: "0-0/42" (or "*/0" when empty)
        let count = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next())
            .and_then(|total| total.parse::<u64>().ok());
        match count {
            Some(n) => Ok(n),
            // Servers without exact counting enabled fall back to row presence
            None => {
                let rows = response.json::<Vec<Row>>().await?;
                Ok(rows.len() as u64)
            }
        }
    }
}
