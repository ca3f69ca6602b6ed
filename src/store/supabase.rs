//! Supabase backend speaking PostgREST over HTTP.

use super::{validate_identifier, Backend, Record};
use crate::error::{LisearchError, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Backend for a hosted Supabase project.
pub struct SupabaseBackend {
    http: reqwest::Client,
    base: Url,
    key: String,
}

impl SupabaseBackend {
    /// Create a backend for the project at `url`, authenticating with `key`.
    pub fn new(url: &str, key: &str, timeout: Duration) -> Result<Self> {
        let mut base = url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)?;

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base,
            key: key.to_string(),
        })
    }

    /// REST endpoint for a table or RPC path.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(&format!("rest/v1/{}", path))?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(LisearchError::Backend(format!("{}: {}", status, body)))
    }

    async fn read_rows(response: Response) -> Result<Vec<Record>> {
        let response = Self::check(response).await?;
        let value: Value = response.json().await?;
        rows_from_value(value)
    }
}

/// Normalize a PostgREST payload into rows.
pub(crate) fn rows_from_value(value: Value) -> Result<Vec<Record>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(row) => Ok(vec![row]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(LisearchError::Backend(format!(
                    "Expected a row object, got: {}",
                    other
                ))),
            })
            .collect(),
        other => Err(LisearchError::Backend(format!(
            "Unexpected response payload: {}",
            other
        ))),
    }
}

#[async_trait]
impl Backend for SupabaseBackend {
    fn name(&self) -> &str {
        "supabase"
    }

    #[instrument(skip(self, params))]
    async fn call(&self, procedure: &str, params: &Value) -> Result<Vec<Record>> {
        validate_identifier(procedure)?;
        let url = self.endpoint(&format!("rpc/{}", procedure))?;
        debug!("POST {}", url);

        let response = self
            .authorized(self.http.post(url))
            .json(params)
            .send()
            .await?;
        Self::read_rows(response).await
    }

    #[instrument(skip(self))]
    async fn select(&self, table: &str, columns: &[&str]) -> Result<Vec<Record>> {
        validate_identifier(table)?;
        for column in columns {
            validate_identifier(column)?;
        }
        let url = self.endpoint(table)?;
        let select = if columns.is_empty() {
            "*".to_string()
        } else {
            columns.join(",")
        };

        let response = self
            .authorized(self.http.get(url))
            .query(&[("select", select)])
            .send()
            .await?;
        Self::read_rows(response).await
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn insert(&self, table: &str, rows: &[Record]) -> Result<Vec<Record>> {
        validate_identifier(table)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.endpoint(table)?;

        let response = self
            .authorized(self.http.post(url))
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;
        Self::read_rows(response).await
    }

    #[instrument(skip(self))]
    async fn clear(&self, table: &str) -> Result<()> {
        validate_identifier(table)?;
        let url = self.endpoint(table)?;

        let response = self
            .authorized(self.http.delete(url))
            .query(&[("id", "neq.0")])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend(url: &str) -> SupabaseBackend {
        SupabaseBackend::new(url, "key", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoints() {
        let b = backend("https://abc.supabase.co");
        assert_eq!(
            b.endpoint("rpc/get_low_stock_products").unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/rpc/get_low_stock_products"
        );

        let b = backend("https://abc.supabase.co/");
        assert_eq!(
            b.endpoint("categories").unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/categories"
        );
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(SupabaseBackend::new("not a url", "key", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_rows_from_value() {
        let rows = rows_from_value(json!([{"a": 1}, {"b": 2}])).unwrap();
        assert_eq!(rows.len(), 2);

        let rows = rows_from_value(json!({"product_id": 7})).unwrap();
        assert_eq!(rows[0]["product_id"], json!(7));

        assert!(rows_from_value(Value::Null).unwrap().is_empty());
        assert!(rows_from_value(json!([1, 2])).is_err());
        assert!(rows_from_value(json!("text")).is_err());
    }

    #[tokio::test]
    async fn test_bad_procedure_name_fails_before_network() {
        let b = backend("https://abc.supabase.co");
        let err = b.call("drop table", &json!({})).await.unwrap_err();
        assert!(err.to_string().contains("Invalid identifier"));
    }
}
