//! Store data access for LiSearch.
//!
//! Every query the assistant can run maps to one named procedure on a
//! [`Backend`]. [`StoreQueries`] resolves parameter defaults and turns
//! backend faults into empty results, so callers only ever see "no data".

mod seed;
mod sqlite;
mod supabase;

pub use seed::{seed_database, SeedOptions, SeedReport, PRODUCT_CATALOG};
pub use sqlite::SqliteBackend;
pub use supabase::SupabaseBackend;

use crate::error::{LisearchError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// A single row returned by the backend, keyed by column name.
pub type Record = Map<String, Value>;

/// Default number of rows for top-seller, trending and transaction queries.
pub const DEFAULT_LIMIT: i64 = 10;
/// Default number of rows for the low-stock query.
pub const DEFAULT_LOW_STOCK_LIMIT: i64 = 20;
/// Default lookback window for sales queries.
pub const DEFAULT_SALES_DAYS: i64 = 30;
/// Default window for the trending query.
pub const DEFAULT_TRENDING_DAYS: i64 = 7;

/// Tables in the order they must be cleared (children first).
pub const TABLES: [&str; 5] = [
    "sales_line_items",
    "sales_transactions",
    "inventory",
    "products",
    "categories",
];

/// Trait for store database backends.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Call a named remote procedure with a JSON object of parameters.
    async fn call(&self, procedure: &str, params: &Value) -> Result<Vec<Record>>;

    /// Read the given columns of every row in a table.
    async fn select(&self, table: &str, columns: &[&str]) -> Result<Vec<Record>>;

    /// Insert rows and return them as stored (including generated ids).
    async fn insert(&self, table: &str, rows: &[Record]) -> Result<Vec<Record>>;

    /// Delete every row in a table.
    async fn clear(&self, table: &str) -> Result<()>;
}

/// Data access functions over a backend.
#[derive(Clone)]
pub struct StoreQueries {
    backend: Arc<dyn Backend>,
}

impl StoreQueries {
    /// Create query functions over the given backend.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// The underlying backend.
    pub fn backend(&self) -> Arc<dyn Backend> {
        self.backend.clone()
    }

    /// Best-selling products by quantity sold.
    pub async fn top_selling_products(
        &self,
        category: Option<&str>,
        limit: Option<i64>,
        days: Option<i64>,
    ) -> Vec<Record> {
        self.rows(
            "get_top_selling_products",
            json!({
                "p_category": category,
                "p_limit": limit.unwrap_or(DEFAULT_LIMIT),
                "p_days": days.unwrap_or(DEFAULT_SALES_DAYS),
            }),
        )
        .await
    }

    /// Products with the strongest recent sales velocity.
    pub async fn trending_products(&self, days: Option<i64>, limit: Option<i64>) -> Vec<Record> {
        self.rows(
            "get_trending_products",
            json!({
                "p_days": days.unwrap_or(DEFAULT_TRENDING_DAYS),
                "p_limit": limit.unwrap_or(DEFAULT_LIMIT),
            }),
        )
        .await
    }

    /// Products whose name, brand or description match the term.
    pub async fn search_products_by_description(&self, search_term: &str) -> Vec<Record> {
        self.rows(
            "search_products_by_description",
            json!({ "p_search_term": search_term }),
        )
        .await
    }

    /// Products at or below their reorder level.
    pub async fn low_stock_products(&self, limit: Option<i64>) -> Vec<Record> {
        self.rows(
            "get_low_stock_products",
            json!({ "p_limit": limit.unwrap_or(DEFAULT_LOW_STOCK_LIMIT) }),
        )
        .await
    }

    /// Sales metrics per category.
    pub async fn sales_summary_by_category(&self, days: Option<i64>) -> Vec<Record> {
        self.rows(
            "get_sales_summary_by_category",
            json!({ "p_days": days.unwrap_or(DEFAULT_SALES_DAYS) }),
        )
        .await
    }

    /// Full details for one product, looked up by id or name.
    pub async fn product_details(
        &self,
        product_id: Option<i64>,
        product_name: Option<&str>,
    ) -> Option<Record> {
        self.rows(
            "get_product_details",
            json!({
                "p_product_id": product_id,
                "p_product_name": product_name,
            }),
        )
        .await
        .into_iter()
        .next()
    }

    /// Most recent sales transactions.
    pub async fn recent_transactions(&self, limit: Option<i64>) -> Vec<Record> {
        self.rows(
            "get_recent_transactions",
            json!({ "p_limit": limit.unwrap_or(DEFAULT_LIMIT) }),
        )
        .await
    }

    /// Names of all product categories.
    pub async fn all_categories(&self) -> Vec<String> {
        match self.backend.select("categories", &["name"]).await {
            Ok(rows) => rows
                .into_iter()
                .filter_map(|mut row| match row.remove("name") {
                    Some(Value::String(name)) => Some(name),
                    _ => None,
                })
                .collect(),
            Err(e) => {
                warn!("Error getting categories: {}", e);
                Vec::new()
            }
        }
    }

    async fn rows(&self, procedure: &str, params: Value) -> Vec<Record> {
        debug!(backend = self.backend.name(), procedure, %params, "Calling procedure");
        match self.backend.call(procedure, &params).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Error calling {}: {}", procedure, e);
                Vec::new()
            }
        }
    }
}

/// Check that a table or column name is a plain SQL identifier.
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(LisearchError::Backend(format!("Invalid identifier: {:?}", name)))
    }
}

/// Timestamp format shared by the seeder and the SQLite backend.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}


#[cfg(test)]
mod tests {
    use super::testing::FakeBackend;
    use super::*;

    #[tokio::test]
    async fn test_defaults_resolved_at_data_access() {
        let backend = Arc::new(FakeBackend::default());
        let queries = StoreQueries::new(backend.clone());

        queries.top_selling_products(None, None, None).await;
        queries.trending_products(None, Some(3)).await;
        queries.low_stock_products(None).await;
        queries.sales_summary_by_category(None).await;
        queries.recent_transactions(None).await;

        let calls = backend.calls();
        assert_eq!(calls[0].0, "get_top_selling_products");
        assert_eq!(
            calls[0].1,
            json!({"p_category": null, "p_limit": 10, "p_days": 30})
        );
        assert_eq!(calls[1].1, json!({"p_days": 7, "p_limit": 3}));
        assert_eq!(calls[2].1, json!({"p_limit": 20}));
        assert_eq!(calls[3].1, json!({"p_days": 30}));
        assert_eq!(calls[4].1, json!({"p_limit": 10}));
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_empty_result() {
        let queries = StoreQueries::new(Arc::new(FakeBackend::failing()));

        assert!(queries.low_stock_products(None).await.is_empty());
        assert!(queries.product_details(Some(1), None).await.is_none());
        assert!(queries.all_categories().await.is_empty());
    }

    #[tokio::test]
    async fn test_product_details_takes_first_row() {
        let backend = FakeBackend::default().with_rows(
            "get_product_details",
            vec![
                json!({"product_id": 4, "product_name": "Cointreau"}),
                json!({"product_id": 5, "product_name": "Other"}),
            ],
        );
        let queries = StoreQueries::new(Arc::new(backend));

        let details = queries.product_details(None, Some("cointreau")).await.unwrap();
        assert_eq!(details["product_id"], json!(4));
    }

    #[tokio::test]
    async fn test_all_categories_extracts_names() {
        let backend = FakeBackend::default().with_rows(
            "categories",
            vec![json!({"name": "Wine"}), json!({"name": "Beer"}), json!({"id": 3})],
        );
        let queries = StoreQueries::new(Arc::new(backend));

        assert_eq!(queries.all_categories().await, vec!["Wine", "Beer"]);
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("sales_line_items").is_ok());
        assert!(validate_identifier("_x1").is_ok());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("products; DROP TABLE x").is_err());
        assert!(validate_identifier("").is_err());
    }
}
