//! SQLite backend for running LiSearch against a local database.
//!
//! Implements the same named procedures as the hosted database, with the
//! same parameter names and result columns, in plain SQL.

use super::{format_timestamp, validate_identifier, Backend, Record};
use crate::error::{LisearchError, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection, Params};
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sku TEXT,
    upc TEXT,
    name TEXT NOT NULL,
    brand TEXT,
    category_id INTEGER REFERENCES categories(id),
    subcategory TEXT,
    size TEXT,
    abv REAL,
    description TEXT,
    cost_price REAL,
    retail_price REAL,
    status TEXT NOT NULL DEFAULT 'active'
);

CREATE TABLE IF NOT EXISTS inventory (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id INTEGER NOT NULL REFERENCES products(id),
    quantity_on_hand INTEGER NOT NULL DEFAULT 0,
    reorder_level INTEGER NOT NULL DEFAULT 0,
    reorder_quantity INTEGER NOT NULL DEFAULT 0,
    last_restock_date TEXT
);

CREATE TABLE IF NOT EXISTS sales_transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    transaction_date TEXT NOT NULL,
    total_amount REAL NOT NULL,
    payment_method TEXT
);

CREATE TABLE IF NOT EXISTS sales_line_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    transaction_id INTEGER NOT NULL REFERENCES sales_transactions(id),
    product_id INTEGER NOT NULL REFERENCES products(id),
    quantity INTEGER NOT NULL,
    unit_price REAL NOT NULL,
    line_total REAL NOT NULL,
    discount_amount REAL NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_transactions_date ON sales_transactions(transaction_date);
CREATE INDEX IF NOT EXISTS idx_line_items_transaction ON sales_line_items(transaction_id);
CREATE INDEX IF NOT EXISTS idx_line_items_product ON sales_line_items(product_id);
"#;

const TOP_SELLING_SQL: &str = r#"
SELECT p.id AS product_id, p.name AS product_name, p.brand, c.name AS category,
       p.retail_price,
       SUM(li.quantity) AS total_quantity_sold,
       ROUND(SUM(li.line_total), 2) AS total_revenue
FROM sales_line_items li
JOIN sales_transactions t ON t.id = li.transaction_id
JOIN products p ON p.id = li.product_id
LEFT JOIN categories c ON c.id = p.category_id
WHERE p.status = 'active'
  AND t.transaction_date >= ?1
  AND (?2 IS NULL OR LOWER(c.name) = LOWER(?2))
GROUP BY p.id
ORDER BY total_quantity_sold DESC, total_revenue DESC
LIMIT ?3
"#;

const TRENDING_SQL: &str = r#"
WITH recent AS (
    SELECT li.product_id, SUM(li.quantity) AS qty
    FROM sales_line_items li
    JOIN sales_transactions t ON t.id = li.transaction_id
    WHERE t.transaction_date >= ?1
    GROUP BY li.product_id
),
previous AS (
    SELECT li.product_id, SUM(li.quantity) AS qty
    FROM sales_line_items li
    JOIN sales_transactions t ON t.id = li.transaction_id
    WHERE t.transaction_date >= ?2 AND t.transaction_date < ?1
    GROUP BY li.product_id
)
SELECT p.id AS product_id, p.name AS product_name, p.brand, c.name AS category,
       r.qty AS recent_quantity,
       COALESCE(pr.qty, 0) AS previous_quantity,
       CASE WHEN COALESCE(pr.qty, 0) = 0 THEN NULL
            ELSE ROUND((r.qty - pr.qty) * 100.0 / pr.qty, 1) END AS growth_rate
FROM recent r
JOIN products p ON p.id = r.product_id
LEFT JOIN categories c ON c.id = p.category_id
LEFT JOIN previous pr ON pr.product_id = r.product_id
WHERE p.status = 'active'
ORDER BY recent_quantity DESC, growth_rate DESC
LIMIT ?3
"#;

const SEARCH_SQL: &str = r#"
SELECT p.id AS product_id, p.name AS product_name, p.brand, c.name AS category,
       p.subcategory, p.description, p.retail_price,
       CASE WHEN p.name LIKE ?1 ESCAPE '\' THEN 3
            WHEN p.brand LIKE ?1 ESCAPE '\' THEN 2
            ELSE 1 END AS relevance
FROM products p
LEFT JOIN categories c ON c.id = p.category_id
WHERE p.status = 'active'
  AND (p.name LIKE ?1 ESCAPE '\'
       OR p.brand LIKE ?1 ESCAPE '\'
       OR p.description LIKE ?1 ESCAPE '\'
       OR p.subcategory LIKE ?1 ESCAPE '\'
       OR c.name LIKE ?1 ESCAPE '\')
ORDER BY relevance DESC, p.name
"#;

const LOW_STOCK_SQL: &str = r#"
SELECT p.id AS product_id, p.name AS product_name, p.brand, c.name AS category,
       i.quantity_on_hand, i.reorder_level, i.reorder_quantity, i.last_restock_date
FROM inventory i
JOIN products p ON p.id = i.product_id
LEFT JOIN categories c ON c.id = p.category_id
WHERE p.status = 'active' AND i.quantity_on_hand <= i.reorder_level
ORDER BY (i.reorder_level - i.quantity_on_hand) DESC, p.name
LIMIT ?1
"#;

const CATEGORY_SUMMARY_SQL: &str = r#"
SELECT c.name AS category,
       COUNT(DISTINCT t.id) AS transaction_count,
       SUM(li.quantity) AS total_quantity,
       ROUND(SUM(li.line_total), 2) AS total_revenue,
       ROUND(AVG(li.unit_price), 2) AS avg_price
FROM sales_line_items li
JOIN sales_transactions t ON t.id = li.transaction_id
JOIN products p ON p.id = li.product_id
JOIN categories c ON c.id = p.category_id
WHERE t.transaction_date >= ?1
GROUP BY c.id
ORDER BY total_revenue DESC
"#;

const PRODUCT_DETAILS_SQL: &str = r#"
SELECT p.id AS product_id, p.sku, p.upc, p.name AS product_name, p.brand,
       c.name AS category, p.subcategory, p.size, p.abv, p.description,
       p.cost_price, p.retail_price, p.status,
       i.quantity_on_hand, i.reorder_level, i.last_restock_date,
       COALESCE((SELECT SUM(li.quantity)
                 FROM sales_line_items li
                 JOIN sales_transactions t ON t.id = li.transaction_id
                 WHERE li.product_id = p.id AND t.transaction_date >= ?3), 0) AS total_sold_30d,
       COALESCE((SELECT ROUND(SUM(li.line_total), 2)
                 FROM sales_line_items li
                 JOIN sales_transactions t ON t.id = li.transaction_id
                 WHERE li.product_id = p.id AND t.transaction_date >= ?3), 0) AS revenue_30d
FROM products p
LEFT JOIN categories c ON c.id = p.category_id
LEFT JOIN inventory i ON i.product_id = p.id
WHERE (?1 IS NOT NULL AND p.id = ?1)
   OR (?1 IS NULL AND ?2 IS NOT NULL AND p.name LIKE ?2 ESCAPE '\')
ORDER BY p.name
LIMIT 1
"#;

const RECENT_TRANSACTIONS_SQL: &str = r#"
SELECT t.id AS transaction_id, t.transaction_date, t.total_amount, t.payment_method,
       COUNT(li.id) AS item_count,
       COALESCE(SUM(li.quantity), 0) AS total_units,
       GROUP_CONCAT(p.name, ', ') AS items
FROM sales_transactions t
LEFT JOIN sales_line_items li ON li.transaction_id = t.id
LEFT JOIN products p ON p.id = li.product_id
GROUP BY t.id
ORDER BY t.transaction_date DESC, t.id DESC
LIMIT ?1
"#;

/// SQLite-based store backend.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (or create) the database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| LisearchError::Backend(format!("Failed to acquire lock: {}", e)))
    }
}

fn int_param(params: &Value, key: &str, default: i64) -> i64 {
    match &params[key] {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        _ => default,
    }
}

fn str_param<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params[key].as_str().filter(|s| !s.trim().is_empty())
}

/// Cutoff timestamp `days` days before now.
fn days_ago(days: i64) -> Result<String> {
    Duration::try_days(days.max(0))
        .and_then(|span| Utc::now().checked_sub_signed(span))
        .map(format_timestamp)
        .ok_or_else(|| {
            LisearchError::Backend(format!("Lookback of {} days is out of range", days))
        })
}

/// Substring pattern for LIKE with wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn json_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
    }
}

fn sql_from_json(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn query_records<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Record>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let rows = stmt.query_map(params, |row| {
        let mut record = Record::new();
        for (i, name) in columns.iter().enumerate() {
            record.insert(name.clone(), json_from_sql(row.get_ref(i)?));
        }
        Ok(record)
    })?;

    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

#[async_trait]
impl Backend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    #[instrument(skip(self, params))]
    async fn call(&self, procedure: &str, params: &Value) -> Result<Vec<Record>> {
        let conn = self.lock()?;
        debug!("Running procedure {} with {}", procedure, params);

        match procedure {
            "get_top_selling_products" => {
                let days = int_param(params, "p_days", 30);
                query_records(
                    &conn,
                    TOP_SELLING_SQL,
                    params![
                        days_ago(days)?,
                        str_param(params, "p_category"),
                        int_param(params, "p_limit", 10)
                    ],
                )
            }
            "get_trending_products" => {
                let days = int_param(params, "p_days", 7);
                let window = days.checked_mul(2).ok_or_else(|| {
                    LisearchError::Backend(format!("Lookback of {} days is out of range", days))
                })?;
                query_records(
                    &conn,
                    TRENDING_SQL,
                    params![
                        days_ago(days)?,
                        days_ago(window)?,
                        int_param(params, "p_limit", 10)
                    ],
                )
            }
            "search_products_by_description" => {
                let term = str_param(params, "p_search_term").ok_or_else(|| {
                    LisearchError::Backend("p_search_term is required".to_string())
                })?;
                query_records(&conn, SEARCH_SQL, params![like_pattern(term)])
            }
            "get_low_stock_products" => query_records(
                &conn,
                LOW_STOCK_SQL,
                params![int_param(params, "p_limit", 20)],
            ),
            "get_sales_summary_by_category" => {
                let days = int_param(params, "p_days", 30);
                query_records(&conn, CATEGORY_SUMMARY_SQL, params![days_ago(days)?])
            }
            "get_product_details" => {
                let product_id = params["p_product_id"].as_i64().or_else(|| {
                    params["p_product_id"]
                        .as_f64()
                        .map(|f| f as i64)
                });
                let name = str_param(params, "p_product_name").map(like_pattern);
                query_records(
                    &conn,
                    PRODUCT_DETAILS_SQL,
                    params![product_id, name, days_ago(30)?],
                )
            }
            "get_recent_transactions" => query_records(
                &conn,
                RECENT_TRANSACTIONS_SQL,
                params![int_param(params, "p_limit", 10)],
            ),
            other => Err(LisearchError::Backend(format!(
                "Unknown procedure: {}",
                other
            ))),
        }
    }

    async fn select(&self, table: &str, columns: &[&str]) -> Result<Vec<Record>> {
        validate_identifier(table)?;
        for column in columns {
            validate_identifier(column)?;
        }
        let columns = if columns.is_empty() {
            "*".to_string()
        } else {
            columns.join(", ")
        };

        let conn = self.lock()?;
        query_records(
            &conn,
            &format!("SELECT {} FROM {} ORDER BY id", columns, table),
            [],
        )
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn insert(&self, table: &str, rows: &[Record]) -> Result<Vec<Record>> {
        validate_identifier(table)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = Vec::with_capacity(rows.len());

        for row in rows {
            let columns: Vec<&String> = row.keys().filter(|k| k.as_str() != "id").collect();
            for column in &columns {
                validate_identifier(column)?;
            }

            let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                placeholders.join(", ")
            );
            let values = columns.iter().map(|c| sql_from_json(&row[c.as_str()]));
            tx.execute(&sql, params_from_iter(values))?;

            let mut stored = row.clone();
            stored.insert("id".to_string(), Value::from(tx.last_insert_rowid()));
            inserted.push(stored);
        }

        tx.commit()?;
        Ok(inserted)
    }

    async fn clear(&self, table: &str) -> Result<()> {
        validate_identifier(table)?;
        let conn = self.lock()?;
        conn.execute(&format!("DELETE FROM {}", table), [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    /// Two categories, three products, and a handful of sales.
    async fn fixture() -> SqliteBackend {
        let db = SqliteBackend::in_memory().unwrap();

        let cats = db
            .insert(
                "categories",
                &[record(json!({"name": "Wine"})), record(json!({"name": "Beer"}))],
            )
            .await
            .unwrap();
        let wine = cats[0]["id"].clone();
        let beer = cats[1]["id"].clone();

        let products = db
            .insert(
                "products",
                &[
                    record(json!({"name": "Meiomi Pinot Noir", "brand": "Meiomi", "category_id": wine,
                        "description": "Silky Pinot Noir with bright cherry", "retail_price": 26.99, "status": "active"})),
                    record(json!({"name": "Kim Crawford Sauvignon Blanc", "brand": "Kim Crawford", "category_id": wine,
                        "description": "Zesty citrus and passion fruit", "retail_price": 19.99, "status": "active"})),
                    record(json!({"name": "Stella Artois", "brand": "Stella Artois", "category_id": beer,
                        "description": "Crisp Belgian lager", "retail_price": 11.99, "status": "active"})),
                ],
            )
            .await
            .unwrap();
        let ids: Vec<Value> = products.iter().map(|p| p["id"].clone()).collect();

        db.insert(
            "inventory",
            &[
                record(json!({"product_id": ids[0], "quantity_on_hand": 5, "reorder_level": 20, "reorder_quantity": 24})),
                record(json!({"product_id": ids[1], "quantity_on_hand": 100, "reorder_level": 10, "reorder_quantity": 12})),
                record(json!({"product_id": ids[2], "quantity_on_hand": 12, "reorder_level": 12, "reorder_quantity": 36})),
            ],
        )
        .await
        .unwrap();

        let recent = format_timestamp(Utc::now() - Duration::days(2));
        let older = format_timestamp(Utc::now() - Duration::days(10));
        let ancient = format_timestamp(Utc::now() - Duration::days(60));
        let txs = db
            .insert(
                "sales_transactions",
                &[
                    record(json!({"transaction_date": recent, "total_amount": 53.98, "payment_method": "card"})),
                    record(json!({"transaction_date": older, "total_amount": 59.95, "payment_method": "cash"})),
                    record(json!({"transaction_date": ancient, "total_amount": 119.9, "payment_method": "cash"})),
                ],
            )
            .await
            .unwrap();

        db.insert(
            "sales_line_items",
            &[
                record(json!({"transaction_id": txs[0]["id"], "product_id": ids[0], "quantity": 2, "unit_price": 26.99, "line_total": 53.98})),
                record(json!({"transaction_id": txs[1]["id"], "product_id": ids[2], "quantity": 5, "unit_price": 11.99, "line_total": 59.95})),
                record(json!({"transaction_id": txs[2]["id"], "product_id": ids[2], "quantity": 10, "unit_price": 11.99, "line_total": 119.9})),
            ],
        )
        .await
        .unwrap();

        db
    }

    #[tokio::test]
    async fn test_top_selling_respects_window_and_category() {
        let db = fixture().await;

        let rows = db
            .call("get_top_selling_products", &json!({"p_category": null, "p_limit": 10, "p_days": 30}))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["product_name"], json!("Stella Artois"));
        assert_eq!(rows[0]["total_quantity_sold"], json!(5));

        let rows = db
            .call("get_top_selling_products", &json!({"p_category": "wine", "p_limit": 10, "p_days": 30}))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["product_name"], json!("Meiomi Pinot Noir"));
        assert_eq!(rows[0]["category"], json!("Wine"));
    }

    #[tokio::test]
    async fn test_trending_compares_windows() {
        let db = fixture().await;

        let rows = db
            .call("get_trending_products", &json!({"p_days": 7, "p_limit": 10}))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["recent_quantity"], json!(2));
        assert_eq!(rows[0]["previous_quantity"], json!(0));
        assert_eq!(rows[0]["growth_rate"], Value::Null);
    }

    #[tokio::test]
    async fn test_search_ranks_name_matches_first() {
        let db = fixture().await;

        let rows = db
            .call("search_products_by_description", &json!({"p_search_term": "citrus"}))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["product_name"], json!("Kim Crawford Sauvignon Blanc"));
        assert_eq!(rows[0]["relevance"], json!(1));

        let rows = db
            .call("search_products_by_description", &json!({"p_search_term": "stella"}))
            .await
            .unwrap();
        assert_eq!(rows[0]["relevance"], json!(3));

        let rows = db
            .call("search_products_by_description", &json!({"p_search_term": "100%"}))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_low_stock_orders_by_shortfall() {
        let db = fixture().await;

        let rows = db
            .call("get_low_stock_products", &json!({"p_limit": 20}))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["product_name"], json!("Meiomi Pinot Noir"));
        assert_eq!(rows[1]["product_name"], json!("Stella Artois"));

        let rows = db
            .call("get_low_stock_products", &json!({"p_limit": 1}))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_category_summary() {
        let db = fixture().await;

        let rows = db
            .call("get_sales_summary_by_category", &json!({"p_days": 30}))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["category"], json!("Beer"));
        assert_eq!(rows[0]["total_revenue"], json!(59.95));
        assert_eq!(rows[1]["transaction_count"], json!(1));
    }

    #[tokio::test]
    async fn test_product_details_by_id_and_name() {
        let db = fixture().await;

        let rows = db
            .call("get_product_details", &json!({"p_product_id": null, "p_product_name": "pinot"}))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["product_name"], json!("Meiomi Pinot Noir"));
        assert_eq!(rows[0]["total_sold_30d"], json!(2));
        assert_eq!(rows[0]["quantity_on_hand"], json!(5));

        let id = rows[0]["product_id"].clone();
        let rows = db
            .call("get_product_details", &json!({"p_product_id": id, "p_product_name": null}))
            .await
            .unwrap();
        assert_eq!(rows[0]["brand"], json!("Meiomi"));

        let rows = db
            .call("get_product_details", &json!({"p_product_id": null, "p_product_name": null}))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_recent_transactions_newest_first() {
        let db = fixture().await;

        let rows = db
            .call("get_recent_transactions", &json!({"p_limit": 2}))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["payment_method"], json!("card"));
        assert_eq!(rows[0]["items"], json!("Meiomi Pinot Noir"));
        assert_eq!(rows[0]["item_count"], json!(1));
    }

    #[tokio::test]
    async fn test_unknown_procedure_and_tables() {
        let db = SqliteBackend::in_memory().unwrap();
        assert!(db.call("get_everything", &json!({})).await.is_err());
        assert!(db.select("nope; --", &["name"]).await.is_err());
        assert!(db.select("missing_table", &["name"]).await.is_err());
    }

    #[tokio::test]
    async fn test_out_of_range_lookback_is_error() {
        let db = fixture().await;

        for procedure in [
            "get_top_selling_products",
            "get_trending_products",
            "get_sales_summary_by_category",
        ] {
            let err = db
                .call(procedure, &json!({"p_days": 100_000_000}))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("out of range"));
        }
        let err = db
            .call("get_trending_products", &json!({"p_days": i64::MAX}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));

        // The connection is still usable afterwards.
        let rows = db
            .call("get_sales_summary_by_category", &json!({"p_days": 30}))
            .await
            .unwrap();
        assert!(!rows.is_empty());
    }

    #[tokio::test]
    async fn test_huge_days_argument_yields_empty_tool_result() {
        use crate::agent::{ToolRegistry, ToolResult};
        use crate::store::StoreQueries;
        use std::sync::Arc;

        let registry = ToolRegistry::new(StoreQueries::new(Arc::new(fixture().await)));
        let args = json!({"days": 100_000_000});

        let result = registry
            .invoke("get_sales_summary_by_category", args.as_object().unwrap())
            .await;
        assert_eq!(result, ToolResult::Rows(vec![]));

        let result = registry
            .invoke("get_sales_summary_by_category", &Map::new())
            .await;
        assert!(matches!(result, ToolResult::Rows(rows) if !rows.is_empty()));
    }

    #[tokio::test]
    async fn test_select_and_clear() {
        let db = fixture().await;

        let rows = db.select("categories", &["name"]).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], json!("Wine"));

        for table in super::super::TABLES {
            db.clear(table).await.unwrap();
        }
        assert!(db.select("categories", &[]).await.unwrap().is_empty());
    }
}
