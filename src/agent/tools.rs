//! Tool registry: dispatches model tool requests to store queries.

use super::definitions::tool_definitions;
use crate::error::{LisearchError, Result};
use crate::llm::ToolDefinition;
use crate::store::{Record, StoreQueries};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Outcome of a tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    /// A list of records.
    Rows(Vec<Record>),
    /// A single record, or nothing found.
    Row(Option<Record>),
    /// The call could not be made.
    Error(String),
}

impl ToolResult {
    pub fn is_error(&self) -> bool {
        matches!(self, ToolResult::Error(_))
    }

    /// Text fed back to the model for this result.
    pub fn render(&self, tool_name: &str) -> String {
        match self {
            ToolResult::Error(message) => format!("Error executing {}: {}", tool_name, message),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| "null".to_string()),
        }
    }
}

impl Serialize for ToolResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ToolResult::Rows(rows) => rows.serialize(serializer),
            ToolResult::Row(row) => row.serialize(serializer),
            ToolResult::Error(message) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", message)?;
                map.end()
            }
        }
    }
}

/// A parsed tool request.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreTool {
    TopSellingProducts {
        category: Option<String>,
        limit: Option<i64>,
        days: Option<i64>,
    },
    TrendingProducts {
        days: Option<i64>,
        limit: Option<i64>,
    },
    SearchProducts {
        search_term: String,
    },
    LowStockProducts {
        limit: Option<i64>,
    },
    SalesSummaryByCategory {
        days: Option<i64>,
    },
    ProductDetails {
        product_id: Option<i64>,
        product_name: Option<String>,
    },
    RecentTransactions {
        limit: Option<i64>,
    },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TopSellingArgs {
    #[serde(default)]
    category: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    limit: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    days: Option<i64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TrendingArgs {
    #[serde(default, deserialize_with = "lenient_int")]
    days: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    limit: Option<i64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchArgs {
    search_term: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LimitArgs {
    #[serde(default, deserialize_with = "lenient_int")]
    limit: Option<i64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DaysArgs {
    #[serde(default, deserialize_with = "lenient_int")]
    days: Option<i64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ProductDetailsArgs {
    #[serde(default, deserialize_with = "lenient_int")]
    product_id: Option<i64>,
    #[serde(default)]
    product_name: Option<String>,
}

/// Accept `5`, `5.0` and `"5"` as integers; `null` as absent.
fn lenient_int<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(i));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
                _ => Err(de::Error::custom(format!("expected an integer, got {}", n))),
            }
        }
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected an integer, got {:?}", s))),
        Some(other) => Err(de::Error::custom(format!(
            "expected an integer, got {}",
            other
        ))),
    }
}

fn parse_args<T: DeserializeOwned>(arguments: &Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(arguments.clone()))
        .map_err(|e| LisearchError::InvalidInput(e.to_string()))
}

/// Parse a tool request into a [`StoreTool`].
pub fn parse_tool_request(name: &str, arguments: &Map<String, Value>) -> Result<StoreTool> {
    match name {
        "get_top_selling_products" => {
            let args: TopSellingArgs = parse_args(arguments)?;
            Ok(StoreTool::TopSellingProducts {
                category: args.category,
                limit: args.limit,
                days: args.days,
            })
        }
        "get_trending_products" => {
            let args: TrendingArgs = parse_args(arguments)?;
            Ok(StoreTool::TrendingProducts {
                days: args.days,
                limit: args.limit,
            })
        }
        "search_products_by_description" => {
            let args: SearchArgs = parse_args(arguments)?;
            Ok(StoreTool::SearchProducts {
                search_term: args.search_term,
            })
        }
        "get_low_stock_products" => {
            let args: LimitArgs = parse_args(arguments)?;
            Ok(StoreTool::LowStockProducts { limit: args.limit })
        }
        "get_sales_summary_by_category" => {
            let args: DaysArgs = parse_args(arguments)?;
            Ok(StoreTool::SalesSummaryByCategory { days: args.days })
        }
        "get_product_details" => {
            let args: ProductDetailsArgs = parse_args(arguments)?;
            Ok(StoreTool::ProductDetails {
                product_id: args.product_id,
                product_name: args.product_name,
            })
        }
        "get_recent_transactions" => {
            let args: LimitArgs = parse_args(arguments)?;
            Ok(StoreTool::RecentTransactions { limit: args.limit })
        }
        _ => Err(LisearchError::Agent(format!("Unknown tool: {}", name))),
    }
}

/// Fixed set of tools bound to the store queries.
pub struct ToolRegistry {
    queries: StoreQueries,
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new(queries: StoreQueries) -> Self {
        Self {
            queries,
            definitions: tool_definitions(),
        }
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.definitions.iter().any(|d| d.name == name)
    }

    pub fn queries(&self) -> &StoreQueries {
        &self.queries
    }

    /// Invoke a tool by name. Never fails; problems come back as [`ToolResult::Error`].
    pub async fn invoke(&self, name: &str, arguments: &Map<String, Value>) -> ToolResult {
        let shown = Value::Object(arguments.clone());
        info!("Executing tool: {} with args: {}", name, shown);

        if !self.has_tool(name) {
            warn!("Model requested unknown tool: {}", name);
            return ToolResult::Error(format!("Unknown tool: {}", name));
        }

        match parse_tool_request(name, arguments) {
            Ok(tool) => self.execute(&tool).await,
            Err(e) => {
                warn!("Error executing tool {}: {}", name, e);
                ToolResult::Error(e.to_string())
            }
        }
    }

    /// Run a parsed tool against the store.
    pub async fn execute(&self, tool: &StoreTool) -> ToolResult {
        let q = &self.queries;
        match tool {
            StoreTool::TopSellingProducts {
                category,
                limit,
                days,
            } => ToolResult::Rows(
                q.top_selling_products(category.as_deref(), *limit, *days)
                    .await,
            ),
            StoreTool::TrendingProducts { days, limit } => {
                ToolResult::Rows(q.trending_products(*days, *limit).await)
            }
            StoreTool::SearchProducts { search_term } => {
                ToolResult::Rows(q.search_products_by_description(search_term).await)
            }
            StoreTool::LowStockProducts { limit } => {
                ToolResult::Rows(q.low_stock_products(*limit).await)
            }
            StoreTool::SalesSummaryByCategory { days } => {
                ToolResult::Rows(q.sales_summary_by_category(*days).await)
            }
            StoreTool::ProductDetails {
                product_id,
                product_name,
            } => ToolResult::Row(
                q.product_details(*product_id, product_name.as_deref())
                    .await,
            ),
            StoreTool::RecentTransactions { limit } => {
                ToolResult::Rows(q.recent_transactions(*limit).await)
            }
        }
    }
}
