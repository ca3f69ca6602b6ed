//! Tool definitions offered to the model.

use crate::llm::ToolDefinition;
use serde_json::{json, Value};

fn definition(name: &str, description: &str, parameters: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

/// The store tools, in the order they are presented to the model.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        definition(
            "get_top_selling_products",
            "Get the best-selling products by total quantity sold. Use this when users ask about \
            top sellers, best sellers, or most popular products.",
            json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "description": "Optional category to filter by (Wine, Beer, Spirits, Liqueurs, Ready-to-Drink). Leave null for all categories.",
                        "nullable": true
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Number of products to return (default: 10)"
                    },
                    "days": {
                        "type": "integer",
                        "description": "Number of days to look back for sales data (default: 30)"
                    }
                }
            }),
        ),
        definition(
            "get_trending_products",
            "Get products that are trending based on recent sales velocity. Use this when users \
            ask about trending, hot, or what's popular right now.",
            json!({
                "type": "object",
                "properties": {
                    "days": {
                        "type": "integer",
                        "description": "Number of days for the recent period (default: 7)"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Number of products to return (default: 10)"
                    }
                }
            }),
        ),
        definition(
            "search_products_by_description",
            "Search for products by name, description, or brand. Use this when users describe \
            characteristics like \"woody\", \"citrus\", \"smooth\", or search for specific product names.",
            json!({
                "type": "object",
                "properties": {
                    "search_term": {
                        "type": "string",
                        "description": "The search term to match against product names, descriptions, and brands"
                    }
                },
                "required": ["search_term"]
            }),
        ),
        definition(
            "get_low_stock_products",
            "Get products that need reordering (at or below reorder level). Use this when users \
            ask about low stock, inventory alerts, or what needs to be restocked.",
            json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of products to return (default: 20)"
                    }
                }
            }),
        ),
        definition(
            "get_sales_summary_by_category",
            "Get sales performance summary broken down by product category. Use this when users \
            ask about category performance, which category sells best, or want category-level analytics.",
            json!({
                "type": "object",
                "properties": {
                    "days": {
                        "type": "integer",
                        "description": "Number of days to look back (default: 30)"
                    }
                }
            }),
        ),
        definition(
            "get_product_details",
            "Get detailed information about a specific product including sales history. Use this \
            when users ask about a specific product by name or want detailed info.",
            json!({
                "type": "object",
                "properties": {
                    "product_id": {
                        "type": "integer",
                        "description": "Product ID (if known)",
                        "nullable": true
                    },
                    "product_name": {
                        "type": "string",
                        "description": "Product name to search for",
                        "nullable": true
                    }
                }
            }),
        ),
        definition(
            "get_recent_transactions",
            "Get recent sales transactions with details. Use this when users ask about recent \
            sales, latest orders, or transaction history.",
            json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "description": "Number of transactions to return (default: 10)"
                    }
                }
            }),
        ),
    ]
}
