//! Sample data for a liquor store database.
//!
//! Clears every table and loads categories, a product catalog, inventory
//! levels and a month of randomized sales. Works against any [`Backend`].

use super::{format_timestamp, Backend, Record, TABLES};
use crate::error::{LisearchError, Result};
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use tracing::info;

/// A product in the sample catalog.
#[derive(Debug, Clone, Copy)]
pub struct CatalogProduct {
    pub sku: &'static str,
    pub upc: &'static str,
    pub name: &'static str,
    pub brand: &'static str,
    pub category: &'static str,
    pub subcategory: &'static str,
    pub size: &'static str,
    pub abv: f64,
    pub description: &'static str,
    pub cost_price: f64,
    pub retail_price: f64,
}

/// Sample categories as `(name, description)`.
pub const CATEGORIES: [(&str, &str); 5] = [
    ("Wine", "Red, white, rosé, and sparkling wines"),
    ("Beer", "Craft beers, lagers, ales, and imports"),
    ("Spirits", "Whiskey, vodka, rum, gin, and tequila"),
    ("Liqueurs", "Flavored spirits and cordials"),
    ("Ready-to-Drink", "Pre-mixed cocktails and hard seltzers"),
];

const PAYMENT_METHODS: [&str; 3] = ["cash", "card", "digital_wallet"];
const REORDER_QUANTITIES: [i64; 4] = [12, 24, 36, 48];

/// Sample product catalog.
pub const PRODUCT_CATALOG: [CatalogProduct; 20] = [
    CatalogProduct {
        sku: "WIN-CAB-001",
        upc: "012345678901",
        name: "Château Margaux",
        brand: "Château Margaux",
        category: "Wine",
        subcategory: "Red Wine - Bordeaux",
        size: "750ml",
        abv: 13.5,
        description: "Full-bodied Bordeaux with notes of dark cherry, cedar, and tobacco. Smooth tannins with a long finish.",
        cost_price: 45.00,
        retail_price: 89.99,
    },
    CatalogProduct {
        sku: "WIN-CHARD-002",
        upc: "012345678902",
        name: "Kendall-Jackson Chardonnay",
        brand: "Kendall-Jackson",
        category: "Wine",
        subcategory: "White Wine - Chardonnay",
        size: "750ml",
        abv: 13.5,
        description: "Rich and creamy Chardonnay with tropical fruit flavors, vanilla, and butter notes.",
        cost_price: 12.00,
        retail_price: 24.99,
    },
    CatalogProduct {
        sku: "WIN-PINOT-003",
        upc: "012345678903",
        name: "Meiomi Pinot Noir",
        brand: "Meiomi",
        category: "Wine",
        subcategory: "Red Wine - Pinot Noir",
        size: "750ml",
        abv: 13.8,
        description: "Silky Pinot Noir with bright cherry, strawberry, and subtle oak. Elegant and food-friendly.",
        cost_price: 13.50,
        retail_price: 26.99,
    },
    CatalogProduct {
        sku: "WIN-SAUV-004",
        upc: "012345678904",
        name: "Kim Crawford Sauvignon Blanc",
        brand: "Kim Crawford",
        category: "Wine",
        subcategory: "White Wine - Sauvignon Blanc",
        size: "750ml",
        abv: 13.0,
        description: "Crisp and refreshing with zesty citrus, passion fruit, and herbaceous notes.",
        cost_price: 10.00,
        retail_price: 19.99,
    },
    CatalogProduct {
        sku: "WIN-PROS-005",
        upc: "012345678905",
        name: "La Marca Prosecco",
        brand: "La Marca",
        category: "Wine",
        subcategory: "Sparkling Wine",
        size: "750ml",
        abv: 11.0,
        description: "Light and bubbly Italian Prosecco with notes of green apple, pear, and white peach.",
        cost_price: 9.00,
        retail_price: 17.99,
    },
    CatalogProduct {
        sku: "BEER-IPA-101",
        upc: "112345678901",
        name: "Sierra Nevada Pale Ale",
        brand: "Sierra Nevada",
        category: "Beer",
        subcategory: "IPA",
        size: "6-pack 12oz",
        abv: 5.6,
        description: "Classic American pale ale with piney, citrusy hops and balanced malt backbone.",
        cost_price: 7.50,
        retail_price: 12.99,
    },
    CatalogProduct {
        sku: "BEER-LAG-102",
        upc: "112345678902",
        name: "Stella Artois",
        brand: "Stella Artois",
        category: "Beer",
        subcategory: "Lager",
        size: "6-pack 11.2oz",
        abv: 5.0,
        description: "Crisp Belgian lager with subtle malt sweetness and clean finish.",
        cost_price: 6.50,
        retail_price: 11.99,
    },
    CatalogProduct {
        sku: "BEER-STOUT-103",
        upc: "112345678903",
        name: "Guinness Draught",
        brand: "Guinness",
        category: "Beer",
        subcategory: "Stout",
        size: "4-pack 14.9oz",
        abv: 4.2,
        description: "Iconic Irish stout with roasted barley, chocolate notes, and creamy texture.",
        cost_price: 8.00,
        retail_price: 13.99,
    },
    CatalogProduct {
        sku: "BEER-WHEAT-104",
        upc: "112345678904",
        name: "Blue Moon Belgian White",
        brand: "Blue Moon",
        category: "Beer",
        subcategory: "Wheat Beer",
        size: "6-pack 12oz",
        abv: 5.4,
        description: "Smooth wheat beer with orange peel and coriander. Light and refreshing citrus notes.",
        cost_price: 6.00,
        retail_price: 10.99,
    },
    CatalogProduct {
        sku: "BEER-CRAFT-105",
        upc: "112345678905",
        name: "Dogfish Head 60 Minute IPA",
        brand: "Dogfish Head",
        category: "Beer",
        subcategory: "IPA",
        size: "6-pack 12oz",
        abv: 6.0,
        description: "Continuously hopped IPA with complex citrus, pine, and caramel flavors.",
        cost_price: 8.50,
        retail_price: 14.99,
    },
    CatalogProduct {
        sku: "SPRT-WHIS-201",
        upc: "212345678901",
        name: "Jack Daniel's Old No. 7",
        brand: "Jack Daniel's",
        category: "Spirits",
        subcategory: "Tennessee Whiskey",
        size: "750ml",
        abv: 40.0,
        description: "Classic Tennessee whiskey with smooth caramel, vanilla, and charcoal mellowing. Woody undertones.",
        cost_price: 18.00,
        retail_price: 32.99,
    },
    CatalogProduct {
        sku: "SPRT-VODK-202",
        upc: "212345678902",
        name: "Grey Goose Vodka",
        brand: "Grey Goose",
        category: "Spirits",
        subcategory: "Vodka",
        size: "750ml",
        abv: 40.0,
        description: "Premium French vodka with silky smooth texture and subtle sweetness. Clean finish.",
        cost_price: 22.00,
        retail_price: 39.99,
    },
    CatalogProduct {
        sku: "SPRT-GIN-203",
        upc: "212345678903",
        name: "Tanqueray London Dry Gin",
        brand: "Tanqueray",
        category: "Spirits",
        subcategory: "Gin",
        size: "750ml",
        abv: 47.3,
        description: "Juniper-forward London dry gin with citrus, angelica, and licorice notes. Perfect for martinis.",
        cost_price: 16.00,
        retail_price: 28.99,
    },
    CatalogProduct {
        sku: "SPRT-RUM-204",
        upc: "212345678904",
        name: "Bacardi Superior",
        brand: "Bacardi",
        category: "Spirits",
        subcategory: "White Rum",
        size: "750ml",
        abv: 40.0,
        description: "Light and crisp white rum with subtle vanilla and almond. Ideal for mojitos and daiquiris.",
        cost_price: 12.00,
        retail_price: 21.99,
    },
    CatalogProduct {
        sku: "SPRT-TEQ-205",
        upc: "212345678905",
        name: "Patrón Silver",
        brand: "Patrón",
        category: "Spirits",
        subcategory: "Tequila",
        size: "750ml",
        abv: 40.0,
        description: "Premium silver tequila with citrus, pepper, and agave flavors. Smooth and clean.",
        cost_price: 32.00,
        retail_price: 54.99,
    },
    CatalogProduct {
        sku: "SPRT-SCOT-206",
        upc: "212345678906",
        name: "Johnnie Walker Black Label",
        brand: "Johnnie Walker",
        category: "Spirits",
        subcategory: "Scotch Whisky",
        size: "750ml",
        abv: 40.0,
        description: "Blended Scotch with smoky peat, dried fruit, and vanilla. Rich and complex with woody notes.",
        cost_price: 24.00,
        retail_price: 42.99,
    },
    CatalogProduct {
        sku: "LIQ-BAIL-301",
        upc: "312345678901",
        name: "Baileys Irish Cream",
        brand: "Baileys",
        category: "Liqueurs",
        subcategory: "Cream Liqueur",
        size: "750ml",
        abv: 17.0,
        description: "Creamy blend of Irish whiskey and cream with chocolate and vanilla flavors.",
        cost_price: 16.00,
        retail_price: 27.99,
    },
    CatalogProduct {
        sku: "LIQ-COIN-302",
        upc: "312345678902",
        name: "Cointreau",
        brand: "Cointreau",
        category: "Liqueurs",
        subcategory: "Orange Liqueur",
        size: "750ml",
        abv: 40.0,
        description: "Premium triple sec with intense orange peel flavor. Essential for margaritas and cosmopolitans.",
        cost_price: 20.00,
        retail_price: 36.99,
    },
    CatalogProduct {
        sku: "RTD-CLAW-401",
        upc: "412345678901",
        name: "White Claw Black Cherry",
        brand: "White Claw",
        category: "Ready-to-Drink",
        subcategory: "Hard Seltzer",
        size: "12-pack 12oz",
        abv: 5.0,
        description: "Light and refreshing hard seltzer with natural black cherry flavor. Low calorie and gluten-free.",
        cost_price: 13.00,
        retail_price: 19.99,
    },
    CatalogProduct {
        sku: "RTD-MARG-402",
        upc: "412345678902",
        name: "Cutwater Lime Margarita",
        brand: "Cutwater",
        category: "Ready-to-Drink",
        subcategory: "Canned Cocktail",
        size: "4-pack 12oz",
        abv: 12.5,
        description: "Premium ready-to-drink margarita with real tequila, lime juice, and agave. Tangy and refreshing citrus profile.",
        cost_price: 11.00,
        retail_price: 17.99,
    },
];

/// Options for seeding.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    /// RNG seed for reproducible data; entropy when absent.
    pub seed: Option<u64>,
    /// Number of sales transactions to generate.
    pub transactions: usize,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            seed: None,
            transactions: 200,
        }
    }
}

/// Row counts written by a seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub products: usize,
    pub inventory: usize,
    pub transactions: usize,
    pub line_items: usize,
}

fn to_record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

fn row_id(row: &Record) -> Result<i64> {
    row.get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| LisearchError::Backend("Inserted row has no id".to_string()))
}

fn cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Replace all store data with a fresh sample data set.
///
/// `on_step` receives a short progress line after each step.
pub async fn seed_database(
    backend: &dyn Backend,
    options: &SeedOptions,
    on_step: &dyn Fn(&str),
) -> Result<SeedReport> {
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut report = SeedReport::default();

    for table in TABLES {
        backend.clear(table).await?;
    }
    on_step("Data cleared");

    // Categories
    let rows: Vec<Record> = CATEGORIES
        .iter()
        .map(|(name, description)| to_record(json!({"name": name, "description": description})))
        .collect();
    let inserted = backend.insert("categories", &rows).await?;
    let mut category_ids = std::collections::HashMap::new();
    for row in &inserted {
        if let Some(Value::String(name)) = row.get("name") {
            category_ids.insert(name.clone(), row_id(row)?);
        }
    }
    report.categories = inserted.len();
    on_step(&format!("Seeded {} categories", report.categories));

    // Products
    let mut rows = Vec::with_capacity(PRODUCT_CATALOG.len());
    for product in &PRODUCT_CATALOG {
        let category_id = category_ids.get(product.category).ok_or_else(|| {
            LisearchError::Backend(format!("Category not seeded: {}", product.category))
        })?;
        rows.push(to_record(json!({
            "sku": product.sku,
            "upc": product.upc,
            "name": product.name,
            "brand": product.brand,
            "category_id": category_id,
            "subcategory": product.subcategory,
            "size": product.size,
            "abv": product.abv,
            "description": product.description,
            "cost_price": product.cost_price,
            "retail_price": product.retail_price,
            "status": "active",
        })));
    }
    let inserted = backend.insert("products", &rows).await?;
    let product_ids = inserted.iter().map(row_id).collect::<Result<Vec<_>>>()?;
    report.products = product_ids.len();
    on_step(&format!("Seeded {} products", report.products));

    // Inventory
    let now = Utc::now();
    let rows: Vec<Record> = product_ids
        .iter()
        .map(|product_id| {
            let restocked = now - Duration::days(rng.gen_range(1..=30));
            to_record(json!({
                "product_id": product_id,
                "quantity_on_hand": rng.gen_range(10..=150),
                "reorder_level": rng.gen_range(10..=30),
                "reorder_quantity": REORDER_QUANTITIES.choose(&mut rng).copied().unwrap_or(24),
                "last_restock_date": format_timestamp(restocked),
            }))
        })
        .collect();
    report.inventory = backend.insert("inventory", &rows).await?.len();
    on_step(&format!("Seeded {} inventory records", report.inventory));

    // Sales
    let mut transactions = Vec::with_capacity(options.transactions);
    let mut baskets = Vec::with_capacity(options.transactions);
    for _ in 0..options.transactions {
        let at = now
            - Duration::days(rng.gen_range(0..=30))
            - Duration::hours(rng.gen_range(0..=23))
            - Duration::minutes(rng.gen_range(0..=59));
        let count = rng.gen_range(1..=5).min(product_ids.len());

        let mut total = 0.0;
        let mut items = Vec::with_capacity(count);
        for product_id in product_ids.choose_multiple(&mut rng, count) {
            let quantity: i64 = rng.gen_range(1..=3);
            let unit_price: f64 = rng.gen_range(10.99..=54.99);
            let line_total = quantity as f64 * unit_price;
            total += line_total;
            items.push(json!({
                "product_id": product_id,
                "quantity": quantity,
                "unit_price": cents(unit_price),
                "line_total": cents(line_total),
                "discount_amount": 0,
            }));
        }

        transactions.push(to_record(json!({
            "transaction_date": format_timestamp(at),
            "total_amount": cents(total),
            "payment_method": PAYMENT_METHODS.choose(&mut rng).copied().unwrap_or("cash"),
        })));
        baskets.push(items);
    }

    let inserted = backend.insert("sales_transactions", &transactions).await?;
    report.transactions = inserted.len();
    on_step(&format!("Seeded {} sales transactions", report.transactions));

    let mut line_items = Vec::new();
    for (row, items) in inserted.iter().zip(baskets) {
        let transaction_id = row_id(row)?;
        for item in items {
            let mut item = to_record(item);
            item.insert("transaction_id".to_string(), Value::from(transaction_id));
            line_items.push(item);
        }
    }
    report.line_items = backend.insert("sales_line_items", &line_items).await?.len();
    on_step(&format!("Seeded {} sales line items", report.line_items));

    info!(?report, backend = backend.name(), "Database seeded");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SqliteBackend, StoreQueries};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_catalog_covers_every_category() {
        for (name, _) in CATEGORIES {
            assert!(PRODUCT_CATALOG.iter().any(|p| p.category == name), "{}", name);
        }
        for product in &PRODUCT_CATALOG {
            assert!(product.retail_price > product.cost_price, "{}", product.name);
        }
    }

    #[tokio::test]
    async fn test_seed_sqlite() {
        let backend = Arc::new(SqliteBackend::in_memory().unwrap());
        let steps = Mutex::new(Vec::new());
        let options = SeedOptions {
            seed: Some(7),
            transactions: 50,
        };

        let report = seed_database(backend.as_ref(), &options, &|s: &str| {
            steps.lock().unwrap().push(s.to_string())
        })
        .await
        .unwrap();

        assert_eq!(report.categories, 5);
        assert_eq!(report.products, 20);
        assert_eq!(report.inventory, 20);
        assert_eq!(report.transactions, 50);
        assert!(report.line_items >= 50 && report.line_items <= 250);
        assert_eq!(steps.lock().unwrap().len(), 6);

        let queries = StoreQueries::new(backend.clone());
        assert_eq!(queries.all_categories().await.len(), 5);
        assert!(!queries.top_selling_products(None, None, None).await.is_empty());
        assert_eq!(queries.recent_transactions(Some(3)).await.len(), 3);

        let found = queries.search_products_by_description("citrus").await;
        assert!(found.iter().any(|r| r["product_name"] == json!("Kim Crawford Sauvignon Blanc")));
    }

    #[tokio::test]
    async fn test_reseeding_replaces_data() {
        let backend = SqliteBackend::in_memory().unwrap();
        let options = SeedOptions {
            seed: Some(1),
            transactions: 10,
        };

        seed_database(&backend, &options, &|_: &str| {}).await.unwrap();
        seed_database(&backend, &options, &|_: &str| {}).await.unwrap();

        assert_eq!(backend.select("products", &["id"]).await.unwrap().len(), 20);
        assert_eq!(
            backend.select("sales_transactions", &["id"]).await.unwrap().len(),
            10
        );
    }
}
