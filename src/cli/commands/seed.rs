//! Seed command - replace store data with a sample data set.

use crate::assistant::create_backend;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::store::{seed_database, SeedOptions};
use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Run the seed command.
pub async fn run_seed(yes: bool, seed: Option<u64>, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Seed, settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if !yes && !confirm(&format!(
        "This deletes all store data in the {} database. Continue? [y/N] ",
        settings.database.provider
    ))? {
        Output::info("Aborted.");
        return Ok(());
    }

    let backend = create_backend(&settings.database)?;
    let options = SeedOptions {
        seed,
        ..Default::default()
    };

    Output::header("Seeding store database");
    println!();

    let report =
        seed_database(backend.as_ref(), &options, &|step: &str| Output::success(step)).await?;

    println!();
    Output::kv("Categories", &report.categories.to_string());
    Output::kv("Products", &report.products.to_string());
    Output::kv("Inventory records", &report.inventory.to_string());
    Output::kv("Transactions", &report.transactions.to_string());
    Output::kv("Line items", &report.line_items.to_string());
    println!();
    Output::success("Database seeded successfully!");

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
