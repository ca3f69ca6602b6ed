//! Pre-flight checks before starting work.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail on their first request.

use crate::config::{DatabaseProvider, Settings};
use crate::error::{LisearchError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Chatting requires an LLM API key and a database.
    Chat,
    /// Seeding requires a database.
    Seed,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Chat => {
            settings.llm.require_api_key()?;
            check_database(settings)?;
        }
        Operation::Seed => {
            check_database(settings)?;
        }
    }
    Ok(())
}

/// Check that the selected database backend is configured.
fn check_database(settings: &Settings) -> Result<()> {
    match settings.database.provider {
        DatabaseProvider::Supabase => {
            let (url, _) = settings.database.require_supabase()?;
            url::Url::parse(url).map_err(|e| {
                LisearchError::Config(format!("SUPABASE_URL is not a valid URL ({}): {}", e, url))
            })?;
        }
        DatabaseProvider::Sqlite => {
            if settings.database.sqlite_path.trim().is_empty() {
                return Err(LisearchError::Config(
                    "database.sqlite_path is empty".to_string(),
                ));
            }
        }
    }
    Ok(())
}
