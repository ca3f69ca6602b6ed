//! Doctor command - verify configuration and connectivity.

use crate::assistant::create_backend;
use crate::cli::Output;
use crate::config::{DatabaseProvider, Settings};
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("LiSearch Doctor");
    println!();
    println!("Checking configuration and connectivity...\n");

    let mut checks = Vec::new();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    println!("{}", style("Language Model").bold());
    let llm_checks = vec![
        CheckResult::ok(
            "Provider",
            &format!("{} ({})", settings.llm.provider, settings.llm.effective_model()),
        ),
        check_api_key(settings),
    ];
    for check in &llm_checks {
        check.print();
    }
    checks.extend(llm_checks);

    println!();

    println!("{}", style("Database").bold());
    let db_check = check_database_settings(settings);
    db_check.print();
    let configured = db_check.status != CheckStatus::Error;
    checks.push(db_check);

    if configured {
        if let Some(conn_check) = check_backend(settings).await {
            conn_check.print();
            checks.push(conn_check);
        }
    }

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using LiSearch.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! LiSearch is ready to use.");
    }

    Ok(())
}

/// Check the LLM API key for the selected provider.
fn check_api_key(settings: &Settings) -> CheckResult {
    let var = settings.llm.provider.api_key_var();
    match settings.llm.require_api_key() {
        Ok(key) => CheckResult::ok(var, &format!("configured ({})", mask_secret(key))),
        Err(_) => CheckResult::error(
            var,
            "not set",
            &format!("Add {}=... to your .env file", var),
        ),
    }
}

/// Check the database settings for the selected backend.
fn check_database_settings(settings: &Settings) -> CheckResult {
    match settings.database.provider {
        DatabaseProvider::Supabase => match settings.database.require_supabase() {
            Ok((url, _)) => match url::Url::parse(url) {
                Ok(_) => CheckResult::ok("Supabase", url),
                Err(e) => CheckResult::error(
                    "Supabase",
                    &format!("invalid SUPABASE_URL: {}", e),
                    "Expected format: https://<project>.supabase.co",
                ),
            },
            Err(e) => CheckResult::error(
                "Supabase",
                &e.to_string(),
                "Add SUPABASE_URL and SUPABASE_KEY to your .env file",
            ),
        },
        DatabaseProvider::Sqlite => {
            let db_path = settings.sqlite_path();
            if db_path.exists() {
                CheckResult::ok("SQLite", &format!("{}", db_path.display()))
            } else {
                CheckResult::warning(
                    "SQLite",
                    &format!("{} (not created yet)", db_path.display()),
                    "Create and fill it with: lisearch seed",
                )
            }
        }
    }
}

/// Check that the backend answers a simple read.
///
/// Skipped (None) for a SQLite file that does not exist yet, since opening
/// it would create it.
async fn check_backend(settings: &Settings) -> Option<CheckResult> {
    if settings.database.provider == DatabaseProvider::Sqlite
        && !settings.sqlite_path().exists()
    {
        return None;
    }

    let backend = match create_backend(&settings.database) {
        Ok(backend) => backend,
        Err(e) => {
            return Some(CheckResult::error(
                "Connection",
                &e.to_string(),
                "Check the database settings above",
            ))
        }
    };

    let result = match backend.select("categories", &["name"]).await {
        Ok(rows) if rows.is_empty() => CheckResult::warning(
            "Connection",
            &format!("{} reachable, no categories found", backend.name()),
            "Load sample data with: lisearch seed",
        ),
        Ok(rows) => CheckResult::ok(
            "Connection",
            &format!("{} reachable ({} categories)", backend.name(), rows.len()),
        ),
        Err(e) => CheckResult::error(
            "Connection",
            &e.to_string(),
            "Verify the database is running and the schema is installed",
        ),
    };
    Some(result)
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: lisearch config edit",
        )
    }
}

/// Show only the ends of a secret.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("short"), "********");
        assert_eq!(mask_secret("AIzaSyD-1234567890abcd"), "AIza...abcd");
    }

    #[test]
    fn test_api_key_check_names_provider_variable() {
        let mut settings = Settings::default();
        let check = check_api_key(&settings);
        assert_eq!(check.status, CheckStatus::Error);
        assert_eq!(check.name, "GEMINI_API_KEY");

        settings.llm.api_key = Some("AIzaSyD-1234567890abcd".to_string());
        let check = check_api_key(&settings);
        assert_eq!(check.status, CheckStatus::Ok);
        assert!(!check.message.contains("1234567890"));
    }

    #[test]
    fn test_database_settings_check() {
        let mut settings = Settings::default();
        assert_eq!(check_database_settings(&settings).status, CheckStatus::Error);

        settings.database.supabase_url = Some("https://abc.supabase.co".to_string());
        settings.database.supabase_key = Some("anon".to_string());
        assert_eq!(check_database_settings(&settings).status, CheckStatus::Ok);

        settings.database.provider = DatabaseProvider::Sqlite;
        settings.database.sqlite_path = "/nonexistent/lisearch/store.db".to_string();
        assert_eq!(check_database_settings(&settings).status, CheckStatus::Warning);
    }

    #[tokio::test]
    async fn test_backend_check_on_empty_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("store.db");
        crate::store::SqliteBackend::new(&db_path).unwrap();

        let mut settings = Settings::default();
        settings.database.provider = DatabaseProvider::Sqlite;
        settings.database.sqlite_path = db_path.display().to_string();

        let check = check_backend(&settings).await.unwrap();
        assert_eq!(check.status, CheckStatus::Warning);
        assert!(check.message.contains("no categories"));
    }

    #[tokio::test]
    async fn test_backend_check_leaves_missing_sqlite_alone() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("store.db");

        let mut settings = Settings::default();
        settings.database.provider = DatabaseProvider::Sqlite;
        settings.database.sqlite_path = db_path.display().to_string();

        assert!(check_backend(&settings).await.is_none());
        assert!(!db_path.exists());
        assert!(!dir.path().join("nested").exists());
    }
}
