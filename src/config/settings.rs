//! Configuration settings for LiSearch.

use crate::error::{LisearchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-lite";

/// Default OpenAI model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub database: DatabaseSettings,
    pub chat: ChatSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Enables debug output across commands.
    pub debug: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.lisearch".to_string(),
            debug: false,
        }
    }
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Google Gemini (default).
    #[default]
    Gemini,
    /// OpenAI chat completions.
    OpenAI,
}

impl LlmProvider {
    /// Environment variable holding the API key for this provider.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "GEMINI_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            "openai" => Ok(LlmProvider::OpenAI),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Gemini => write!(f, "gemini"),
            LlmProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// LLM provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Provider used for chat (gemini, openai).
    pub provider: LlmProvider,
    /// Model name. Empty means the provider's default.
    pub model: String,
    /// API key (usually supplied through the environment instead).
    pub api_key: Option<String>,
    /// Endpoint override for the provider API.
    pub api_base: Option<String>,
    /// Timeout for a single model call.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: None,
            api_base: None,
            timeout_secs: 60,
        }
    }
}

impl LlmSettings {
    /// Model to request, falling back to the provider default when unset.
    pub fn effective_model(&self) -> String {
        if !self.model.trim().is_empty() {
            return self.model.clone();
        }
        match self.provider {
            LlmProvider::Gemini => DEFAULT_GEMINI_MODEL.to_string(),
            LlmProvider::OpenAI => DEFAULT_OPENAI_MODEL.to_string(),
        }
    }

    /// The configured API key, or a configuration error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| missing_env(self.provider.api_key_var()))
    }
}

/// Database backend type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseProvider {
    /// Hosted Supabase (PostgREST RPC).
    #[default]
    Supabase,
    /// Local SQLite file.
    Sqlite,
}

impl std::str::FromStr for DatabaseProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supabase" | "postgrest" => Ok(DatabaseProvider::Supabase),
            "sqlite" | "local" => Ok(DatabaseProvider::Sqlite),
            _ => Err(format!("Unknown database provider: {}", s)),
        }
    }
}

impl std::fmt::Display for DatabaseProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseProvider::Supabase => write!(f, "supabase"),
            DatabaseProvider::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Store database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Backend (supabase, sqlite).
    pub provider: DatabaseProvider,
    /// Supabase project URL.
    pub supabase_url: Option<String>,
    /// Supabase API key.
    pub supabase_key: Option<String>,
    /// Path to the SQLite database (for sqlite provider).
    pub sqlite_path: String,
    /// Timeout for a single backend request.
    pub timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            provider: DatabaseProvider::Supabase,
            supabase_url: None,
            supabase_key: None,
            sqlite_path: "~/.lisearch/store.db".to_string(),
            timeout_secs: 30,
        }
    }
}

impl DatabaseSettings {
    /// Supabase URL and key, or a configuration error naming the missing variable.
    pub fn require_supabase(&self) -> Result<(&str, &str)> {
        let url = self
            .supabase_url
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| missing_env("SUPABASE_URL"))?;
        let key = self
            .supabase_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| missing_env("SUPABASE_KEY"))?;
        Ok((url, key))
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Maximum model calls per user message.
    pub max_iterations: usize,
    /// Number of previous turns sent along with a new message.
    pub history_turns: usize,
    /// Show iterations and tool calls after each answer.
    pub show_debug: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            history_turns: 10,
            show_debug: false,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// File whose contents replace the built-in system prompt.
    pub system_prompt_file: Option<String>,
    /// Variables substituted into the system prompt as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

fn missing_env(key: &str) -> LisearchError {
    LisearchError::Config(format!(
        "Missing required environment variable: {key}\n\
         Please ensure your .env file contains {key}=your_value"
    ))
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied on top of the file contents.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_with(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get("LISEARCH_LLM_PROVIDER").and_then(|v| v.parse().ok()) {
            if provider != self.llm.provider && self.llm.model == DEFAULT_GEMINI_MODEL {
                self.llm.model.clear();
            }
            self.llm.provider = provider;
        }
        if let Some(provider) = get("LISEARCH_DATABASE_PROVIDER").and_then(|v| v.parse().ok()) {
            self.database.provider = provider;
        }
        if let Some(key) = get(self.llm.provider.api_key_var()) {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = get("SUPABASE_URL") {
            self.database.supabase_url = Some(url);
        }
        if let Some(key) = get("SUPABASE_KEY") {
            self.database.supabase_key = Some(key);
        }
        if let Some(debug) = get("DEBUG") {
            let enabled = debug.eq_ignore_ascii_case("true");
            self.general.debug = enabled;
            self.chat.show_debug = self.chat.show_debug || enabled;
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| LisearchError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Copy of these settings with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "********".to_string());
        let mut copy = self.clone();
        copy.llm.api_key = mask(&self.llm.api_key);
        copy.database.supabase_key = mask(&self.database.supabase_key);
        copy
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lisearch")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.database.sqlite_path)
    }
}

impl std::fmt::Display for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let url: String = self
            .database
            .supabase_url
            .as_deref()
            .unwrap_or("")
            .chars()
            .take(20)
            .collect();
        let keys_loaded = self.llm.api_key.is_some()
            && (self.database.provider == DatabaseProvider::Sqlite
                || self.database.supabase_key.is_some());
        write!(
            f,
            "Settings(supabase_url={}..., llm={}/{}, keys_loaded={})",
            url,
            self.llm.provider,
            self.llm.effective_model(),
            keys_loaded
        )
    }
}
