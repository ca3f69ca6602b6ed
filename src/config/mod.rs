//! Configuration module for LiSearch.
//!
//! Handles loading settings (file plus environment) and the system prompt.

mod prompts;
mod settings;

pub use prompts::{Prompts, DEFAULT_SYSTEM_PROMPT};
pub use settings::{
    ChatSettings, DatabaseProvider, DatabaseSettings, GeneralSettings, LlmProvider, LlmSettings,
    PromptSettings, Settings, DEFAULT_GEMINI_MODEL, DEFAULT_OPENAI_MODEL,
};
