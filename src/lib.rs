//! LiSearch - Liquor Store AI Assistant
//!
//! A conversational assistant that answers natural-language questions about
//! a liquor store's sales and inventory by letting a language model call a
//! fixed set of database query tools.
//!
//! # Overview
//!
//! LiSearch allows you to:
//! - Ask about top sellers, trending products, low stock and sales by category
//! - Search the catalog by flavor or description
//! - Chat interactively, one-shot from the shell, or over HTTP
//! - Seed a Supabase project or local SQLite file with sample data
//!
//! # Architecture
//!
//! - `config` - Settings (file plus environment) and the system prompt
//! - `store` - Database backends and the named store queries
//! - `llm` - Chat model providers (Gemini, OpenAI) behind one adapter
//! - `agent` - Tool registry and the tool calling loop
//! - `session` - Conversation history for interactive front ends
//! - `assistant` - Wiring of all of the above from settings
//!
//! # Example
//!
//! ```rust,no_run
//! use lisearch::assistant::Assistant;
//! use lisearch::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let assistant = Assistant::from_settings(Settings::load()?)?;
//!     let mut session = assistant.new_session();
//!
//!     let result = session
//!         .send(&assistant.agent(), "What are the top 5 selling wines?")
//!         .await?;
//!     println!("{}", result.response);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod assistant;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod session;
pub mod store;

pub use error::{LisearchError, Result};
