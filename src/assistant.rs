//! Wiring for the store assistant.
//!
//! Builds the backend, model provider, tool registry and agent described
//! by [`Settings`].

use crate::agent::{Agent, ToolRegistry};
use crate::config::{DatabaseProvider, DatabaseSettings, Prompts, Settings};
use crate::error::Result;
use crate::llm::{create_provider, ChatProvider, ModelAdapter};
use crate::session::ChatSession;
use crate::store::{Backend, SqliteBackend, StoreQueries, SupabaseBackend};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Create the database backend selected in the settings.
pub fn create_backend(settings: &DatabaseSettings) -> Result<Arc<dyn Backend>> {
    let backend: Arc<dyn Backend> = match settings.provider {
        DatabaseProvider::Supabase => {
            let (url, key) = settings.require_supabase()?;
            Arc::new(SupabaseBackend::new(
                url,
                key,
                Duration::from_secs(settings.timeout_secs),
            )?)
        }
        DatabaseProvider::Sqlite => Arc::new(SqliteBackend::new(&Settings::expand_path(
            &settings.sqlite_path,
        ))?),
    };
    Ok(backend)
}

/// A fully wired store assistant.
pub struct Assistant {
    settings: Settings,
    system_prompt: String,
    queries: StoreQueries,
    agent: Arc<Agent>,
}

impl Assistant {
    /// Build everything from settings.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let backend = create_backend(&settings.database)?;
        let provider = create_provider(&settings.llm)?;
        Self::with_parts(settings, backend, provider)
    }

    /// Build around an existing backend and provider.
    pub fn with_parts(
        settings: Settings,
        backend: Arc<dyn Backend>,
        provider: Arc<dyn ChatProvider>,
    ) -> Result<Self> {
        let prompts = Prompts::load(&settings.prompts)?;
        let queries = StoreQueries::new(backend);
        let registry = Arc::new(ToolRegistry::new(queries.clone()));

        let adapter =
            ModelAdapter::new(provider).with_timeout(Duration::from_secs(settings.llm.timeout_secs));
        let agent = Agent::new(adapter, registry).with_max_iterations(settings.chat.max_iterations);

        info!(
            backend = queries.backend().name(),
            provider = agent.adapter().provider().name(),
            model = agent.adapter().provider().model(),
            "Assistant ready"
        );

        Ok(Self {
            system_prompt: prompts.system_prompt(),
            settings,
            queries,
            agent: Arc::new(agent),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn queries(&self) -> &StoreQueries {
        &self.queries
    }

    pub fn agent(&self) -> Arc<Agent> {
        self.agent.clone()
    }

    /// Start an empty conversation.
    pub fn new_session(&self) -> ChatSession {
        ChatSession::new(self.system_prompt.clone(), self.settings.chat.history_turns)
    }
}
