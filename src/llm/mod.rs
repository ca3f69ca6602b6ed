//! Chat model providers.
//!
//! Conversations are provider-agnostic [`Message`] lists. Each provider
//! implements [`ChatProvider`]; the [`ModelAdapter`] wraps one and turns
//! every failure into an in-band `"Error: ..."` reply.

mod gemini;
mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use crate::config::{LlmProvider, LlmSettings};
use crate::error::{LisearchError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Content used when the model requests tools without saying anything.
pub const TOOL_CALL_PLACEHOLDER: &str = "[Calling tools...]";

/// Default timeout for a single model call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A function the model may ask to have called.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the accepted arguments.
    pub parameters: Value,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// What the model said in one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelReply {
    pub content: String,
    pub tool_requests: Vec<ToolRequest>,
}

impl ModelReply {
    /// A plain text reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_requests: Vec::new(),
        }
    }

    /// Whether the model asked for any tool calls.
    pub fn wants_tools(&self) -> bool {
        !self.tool_requests.is_empty()
    }
}

/// Trait for chat model providers.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Model identifier sent to the provider.
    fn model(&self) -> &str;

    /// Send a conversation, with optional tool definitions, and return the reply.
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ModelReply>;
}

/// Create the provider selected in the settings.
pub fn create_provider(settings: &LlmSettings) -> Result<Arc<dyn ChatProvider>> {
    let api_key = settings.require_api_key()?;
    let model = settings.effective_model();
    let timeout = Duration::from_secs(settings.timeout_secs);

    let provider: Arc<dyn ChatProvider> = match settings.provider {
        LlmProvider::Gemini => Arc::new(GeminiProvider::new(
            api_key,
            &model,
            settings.api_base.as_deref(),
            timeout,
        )?),
        LlmProvider::OpenAI => Arc::new(OpenAiProvider::new(
            api_key,
            &model,
            settings.api_base.as_deref(),
            timeout,
        )?),
    };
    Ok(provider)
}

/// Failure-absorbing front end to a [`ChatProvider`].
#[derive(Clone)]
pub struct ModelAdapter {
    provider: Arc<dyn ChatProvider>,
    timeout: Duration,
}

impl ModelAdapter {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set the timeout applied to each model call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider(&self) -> &Arc<dyn ChatProvider> {
        &self.provider
    }

    /// Send the conversation and return the model's reply.
    ///
    /// Never fails: provider errors and timeouts come back as a reply whose
    /// content starts with `Error:` and which requests no tools, and so is a
    /// blank reply without tool requests. Content is never empty.
    pub async fn send(&self, messages: &[Message], tools: Option<&[ToolDefinition]>) -> ModelReply {
        if messages.is_empty() {
            return ModelReply::text("Error: conversation is empty");
        }

        debug!(
            provider = self.provider.name(),
            model = self.provider.model(),
            messages = messages.len(),
            "Sending conversation"
        );

        let outcome = match tokio::time::timeout(self.timeout, self.provider.complete(messages, tools)).await {
            Ok(result) => result,
            Err(_) => Err(LisearchError::Timeout(self.timeout.as_secs())),
        };

        match outcome {
            Ok(mut reply) => {
                if reply.content.trim().is_empty() {
                    if !reply.wants_tools() {
                        warn!("Empty reply from {}", self.provider.name());
                        return ModelReply::text(format!(
                            "Error: empty response from {}",
                            self.provider.name()
                        ));
                    }
                    reply.content = TOOL_CALL_PLACEHOLDER.to_string();
                }
                reply
            }
            Err(e) => {
                warn!("Error in {} chat: {}", self.provider.name(), e);
                ModelReply::text(format!("Error: {}", e))
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use serde_json::json;

    fn adapter(provider: ScriptedProvider) -> ModelAdapter {
        ModelAdapter::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn test_text_reply_passes_through() {
        let adapter = adapter(ScriptedProvider::new(vec![Ok(ModelReply::text("Hello"))]));
        let reply = adapter.send(&[Message::user("hi")], None).await;
        assert_eq!(reply, ModelReply::text("Hello"));
    }

    #[tokio::test]
    async fn test_placeholder_when_tools_requested_silently() {
        let adapter = adapter(ScriptedProvider::new(vec![Ok(tool_reply(vec![request(
            "get_low_stock_products",
            json!({}),
        )]))]));

        let reply = adapter.send(&[Message::user("low stock?")], None).await;
        assert_eq!(reply.content, TOOL_CALL_PLACEHOLDER);
        assert_eq!(reply.tool_requests.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_reply_without_tools_is_error_reply() {
        let adapter = adapter(ScriptedProvider::new(vec![Ok(ModelReply::text("  "))]));
        let reply = adapter.send(&[Message::user("hi")], None).await;
        assert_eq!(reply.content, "Error: empty response from scripted");
        assert!(reply.tool_requests.is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_becomes_error_reply() {
        let adapter = adapter(ScriptedProvider::new(vec![Err(LisearchError::Provider(
            "503 Service Unavailable".to_string(),
        ))]));

        let reply = adapter.send(&[Message::user("hi")], None).await;
        assert!(reply.content.starts_with("Error: "));
        assert!(reply.content.contains("503"));
        assert!(reply.tool_requests.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_becomes_error_reply() {
        let provider =
            ScriptedProvider::always(ModelReply::text("late")).with_delay(Duration::from_secs(5));
        let adapter = adapter(provider).with_timeout(Duration::from_millis(20));

        let reply = adapter.send(&[Message::user("hi")], None).await;
        assert!(reply.content.starts_with("Error: Request timed out"));
    }

    #[tokio::test]
    async fn test_empty_conversation_is_error_reply() {
        let provider = Arc::new(ScriptedProvider::default());
        let adapter = ModelAdapter::new(provider.clone());

        let reply = adapter.send(&[], None).await;
        assert!(reply.content.starts_with("Error:"));
        assert_eq!(provider.calls(), 0);
    }

    #[test]
    fn test_message_serde() {
        let message: Message = serde_json::from_value(json!({"role": "assistant", "content": "ok"})).unwrap();
        assert_eq!(message, Message::assistant("ok"));
        assert_eq!(serde_json::to_value(Message::system("s")).unwrap()["role"], json!("system"));
    }
}
