//! Conversation state for interactive front ends.
//!
//! A [`ChatSession`] keeps the visible transcript and decides how much of
//! it the agent sees on each turn.

use crate::agent::{Agent, OrchestrationResult};
use crate::error::Result;
use crate::llm::{Message, Role};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Default number of transcript turns kept in the model's context.
pub const DEFAULT_HISTORY_TURNS: usize = 10;

/// A tool call as shown in debug views.
#[derive(Debug, Clone, Serialize)]
pub struct ToolUse {
    pub name: String,
    pub args: Map<String, Value>,
}

/// Per-turn diagnostics for an assistant reply.
#[derive(Debug, Clone, Serialize)]
pub struct DebugInfo {
    pub iterations: usize,
    pub tools_used: Vec<ToolUse>,
}

impl From<&OrchestrationResult> for DebugInfo {
    fn from(result: &OrchestrationResult) -> Self {
        Self {
            iterations: result.iterations,
            tools_used: result
                .tool_calls
                .iter()
                .map(|call| ToolUse {
                    name: call.name.clone(),
                    args: call.arguments.clone(),
                })
                .collect(),
        }
    }
}

/// One visible turn of the conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

/// A user's conversation with the assistant.
#[derive(Debug, Clone)]
pub struct ChatSession {
    system_prompt: String,
    history_turns: usize,
    transcript: Vec<Turn>,
}

impl ChatSession {
    pub fn new(system_prompt: impl Into<String>, history_turns: usize) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            history_turns,
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    /// Forget the conversation.
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Context sent with a new message: the system prompt, then the most
    /// recent turns. The window of `history_turns` includes the new message.
    pub fn history(&self) -> Vec<Message> {
        let keep = self.history_turns.saturating_sub(1);
        let start = self.transcript.len().saturating_sub(keep);

        std::iter::once(Message::system(self.system_prompt.clone()))
            .chain(self.transcript[start..].iter().map(|turn| Message {
                role: turn.role,
                content: turn.content.clone(),
            }))
            .collect()
    }

    /// Send a message through the agent and record both turns.
    ///
    /// If the agent rejects the run, the error is recorded as the
    /// assistant's turn and returned.
    pub async fn send(&mut self, agent: &Agent, text: &str) -> Result<OrchestrationResult> {
        let history = self.history();
        debug!(context = history.len(), "Sending chat message");

        let outcome = agent.run(text, &history).await;

        self.transcript.push(Turn {
            role: Role::User,
            content: text.to_string(),
            debug: None,
        });

        match &outcome {
            Ok(result) => self.transcript.push(Turn {
                role: Role::Assistant,
                content: result.response.clone(),
                debug: Some(DebugInfo::from(result)),
            }),
            Err(e) => self.transcript.push(Turn {
                role: Role::Assistant,
                content: format!("❌ Error: {}", e),
                debug: None,
            }),
        }

        outcome
    }
}
