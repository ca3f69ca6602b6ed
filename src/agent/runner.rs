//! Agent runner with tool calling loop.

use super::tools::{ToolRegistry, ToolResult};
use crate::error::{LisearchError, Result};
use crate::llm::{Message, ModelAdapter, ToolDefinition, ToolRequest};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of model calls per user message.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// Reply given when the model keeps requesting tools.
pub const FALLBACK_RESPONSE: &str =
    "I apologize, but I'm having trouble processing your request. Please try rephrasing.";

/// Agent that answers store questions by calling tools.
pub struct Agent {
    adapter: ModelAdapter,
    registry: Arc<ToolRegistry>,
    max_iterations: usize,
}

impl Agent {
    /// Create a new agent over the given model and tools.
    pub fn new(adapter: ModelAdapter, registry: Arc<ToolRegistry>) -> Self {
        Self {
            adapter,
            registry,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn adapter(&self) -> &ModelAdapter {
        &self.adapter
    }

    /// Answer `user_message` given the prior conversation, using every registered tool.
    pub async fn run(&self, user_message: &str, history: &[Message]) -> Result<OrchestrationResult> {
        self.run_with(
            user_message,
            history,
            Some(self.registry.definitions()),
            self.max_iterations,
        )
        .await
    }

    /// Run the tool calling loop.
    ///
    /// Each iteration makes one model call. A reply without tool requests
    /// ends the run; otherwise every requested tool runs in order and its
    /// result is appended to a working copy of the conversation as an
    /// `[Tool call: name]` assistant turn followed by a user turn carrying
    /// the rendered result. After `max_iterations` calls the run ends with
    /// [`FALLBACK_RESPONSE`] and `exhausted` set.
    pub async fn run_with(
        &self,
        user_message: &str,
        history: &[Message],
        tools: Option<&[ToolDefinition]>,
        max_iterations: usize,
    ) -> Result<OrchestrationResult> {
        if max_iterations == 0 {
            return Err(LisearchError::InvalidInput(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        let mut messages = history.to_vec();
        messages.push(Message::user(user_message));

        let mut tool_calls = Vec::new();
        let mut iterations = 0;

        while iterations < max_iterations {
            iterations += 1;
            debug!("Agent iteration {}", iterations);

            let reply = self.adapter.send(&messages, tools).await;

            if !reply.wants_tools() {
                return Ok(OrchestrationResult {
                    response: reply.content,
                    tool_calls,
                    iterations,
                    exhausted: false,
                });
            }

            for request in reply.tool_requests {
                let record = self.execute_tool_request(request).await;

                messages.push(Message::assistant(format!("[Tool call: {}]", record.name)));
                messages.push(Message::user(record.result.render(&record.name)));

                tool_calls.push(record);
            }
        }

        warn!(
            "Agent reached maximum iterations ({}) without a final answer",
            max_iterations
        );

        Ok(OrchestrationResult {
            response: FALLBACK_RESPONSE.to_string(),
            tool_calls,
            iterations,
            exhausted: true,
        })
    }

    /// Execute a single tool request and return a record of it.
    async fn execute_tool_request(&self, request: ToolRequest) -> ToolInvocationRecord {
        info!("Agent calling tool: {}", request.name);

        let result = self.registry.invoke(&request.name, &request.arguments).await;

        ToolInvocationRecord {
            name: request.name,
            arguments: request.arguments,
            result,
        }
    }
}

/// Result of one agent run.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestrationResult {
    /// The final text shown to the user.
    pub response: String,
    /// Every tool call made, in order.
    pub tool_calls: Vec<ToolInvocationRecord>,
    /// Number of model calls used.
    pub iterations: usize,
    /// True when the run hit the iteration limit.
    pub exhausted: bool,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInvocationRecord {
    pub name: String,
    pub arguments: Map<String, Value>,
    pub result: ToolResult,
}

impl std::fmt::Display for ToolInvocationRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, Value::Object(self.arguments.clone()))
    }
}
