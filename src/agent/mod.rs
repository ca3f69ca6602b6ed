//! Tool-calling agent for store questions.
//!
//! The model sees the store tools from [`tool_definitions`]; the
//! [`ToolRegistry`] runs what it asks for, and the [`Agent`] loops until
//! the model answers in plain text or the iteration budget runs out.

mod definitions;
mod runner;
mod tools;

pub use definitions::tool_definitions;
pub use runner::{
    Agent, OrchestrationResult, ToolInvocationRecord, DEFAULT_MAX_ITERATIONS, FALLBACK_RESPONSE,
};
pub use tools::{parse_tool_request, StoreTool, ToolRegistry, ToolResult};
