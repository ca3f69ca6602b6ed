//! OpenAI chat completions provider.

use super::{ChatProvider, Message, ModelReply, Role, ToolDefinition, ToolRequest};
use crate::error::{LisearchError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionObject,
};
use async_openai::Client;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// OpenAI (or OpenAI-compatible) chat provider.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str, api_base: Option<&str>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(api_key, api_base, timeout)?,
            model: model.to_string(),
        })
    }
}

/// Create an OpenAI client whose HTTP requests time out after `timeout`.
pub fn create_client(
    api_key: &str,
    api_base: Option<&str>,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = api_base {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

fn openai_error(e: impl std::fmt::Display) -> LisearchError {
    LisearchError::OpenAI(e.to_string())
}

fn to_request_messages(messages: &[Message]) -> Result<Vec<ChatCompletionRequestMessage>> {
    messages
        .iter()
        .map(|message| {
            let converted: ChatCompletionRequestMessage = match message.role {
                Role::System => ChatCompletionRequestSystemMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map_err(openai_error)?
                    .into(),
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map_err(openai_error)?
                    .into(),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map_err(openai_error)?
                    .into(),
            };
            Ok(converted)
        })
        .collect()
}

/// Tool definitions in OpenAI's `function` tool format.
pub(crate) fn to_openai_tools(tools: &[ToolDefinition]) -> Vec<ChatCompletionTool> {
    tools
        .iter()
        .map(|tool| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(tool.parameters.clone()),
                strict: None,
            },
        })
        .collect()
}

/// Parse a tool call's JSON argument string.
///
/// Anything that is not a JSON object is kept under `_raw`.
pub(crate) fn parse_arguments(arguments: &str) -> Map<String, Value> {
    if arguments.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(arguments) {
        Ok(Value::Object(map)) => map,
        _ => {
            let mut map = Map::new();
            map.insert("_raw".to_string(), Value::String(arguments.to_string()));
            map
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ModelReply> {
        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(&self.model)
            .messages(to_request_messages(messages)?);
        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            request.tools(to_openai_tools(tools));
        }
        let request = request.build().map_err(openai_error)?;

        info!(messages = messages.len(), "Sending request to OpenAI");

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LisearchError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LisearchError::OpenAI("No response from model".to_string()))?;

        let tool_requests = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolRequest {
                arguments: parse_arguments(&call.function.arguments),
                name: call.function.name,
            })
            .collect::<Vec<_>>();
        debug!(tool_requests = tool_requests.len(), "Received response from OpenAI");

        Ok(ModelReply {
            content: choice.message.content.unwrap_or_default(),
            tool_requests,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_arguments() {
        let args = parse_arguments(r#"{"category": "Wine", "limit": 5}"#);
        assert_eq!(args["limit"], json!(5));

        assert!(parse_arguments("").is_empty());

        let args = parse_arguments("{not json");
        assert_eq!(args["_raw"], json!("{not json"));

        let args = parse_arguments("[1, 2]");
        assert!(args.contains_key("_raw"));
    }

    #[test]
    fn test_tool_format() {
        let tools = to_openai_tools(&[ToolDefinition {
            name: "get_recent_transactions".to_string(),
            description: "Recent sales".to_string(),
            parameters: json!({"type": "object", "properties": {"limit": {"type": "integer"}}}),
        }]);

        let value = serde_json::to_value(&tools).unwrap();
        assert_eq!(value[0]["type"], json!("function"));
        assert_eq!(value[0]["function"]["name"], json!("get_recent_transactions"));
        assert_eq!(
            value[0]["function"]["parameters"]["properties"]["limit"]["type"],
            json!("integer")
        );
    }

    #[test]
    fn test_request_messages_keep_roles() {
        let messages = to_request_messages(&[
            Message::system("s"),
            Message::user("u"),
            Message::assistant("a"),
        ])
        .unwrap();

        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
    }

    #[test]
    fn test_create_client_with_base() {
        assert!(create_client("sk-test", Some("http://localhost:8080/v1"), Duration::from_secs(5)).is_ok());
    }
}
