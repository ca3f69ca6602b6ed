//! Google Gemini provider over the Generative Language REST API.

use super::{ChatProvider, Message, ModelReply, Role, ToolDefinition, ToolRequest};
use crate::error::{LisearchError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Public Gemini API endpoint.
pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";

/// Gemini chat provider.
pub struct GeminiProvider {
    http: reqwest::Client,
    base: String,
    model: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: &str, base: Option<&str>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base: base
                .unwrap_or(DEFAULT_GEMINI_BASE)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base, self.model)
    }
}

/// Build a `generateContent` request body.
///
/// System turns are joined into `systemInstruction`; assistant turns are
/// sent with the `model` role.
pub(crate) fn build_payload(messages: &[Message], tools: Option<&[ToolDefinition]>) -> Value {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for message in messages {
        match message.role {
            Role::System => system_parts.push(message.content.as_str()),
            Role::User => contents.push(json!({
                "role": "user",
                "parts": [{"text": message.content}]
            })),
            Role::Assistant => contents.push(json!({
                "role": "model",
                "parts": [{"text": message.content}]
            })),
        }
    }

    let mut payload = json!({ "contents": contents });

    if !system_parts.is_empty() {
        payload["systemInstruction"] = json!({
            "parts": [{"text": system_parts.join("\n\n")}]
        });
    }

    if let Some(tools) = tools.filter(|t| !t.is_empty()) {
        let declarations: Vec<Value> = tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                })
            })
            .collect();
        payload["tools"] = json!([{ "functionDeclarations": declarations }]);
    }

    payload
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    args: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Collect text and function calls from every candidate.
pub(crate) fn parse_response(body: Value) -> Result<ModelReply> {
    let response: GenerateContentResponse = serde_json::from_value(body)?;

    if response.candidates.is_empty() {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(LisearchError::Provider(format!(
                "Prompt blocked by Gemini: {}",
                reason
            )));
        }
    }

    let mut reply = ModelReply::default();
    for part in response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
    {
        if let Some(call) = part.function_call {
            reply.tool_requests.push(ToolRequest {
                name: call.name,
                arguments: call.args.unwrap_or_default(),
            });
        }
        if let Some(text) = part.text {
            reply.content.push_str(&text);
        }
    }

    Ok(reply)
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
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
        let payload = build_payload(messages, tools);

        info!(messages = messages.len(), "Sending request to Gemini");

        let response = self
            .http
            .post(self.generate_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LisearchError::Provider(format!("{}: {}", status, body)));
        }

        let body: Value = response.json().await?;
        let reply = parse_response(body)?;
        debug!(
            tool_requests = reply.tool_requests.len(),
            "Received response from Gemini"
        );
        Ok(reply)
    }
}
