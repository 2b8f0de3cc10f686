// Anthropic Messages API provider, with extended thinking support.
//
// Thinking is requested as `{"type": "enabled", "budget_tokens": N}`; when
// enabled the vendor rejects a `temperature` field, which is why
// `LlmCallConfig::with_thinking` clears temperature at construction. The
// streamed response interleaves a `thinking` content block ahead of the
// `text` block; both are surfaced as distinct `LlmStreamEvent` variants so
// callers can render thinking separately from the answer.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};

use aria_core::error::{AriaError, Result};
use aria_core::llm::{
    LlmCallConfig, LlmCompletionMetadata, LlmContentPart, LlmMessage, LlmMessageContent,
    LlmMessageRole, LlmProvider, LlmResponseStream, LlmStreamEvent, ToolCall, ToolDefinition,
};

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    api_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Requires `ANTHROPIC_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            AriaError::invalid_input("ANTHROPIC_API_KEY environment variable not set")
        })?;
        Ok(Self::new(api_key))
    }

    pub fn with_base_url(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_url: api_url.into(),
        }
    }

    /// Anthropic splits system prompts out of the message list.
    fn split_system(messages: &[LlmMessage]) -> (Option<String>, Vec<&LlmMessage>) {
        let mut system = None;
        let mut rest = Vec::with_capacity(messages.len());
        for msg in messages {
            if msg.role == LlmMessageRole::System {
                let text = msg.content_as_text();
                system = Some(match system.take() {
                    Some(existing) => format!("{existing}\n\n{text}"),
                    None => text,
                });
            } else {
                rest.push(msg);
            }
        }
        (system, rest)
    }

    fn convert_message(msg: &LlmMessage) -> AnthropicMessage {
        let role = match msg.role {
            LlmMessageRole::User | LlmMessageRole::Tool => "user",
            LlmMessageRole::Assistant => "assistant",
            LlmMessageRole::System => unreachable!("system messages are split out"),
        };

        if let Some(tool_call_id) = &msg.tool_call_id {
            return AnthropicMessage {
                role: "user".to_string(),
                content: vec![AnthropicContentBlock::ToolResult {
                    tool_use_id: tool_call_id.clone(),
                    content: msg.content_as_text(),
                }],
            };
        }

        let mut content = match &msg.content {
            LlmMessageContent::Text(text) => {
                vec![AnthropicContentBlock::Text { text: text.clone() }]
            }
            LlmMessageContent::Parts(parts) => parts
                .iter()
                .map(|part| match part {
                    LlmContentPart::Text { text } => {
                        AnthropicContentBlock::Text { text: text.clone() }
                    }
                    LlmContentPart::Image { url } => AnthropicContentBlock::Image {
                        source: AnthropicImageSource {
                            r#type: "url".to_string(),
                            url: Some(url.clone()),
                            media_type: None,
                            data: None,
                        },
                    },
                    LlmContentPart::Audio { .. } => {
                        AnthropicContentBlock::Text { text: String::new() }
                    }
                })
                .collect(),
        };

        if let Some(tool_calls) = &msg.tool_calls {
            for tc in tool_calls {
                content.push(AnthropicContentBlock::ToolUse {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    input: tc.arguments.clone(),
                });
            }
        }

        AnthropicMessage {
            role: role.to_string(),
            content,
        }
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<AnthropicTool> {
        tools
            .iter()
            .map(|tool| AnthropicTool {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: tool.parameters.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn chat_completion_stream(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponseStream> {
        let (system, rest) = Self::split_system(&messages);
        let anthropic_messages: Vec<AnthropicMessage> =
            rest.into_iter().map(Self::convert_message).collect();

        let tools = if config.tools.is_empty() {
            None
        } else {
            Some(Self::convert_tools(&config.tools))
        };

        let thinking = config.thinking_effort.map(|effort| AnthropicThinking {
            r#type: "enabled".to_string(),
            budget_tokens: effort.token_budget(),
        });

        let request = AnthropicRequest {
            model: config.model.clone(),
            system,
            messages: anthropic_messages,
            max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            // The vendor rejects `temperature` alongside `thinking`; the
            // config builder already guarantees these are mutually exclusive.
            temperature: config.temperature,
            stream: true,
            tools,
            thinking,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AriaError::transient(format!("failed to reach Anthropic: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let err = format!("Anthropic API error ({status}): {body}");
            return Err(if status.as_u16() == 429 || status.is_server_error() {
                AriaError::transient(err)
            } else {
                AriaError::execution_failure(err)
            });
        }

        let model = config.model.clone();
        let state = Arc::new(Mutex::new(StreamState::default()));
        let event_stream = response.bytes_stream().eventsource();

        let converted: LlmResponseStream = Box::pin(event_stream.filter_map(move |result| {
            let model = model.clone();
            let state = Arc::clone(&state);

            async move {
                let event = match result {
                    Ok(event) => event,
                    Err(e) => return Some(Ok(LlmStreamEvent::Error(format!("stream error: {e}")))),
                };

                match event.event.as_str() {
                    "content_block_start" => {
                        let parsed: AnthropicContentBlockStart =
                            match serde_json::from_str(&event.data) {
                                Ok(v) => v,
                                Err(e) => {
                                    return Some(Ok(LlmStreamEvent::Error(format!(
                                        "failed to parse content_block_start: {e}"
                                    ))))
                                }
                            };
                        if parsed.content_block.r#type == "tool_use" {
                            let mut guard = state.lock().unwrap();
                            guard.current_tool = Some(ToolCall {
                                id: parsed.content_block.id.unwrap_or_default(),
                                name: parsed.content_block.name.unwrap_or_default(),
                                arguments: Value::String(String::new()),
                            });
                            guard.current_tool_json = String::new();
                        }
                        None
                    }
                    "content_block_delta" => {
                        let parsed: AnthropicContentBlockDelta =
                            match serde_json::from_str(&event.data) {
                                Ok(v) => v,
                                Err(e) => {
                                    return Some(Ok(LlmStreamEvent::Error(format!(
                                        "failed to parse content_block_delta: {e}"
                                    ))))
                                }
                            };
                        match parsed.delta {
                            AnthropicDelta::TextDelta { text } => {
                                Some(Ok(LlmStreamEvent::TextDelta(text)))
                            }
                            AnthropicDelta::ThinkingDelta { thinking } => {
                                Some(Ok(LlmStreamEvent::ThinkingDelta(thinking)))
                            }
                            AnthropicDelta::SignatureDelta { .. } => None,
                            AnthropicDelta::InputJsonDelta { partial_json } => {
                                let mut guard = state.lock().unwrap();
                                guard.current_tool_json.push_str(&partial_json);
                                None
                            }
                        }
                    }
                    "content_block_stop" => {
                        let mut guard = state.lock().unwrap();
                        if let Some(mut tool) = guard.current_tool.take() {
                            tool.arguments = serde_json::from_str(&guard.current_tool_json)
                                .unwrap_or(Value::Object(Default::default()));
                            guard.finished_tools.push(tool);
                        }
                        None
                    }
                    "message_delta" => {
                        let parsed: AnthropicMessageDelta = match serde_json::from_str(&event.data)
                        {
                            Ok(v) => v,
                            Err(e) => {
                                return Some(Ok(LlmStreamEvent::Error(format!(
                                    "failed to parse message_delta: {e}"
                                ))))
                            }
                        };
                        let mut guard = state.lock().unwrap();
                        if let Some(usage) = parsed.usage {
                            guard.output_tokens = usage.output_tokens;
                            guard.cache_read_tokens = usage.cache_read_input_tokens;
                            guard.cache_creation_tokens = usage.cache_creation_input_tokens;
                        }
                        guard.stop_reason = parsed.delta.stop_reason;
                        None
                    }
                    "message_stop" => {
                        let guard = state.lock().unwrap();
                        if !guard.finished_tools.is_empty() {
                            return Some(Ok(LlmStreamEvent::ToolCalls(
                                guard.finished_tools.clone(),
                            )));
                        }
                        Some(Ok(LlmStreamEvent::Done(LlmCompletionMetadata {
                            total_tokens: Some(guard.output_tokens),
                            prompt_tokens: None,
                            completion_tokens: Some(guard.output_tokens),
                            thinking_tokens: None,
                            cache_read_tokens: if guard.cache_read_tokens > 0 {
                                Some(guard.cache_read_tokens)
                            } else {
                                None
                            },
                            cache_creation_tokens: if guard.cache_creation_tokens > 0 {
                                Some(guard.cache_creation_tokens)
                            } else {
                                None
                            },
                            model: Some(model),
                            finish_reason: guard.stop_reason.clone(),
                        })))
                    }
                    _ => None,
                }
            }
        }));

        Ok(converted)
    }
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Default)]
struct StreamState {
    current_tool: Option<ToolCall>,
    current_tool_json: String,
    finished_tools: Vec<ToolCall>,
    output_tokens: u32,
    cache_read_tokens: u32,
    cache_creation_tokens: u32,
    stop_reason: Option<String>,
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking: Option<AnthropicThinking>,
}

#[derive(Debug, Serialize)]
struct AnthropicThinking {
    r#type: String,
    budget_tokens: u32,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    Image {
        source: AnthropicImageSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Serialize)]
struct AnthropicImageSource {
    r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlockStart {
    content_block: AnthropicContentBlockStartInner,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlockStartInner {
    r#type: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlockDelta {
    delta: AnthropicDelta,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicDelta {
    TextDelta { text: String },
    ThinkingDelta { thinking: String },
    SignatureDelta { signature: String },
    InputJsonDelta { partial_json: String },
}

#[derive(Debug, Deserialize)]
struct AnthropicMessageDelta {
    delta: AnthropicMessageDeltaInner,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize, Default)]
struct AnthropicMessageDeltaInner {
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct AnthropicUsage {
    #[serde(default)]
    output_tokens: u32,
    #[serde(default)]
    cache_read_input_tokens: u32,
    #[serde(default)]
    cache_creation_input_tokens: u32,
}
