// OpenAI Chat Completions provider.
//
// Implements `LlmProvider` against the OpenAI-compatible chat completions
// endpoint. Supports streaming text, tool calls and usage accounting. Does
// not support extended thinking — `LlmCallConfig::thinking_effort` is
// ignored here (Anthropic is the thinking-capable provider).

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex};

use aria_core::error::{AriaError, Result};
use aria_core::llm::{
    LlmCallConfig, LlmCompletionMetadata, LlmContentPart, LlmMessage, LlmMessageContent,
    LlmMessageRole, LlmProvider, LlmResponseStream, LlmStreamEvent, ToolCall, ToolDefinition,
};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    api_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Requires `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AriaError::invalid_input("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key))
    }

    pub fn with_base_url(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_url: api_url.into(),
        }
    }

    fn convert_role(role: &LlmMessageRole) -> &'static str {
        match role {
            LlmMessageRole::System => "system",
            LlmMessageRole::User => "user",
            LlmMessageRole::Assistant => "assistant",
            LlmMessageRole::Tool => "tool",
        }
    }

    fn convert_message(msg: &LlmMessage) -> OpenAiMessage {
        let content = match &msg.content {
            LlmMessageContent::Text(text) => OpenAiContent::Text(text.clone()),
            LlmMessageContent::Parts(parts) => {
                let parts = parts
                    .iter()
                    .map(|part| match part {
                        LlmContentPart::Text { text } => OpenAiContentPart::Text {
                            r#type: "text".to_string(),
                            text: text.clone(),
                        },
                        LlmContentPart::Image { url } => OpenAiContentPart::ImageUrl {
                            r#type: "image_url".to_string(),
                            image_url: OpenAiImageUrl { url: url.clone() },
                        },
                        LlmContentPart::Audio { url } => OpenAiContentPart::InputAudio {
                            r#type: "input_audio".to_string(),
                            input_audio: OpenAiInputAudio {
                                data: url.clone(),
                                format: "wav".to_string(),
                            },
                        },
                    })
                    .collect();
                OpenAiContent::Parts(parts)
            }
        };

        OpenAiMessage {
            role: Self::convert_role(&msg.role).to_string(),
            content: Some(content),
            tool_calls: msg.tool_calls.as_ref().map(|calls| {
                calls
                    .iter()
                    .map(|tc| OpenAiToolCall {
                        id: tc.id.clone(),
                        r#type: "function".to_string(),
                        function: OpenAiFunctionCall {
                            name: tc.name.clone(),
                            arguments: serde_json::to_string(&tc.arguments).unwrap_or_default(),
                        },
                    })
                    .collect()
            }),
            tool_call_id: msg.tool_call_id.clone(),
        }
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .map(|tool| OpenAiTool {
                r#type: "function".to_string(),
                function: OpenAiFunction {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                },
            })
            .collect()
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat_completion_stream(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponseStream> {
        let openai_messages: Vec<OpenAiMessage> =
            messages.iter().map(Self::convert_message).collect();

        let tools = if config.tools.is_empty() {
            None
        } else {
            Some(Self::convert_tools(&config.tools))
        };

        let request = OpenAiRequest {
            model: config.model.clone(),
            messages: openai_messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            stream: true,
            tools,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AriaError::transient(format!("failed to reach OpenAI: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let err = format!("OpenAI API error ({status}): {body}");
            return Err(if status.as_u16() == 429 || status.is_server_error() {
                AriaError::transient(err)
            } else {
                AriaError::execution_failure(err)
            });
        }

        let model = config.model.clone();
        let total_tokens = Arc::new(Mutex::new(0u32));
        let accumulated_tool_calls = Arc::new(Mutex::new(Vec::<ToolCall>::new()));
        let event_stream = response.bytes_stream().eventsource();

        let converted: LlmResponseStream = Box::pin(event_stream.then(move |result| {
            let model = model.clone();
            let total_tokens = Arc::clone(&total_tokens);
            let accumulated_tool_calls = Arc::clone(&accumulated_tool_calls);

            async move {
                let event = match result {
                    Ok(event) => event,
                    Err(e) => return Ok(LlmStreamEvent::Error(format!("stream error: {e}"))),
                };

                if event.data == "[DONE]" {
                    let tokens = *total_tokens.lock().unwrap();
                    return Ok(LlmStreamEvent::Done(LlmCompletionMetadata {
                        total_tokens: Some(tokens),
                        prompt_tokens: None,
                        completion_tokens: Some(tokens),
                        thinking_tokens: None,
                        cache_read_tokens: None,
                        cache_creation_tokens: None,
                        model: Some(model),
                        finish_reason: Some("stop".to_string()),
                    }));
                }

                let chunk: OpenAiStreamChunk = match serde_json::from_str(&event.data) {
                    Ok(chunk) => chunk,
                    Err(e) => return Ok(LlmStreamEvent::Error(format!("failed to parse chunk: {e}"))),
                };

                let Some(choice) = chunk.choices.first() else {
                    return Ok(LlmStreamEvent::TextDelta(String::new()));
                };

                if let Some(deltas) = &choice.delta.tool_calls {
                    let mut acc = accumulated_tool_calls.lock().unwrap();
                    for tc in deltas {
                        let idx = tc.index as usize;
                        while acc.len() <= idx {
                            acc.push(ToolCall {
                                id: String::new(),
                                name: String::new(),
                                arguments: json!(""),
                            });
                        }
                        if let Some(id) = &tc.id {
                            acc[idx].id = id.clone();
                        }
                        if let Some(function) = &tc.function {
                            if let Some(name) = &function.name {
                                acc[idx].name = name.clone();
                            }
                            if let Some(args) = &function.arguments {
                                let current = acc[idx].arguments.as_str().unwrap_or("");
                                acc[idx].arguments = json!(format!("{current}{args}"));
                            }
                        }
                    }
                    return Ok(LlmStreamEvent::TextDelta(String::new()));
                }

                if let Some(content) = &choice.delta.content {
                    *total_tokens.lock().unwrap() += 1;
                    return Ok(LlmStreamEvent::TextDelta(content.clone()));
                }

                if let Some(finish_reason) = &choice.finish_reason {
                    let tokens = *total_tokens.lock().unwrap();

                    if finish_reason == "tool_calls" {
                        let raw = accumulated_tool_calls.lock().unwrap().clone();
                        if !raw.is_empty() {
                            let parsed = raw
                                .into_iter()
                                .map(|mut tc| {
                                    if let Some(s) = tc.arguments.as_str() {
                                        tc.arguments = serde_json::from_str(s).unwrap_or(json!({}));
                                    }
                                    tc
                                })
                                .collect();
                            return Ok(LlmStreamEvent::ToolCalls(parsed));
                        }
                    }

                    return Ok(LlmStreamEvent::Done(LlmCompletionMetadata {
                        total_tokens: Some(tokens),
                        prompt_tokens: None,
                        completion_tokens: Some(tokens),
                        thinking_tokens: None,
                        cache_read_tokens: None,
                        cache_creation_tokens: None,
                        model: Some(model),
                        finish_reason: Some(finish_reason.clone()),
                    }));
                }

                Ok(LlmStreamEvent::TextDelta(String::new()))
            }
        }));

        Ok(converted)
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum OpenAiContent {
    Text(String),
    Parts(Vec<OpenAiContentPart>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum OpenAiContentPart {
    Text {
        r#type: String,
        text: String,
    },
    ImageUrl {
        r#type: String,
        image_url: OpenAiImageUrl,
    },
    InputAudio {
        r#type: String,
        input_audio: OpenAiInputAudio,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiImageUrl {
    url: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiInputAudio {
    data: String,
    format: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<OpenAiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiTool {
    r#type: String,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    r#type: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiStreamToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamToolCall {
    index: u32,
    id: Option<String>,
    function: Option<OpenAiStreamFunction>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamFunction {
    name: Option<String>,
    arguments: Option<String>,
}
