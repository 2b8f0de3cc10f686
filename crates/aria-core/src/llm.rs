// Provider-agnostic LLM types, extended with an extended-thinking contract.
//
// A `LlmProvider` implementation (aria-openai, aria-anthropic) speaks
// whatever wire format its vendor uses; everything above this trait only
// ever sees these types.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::error::{AriaError, Result};

pub type LlmResponseStream = Pin<Box<dyn Stream<Item = Result<LlmStreamEvent>> + Send>>;

/// Events emitted while streaming a completion.
#[derive(Debug, Clone)]
pub enum LlmStreamEvent {
    /// Extended-thinking / reasoning text delta, emitted before any answer
    /// text when thinking is enabled.
    ThinkingDelta(String),
    /// Answer text delta.
    TextDelta(String),
    ToolCalls(Vec<ToolCall>),
    Done(LlmCompletionMetadata),
    Error(String),
}

#[derive(Debug, Clone, Default)]
pub struct LlmCompletionMetadata {
    pub total_tokens: Option<u32>,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    /// Reasoning/thinking tokens, either read from a dedicated usage field
    /// or estimated at ~4 characters per token from returned thinking text.
    pub thinking_tokens: Option<u32>,
    pub cache_read_tokens: Option<u32>,
    pub cache_creation_tokens: Option<u32>,
    pub model: Option<String>,
    pub finish_reason: Option<String>,
}

/// Estimate reasoning tokens from thinking text when the vendor doesn't
/// report a dedicated field (~4 chars/token).
pub fn estimate_thinking_tokens(thinking_text: &str) -> u32 {
    ((thinking_text.len() as f64) / 4.0).ceil() as u32
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat_completion_stream(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponseStream>;

    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> Result<LlmResponse> {
        use futures::StreamExt;

        let mut stream = self.chat_completion_stream(messages, config).await?;
        let mut text = String::new();
        let mut thinking = String::new();
        let mut tool_calls = Vec::new();
        let mut metadata = LlmCompletionMetadata::default();

        while let Some(event) = stream.next().await {
            match event? {
                LlmStreamEvent::ThinkingDelta(delta) => thinking.push_str(&delta),
                LlmStreamEvent::TextDelta(delta) => text.push_str(&delta),
                LlmStreamEvent::ToolCalls(calls) => tool_calls = calls,
                LlmStreamEvent::Done(meta) => metadata = meta,
                LlmStreamEvent::Error(err) => return Err(AriaError::transient(err)),
            }
        }

        if metadata.thinking_tokens.is_none() && !thinking.is_empty() {
            metadata.thinking_tokens = Some(estimate_thinking_tokens(&thinking));
        }

        Ok(LlmResponse {
            text,
            thinking: if thinking.is_empty() {
                None
            } else {
                Some(thinking)
            },
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
            metadata,
        })
    }
}

#[derive(Debug, Clone)]
pub struct LlmMessage {
    pub role: LlmMessageRole,
    pub content: LlmMessageContent,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub tool_call_id: Option<String>,
}

impl LlmMessage {
    pub fn text(role: LlmMessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: LlmMessageContent::Text(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn content_as_text(&self) -> String {
        self.content.to_text()
    }
}

#[derive(Debug, Clone)]
pub enum LlmMessageContent {
    Text(String),
    Parts(Vec<LlmContentPart>),
}

impl LlmMessageContent {
    pub fn to_text(&self) -> String {
        match self {
            LlmMessageContent::Text(s) => s.clone(),
            LlmMessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    LlmContentPart::Text { text } => Some(text.clone()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

impl From<String> for LlmMessageContent {
    fn from(s: String) -> Self {
        LlmMessageContent::Text(s)
    }
}

impl From<&str> for LlmMessageContent {
    fn from(s: &str) -> Self {
        LlmMessageContent::Text(s.to_string())
    }
}

#[derive(Debug, Clone)]
pub enum LlmContentPart {
    Text { text: String },
    Image { url: String },
    Audio { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmMessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// Extended-thinking effort tier. Maps to a fixed token budget; routine/
/// complex/critical are the only tiers the Cost Governor understands for
/// downgrade purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThinkingEffort {
    Routine,
    Complex,
    Critical,
}

impl ThinkingEffort {
    pub fn token_budget(self) -> u32 {
        match self {
            ThinkingEffort::Routine => 4_096,
            ThinkingEffort::Complex => 16_384,
            ThinkingEffort::Critical => 32_768,
        }
    }

    /// One tier down, used by the Cost Governor's soft-limit downgrade.
    /// `Routine` has no lower tier and downgrades to itself.
    pub fn downgrade(self) -> ThinkingEffort {
        match self {
            ThinkingEffort::Critical => ThinkingEffort::Complex,
            ThinkingEffort::Complex => ThinkingEffort::Routine,
            ThinkingEffort::Routine => ThinkingEffort::Routine,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Configuration for a single LLM call.
///
/// Invariant: when `thinking_effort` is `Some`, `temperature` MUST be
/// `None` — vendor APIs reject the two together. `with_thinking` and
/// `with_temperature` enforce this at construction.
#[derive(Debug, Clone)]
pub struct LlmCallConfig {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub tools: Vec<ToolDefinition>,
    pub thinking_effort: Option<ThinkingEffort>,
    /// Analytics-only tags. Never used for routing or budget decisions.
    pub agent_id: Option<String>,
    pub task_type: Option<String>,
}

impl LlmCallConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
            tools: Vec::new(),
            thinking_effort: None,
            agent_id: None,
            task_type: None,
        }
    }

    pub fn with_thinking(mut self, effort: ThinkingEffort) -> Self {
        self.thinking_effort = Some(effort);
        self.temperature = None;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        if self.thinking_effort.is_none() {
            self.temperature = Some(temperature);
        }
        self
    }

    pub fn with_tags(mut self, agent_id: impl Into<String>, task_type: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self.task_type = Some(task_type.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub thinking: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub metadata: LlmCompletionMetadata,
}
