// Picks the single concrete `LlmProvider` this deployment talks to and
// wraps it behind the `LlmGateway` the chat route calls through.
//
// `LlmGateway<P>` is generic over one provider type (budget/circuit/retry
// are provider-agnostic collaborators); this enum gives it one concrete
// type to be generic over while still letting the deployment choose
// OpenAI or Anthropic at startup via `ARIA_LLM_PROVIDER`.

use std::sync::Arc;

use anyhow::{bail, Result};
use aria_anthropic::AnthropicProvider;
use aria_core::error::{AriaError, Result as AriaResult};
use aria_core::llm::{LlmCallConfig, LlmMessage, LlmProvider, LlmResponseStream};
use aria_openai::OpenAiProvider;
use async_trait::async_trait;

#[derive(Clone)]
pub enum AnyLlmProvider {
    OpenAi(OpenAiProvider),
    Anthropic(AnthropicProvider),
}

#[async_trait]
impl LlmProvider for AnyLlmProvider {
    async fn chat_completion_stream(
        &self,
        messages: Vec<LlmMessage>,
        config: &LlmCallConfig,
    ) -> AriaResult<LlmResponseStream> {
        match self {
            AnyLlmProvider::OpenAi(p) => p.chat_completion_stream(messages, config).await,
            AnyLlmProvider::Anthropic(p) => p.chat_completion_stream(messages, config).await,
        }
    }
}

/// Builds the configured provider from `ARIA_LLM_PROVIDER` (`openai` |
/// `anthropic`, default `anthropic` since it's the thinking-capable one).
pub fn provider_from_env() -> Result<AnyLlmProvider> {
    let choice = std::env::var("ARIA_LLM_PROVIDER").unwrap_or_else(|_| "anthropic".to_string());
    match choice.to_lowercase().as_str() {
        "openai" => Ok(AnyLlmProvider::OpenAi(
            OpenAiProvider::from_env().map_err(to_anyhow)?,
        )),
        "anthropic" => Ok(AnyLlmProvider::Anthropic(
            AnthropicProvider::from_env().map_err(to_anyhow)?,
        )),
        other => bail!("unknown ARIA_LLM_PROVIDER: {other}"),
    }
}

fn to_anyhow(err: AriaError) -> anyhow::Error {
    anyhow::anyhow!(err.to_string())
}

pub type Gateway = aria_core::LlmGateway<AnyLlmProvider>;

pub fn default_chat_model(provider: &AnyLlmProvider) -> &'static str {
    match provider {
        AnyLlmProvider::OpenAi(_) => "gpt-4o",
        AnyLlmProvider::Anthropic(_) => "claude-sonnet-4-5",
    }
}

pub fn new_gateway(
    provider: AnyLlmProvider,
    cost_governor: Arc<aria_core::CostGovernor>,
    circuit_breaker: Arc<aria_core::CircuitBreaker>,
    retry_policy: aria_core::RetryPolicy,
) -> Gateway {
    aria_core::LlmGateway::new(Arc::new(provider), cost_governor, circuit_breaker, retry_policy)
}
