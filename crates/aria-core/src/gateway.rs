// LLM Gateway: the single path every caller uses to talk to a vendor model.
// Mediates budget (Cost Governor), availability (circuit breaker) and
// transient-failure recovery (retry policy) so nothing upstream has to.

use std::sync::Arc;
use tracing::{info, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::cost_governor::CostGovernor;
use crate::error::{AriaError, Result};
use crate::llm::{
    LlmCallConfig, LlmMessage, LlmProvider, LlmResponse, LlmResponseStream, ThinkingEffort,
};
use crate::retry::RetryPolicy;

pub struct LlmGateway<P: LlmProvider> {
    provider: Arc<P>,
    cost_governor: Arc<CostGovernor>,
    circuit_breaker: Arc<CircuitBreaker>,
    retry_policy: RetryPolicy,
}

impl<P: LlmProvider> LlmGateway<P> {
    pub fn new(
        provider: Arc<P>,
        cost_governor: Arc<CostGovernor>,
        circuit_breaker: Arc<CircuitBreaker>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            cost_governor,
            circuit_breaker,
            retry_policy,
        }
    }

    /// Generate a completion with no extended thinking.
    pub async fn generate(
        &self,
        user_id: &str,
        messages: Vec<LlmMessage>,
        config: LlmCallConfig,
    ) -> Result<LlmResponse> {
        self.generate_inner(user_id, messages, config).await
    }

    /// Generate a completion with extended thinking at the requested
    /// effort tier, downgraded one tier if the user is over the soft
    /// limit. Returns `BudgetExceeded` if the hard cutoff has fired.
    pub async fn generate_with_thinking(
        &self,
        user_id: &str,
        messages: Vec<LlmMessage>,
        mut config: LlmCallConfig,
        effort: ThinkingEffort,
    ) -> Result<LlmResponse> {
        let status = self.cost_governor.check_budget(user_id).await?;
        if status.budget_exceeded {
            return Err(AriaError::budget_exceeded(format!(
                "user {user_id} has exhausted today's token budget"
            )));
        }

        let resolved_budget = self.cost_governor.get_thinking_budget(effort, &status);
        let resolved_effort = if resolved_budget < effort.token_budget() {
            effort.downgrade()
        } else {
            effort
        };
        config = config.with_thinking(resolved_effort);

        self.generate_inner(user_id, messages, config).await
    }

    /// Streaming variant. Budget/circuit/retry checks happen before the
    /// stream is opened; once streaming starts, failures surface as stream
    /// errors rather than being retried (a partial stream can't be safely
    /// replayed to the caller).
    pub async fn stream(
        &self,
        user_id: &str,
        messages: Vec<LlmMessage>,
        config: LlmCallConfig,
    ) -> Result<LlmResponseStream> {
        let status = self.cost_governor.check_budget(user_id).await?;
        if status.budget_exceeded {
            return Err(AriaError::budget_exceeded(format!(
                "user {user_id} has exhausted today's token budget"
            )));
        }

        let permit = self.circuit_breaker.acquire()?;
        match self.provider.chat_completion_stream(messages, &config).await {
            Ok(stream) => {
                permit.success();
                Ok(stream)
            }
            Err(err) => {
                permit.failure();
                Err(err)
            }
        }
    }

    async fn generate_inner(
        &self,
        user_id: &str,
        messages: Vec<LlmMessage>,
        config: LlmCallConfig,
    ) -> Result<LlmResponse> {
        let status = self.cost_governor.check_budget(user_id).await?;
        if status.budget_exceeded {
            return Err(AriaError::budget_exceeded(format!(
                "user {user_id} has exhausted today's token budget"
            )));
        }

        let mut attempt = 1;
        loop {
            let permit = self.circuit_breaker.acquire()?;
            let result = self.provider.chat_completion(messages.clone(), &config).await;

            match result {
                Ok(response) => {
                    permit.success();
                    self.cost_governor
                        .record_usage(
                            user_id,
                            response.metadata.prompt_tokens.unwrap_or(0) as u64,
                            response.metadata.completion_tokens.unwrap_or(0) as u64,
                            response.metadata.thinking_tokens.unwrap_or(0) as u64,
                        )
                        .await;
                    return Ok(response);
                }
                Err(err) => {
                    permit.failure();

                    if !err.is_retryable() || !self.retry_policy.has_attempts_remaining(attempt) {
                        warn!(user_id, attempt, error = %err, "llm gateway: call failed, not retrying");
                        return Err(err);
                    }

                    let delay = self.retry_policy.delay_for_attempt(attempt + 1);
                    info!(user_id, attempt, delay_ms = delay.as_millis() as u64, "llm gateway: retrying after transient error");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
