// Per-user token budget enforcement with soft degradation and hard cutoff.
//
// Ported from the original `CostGovernor` (backend/src/core/cost_governor.py):
// same downgrade map, same soft-limit default, same fail-open behavior
// around `record_usage`. Storage is abstracted behind `UsageStore` so this
// crate never touches sqlx directly.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::CostGovernorConfig;
use crate::error::Result;
use crate::llm::ThinkingEffort;

/// Today's accumulated usage for a single user.
#[derive(Debug, Clone, Default)]
pub struct UsageRecord {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub thinking_tokens: u64,
}

impl UsageRecord {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.thinking_tokens
    }
}

/// Derived (never persisted) view of a user's budget state.
#[derive(Debug, Clone)]
pub struct BudgetStatus {
    pub tokens_used_today: u64,
    pub daily_token_budget: u64,
    pub thinking_tokens_used_today: u64,
    pub daily_thinking_budget: u64,
    pub percent_used: f64,
    pub should_reduce_effort: bool,
    pub budget_exceeded: bool,
}

/// Storage seam for today's usage. `aria-storage` provides the
/// Postgres-backed implementation via `increment_usage_tracking`.
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn get_today_usage(&self, user_id: &str) -> Result<UsageRecord>;
    async fn increment_usage(
        &self,
        user_id: &str,
        input_tokens: u64,
        output_tokens: u64,
        thinking_tokens: u64,
    ) -> Result<()>;
}

pub struct CostGovernor {
    config: CostGovernorConfig,
    store: Arc<dyn UsageStore>,
    /// Process-local retry counters, keyed by goal id. Explicitly
    /// single-process per the spec's stated default; not shared across
    /// replicas.
    retry_counts: Mutex<HashMap<String, u32>>,
}

impl CostGovernor {
    pub fn new(config: CostGovernorConfig, store: Arc<dyn UsageStore>) -> Self {
        Self {
            config,
            store,
            retry_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Check whether `user_id` has budget remaining. Always returns
    /// "not exceeded, full effort" when the governor is disabled.
    pub async fn check_budget(&self, user_id: &str) -> Result<BudgetStatus> {
        if !self.config.enabled {
            return Ok(BudgetStatus {
                tokens_used_today: 0,
                daily_token_budget: self.config.daily_token_budget,
                thinking_tokens_used_today: 0,
                daily_thinking_budget: self.config.daily_thinking_budget,
                percent_used: 0.0,
                should_reduce_effort: false,
                budget_exceeded: false,
            });
        }

        let usage = self.store.get_today_usage(user_id).await.unwrap_or_default();
        let total = usage.total_tokens();
        let percent_used = if self.config.daily_token_budget == 0 {
            1.0
        } else {
            total as f64 / self.config.daily_token_budget as f64
        };

        let budget_exceeded = total >= self.config.daily_token_budget;
        // Soft-limit downgrade never blocks usage below 100%, even at 99%:
        // it only requests reduced effort on the *next* call.
        let should_reduce_effort =
            !budget_exceeded && percent_used >= self.config.soft_limit_percent;

        if should_reduce_effort {
            info!(user_id, percent_used, "cost governor: soft limit reached, requesting reduced effort");
        }
        if budget_exceeded {
            warn!(user_id, total_tokens = total, "cost governor: daily budget exceeded");
        }

        Ok(BudgetStatus {
            tokens_used_today: usage.input_tokens + usage.output_tokens,
            daily_token_budget: self.config.daily_token_budget,
            thinking_tokens_used_today: usage.thinking_tokens,
            daily_thinking_budget: self.config.daily_thinking_budget,
            percent_used,
            should_reduce_effort,
            budget_exceeded,
        })
    }

    /// Record tokens used. Fails open: a storage error here is logged and
    /// swallowed so a persistence hiccup never fails the chat turn that
    /// already produced a valid LLM response.
    pub async fn record_usage(
        &self,
        user_id: &str,
        input_tokens: u64,
        output_tokens: u64,
        thinking_tokens: u64,
    ) {
        if let Err(err) = self
            .store
            .increment_usage(user_id, input_tokens, output_tokens, thinking_tokens)
            .await
        {
            warn!(user_id, error = %err, "cost governor: failed to record usage, continuing");
        }
    }

    /// Resolve the thinking budget for a requested effort, downgrading one
    /// tier if the user is over the soft limit (but never below `Routine`,
    /// and never when the hard cutoff has already fired — that case is
    /// handled by `check_budget` returning `budget_exceeded`).
    pub fn get_thinking_budget(&self, requested: ThinkingEffort, status: &BudgetStatus) -> u32 {
        let effort = if status.should_reduce_effort {
            requested.downgrade()
        } else {
            requested
        };
        effort.token_budget()
    }

    pub async fn check_retry_budget(&self, goal_id: &str) -> bool {
        let counts = self.retry_counts.lock().await;
        counts.get(goal_id).copied().unwrap_or(0) < self.config.max_retries_per_goal
    }

    pub async fn record_retry(&self, goal_id: &str) {
        let mut counts = self.retry_counts.lock().await;
        *counts.entry(goal_id.to_string()).or_insert(0) += 1;
    }

    pub async fn clear_retry_count(&self, goal_id: &str) {
        let mut counts = self.retry_counts.lock().await;
        counts.remove(goal_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct FakeStore {
        usage: StdMutex<UsageRecord>,
    }

    #[async_trait]
    impl UsageStore for FakeStore {
        async fn get_today_usage(&self, _user_id: &str) -> Result<UsageRecord> {
            Ok(self.usage.lock().unwrap().clone())
        }

        async fn increment_usage(
            &self,
            _user_id: &str,
            input_tokens: u64,
            output_tokens: u64,
            thinking_tokens: u64,
        ) -> Result<()> {
            let mut usage = self.usage.lock().unwrap();
            usage.input_tokens += input_tokens;
            usage.output_tokens += output_tokens;
            usage.thinking_tokens += thinking_tokens;
            Ok(())
        }
    }

    fn governor_with(used: u64) -> CostGovernor {
        let store = Arc::new(FakeStore {
            usage: StdMutex::new(UsageRecord {
                input_tokens: used,
                output_tokens: 0,
                thinking_tokens: 0,
            }),
        });
        CostGovernor::new(CostGovernorConfig::default(), store)
    }

    #[tokio::test]
    async fn usage_at_850k_of_1m_requests_reduced_effort_not_exceeded() {
        let gov = governor_with(850_000);
        let status = gov.check_budget("user-1").await.unwrap();
        assert!(status.should_reduce_effort);
        assert!(!status.budget_exceeded);
        assert_eq!(gov.get_thinking_budget(ThinkingEffort::Critical, &status), 16_384);
    }

    #[tokio::test]
    async fn usage_over_budget_is_hard_cutoff() {
        let gov = governor_with(1_000_500);
        let status = gov.check_budget("user-1").await.unwrap();
        assert!(status.budget_exceeded);
    }

    #[tokio::test]
    async fn usage_at_99_percent_still_allows_calls() {
        let gov = governor_with(999_000);
        let status = gov.check_budget("user-1").await.unwrap();
        assert!(!status.budget_exceeded);
        assert!(status.should_reduce_effort);
    }

    #[tokio::test]
    async fn retry_budget_caps_at_configured_max() {
        let gov = governor_with(0);
        for _ in 0..3 {
            assert!(gov.check_retry_budget("goal-1").await);
            gov.record_retry("goal-1").await;
        }
        assert!(!gov.check_retry_budget("goal-1").await);
        gov.clear_retry_count("goal-1").await;
        assert!(gov.check_retry_budget("goal-1").await);
    }

    #[tokio::test]
    async fn disabled_governor_never_blocks() {
        let store = Arc::new(FakeStore {
            usage: StdMutex::new(UsageRecord {
                input_tokens: 10_000_000,
                output_tokens: 0,
                thinking_tokens: 0,
            }),
        });
        let mut config = CostGovernorConfig::default();
        config.enabled = false;
        let gov = CostGovernor::new(config, store);
        let status = gov.check_budget("user-1").await.unwrap();
        assert!(!status.budget_exceeded);
        assert!(!status.should_reduce_effort);
    }
}
