// Environment-driven configuration, mirroring the `RunnerConfig::from_env`
// pattern this workspace uses elsewhere: plain env vars, typed accessors
// with sane defaults, no external config-file framework.

use std::env;

use crate::error::{AriaError, Result};
use crate::llm::ThinkingEffort;

/// Cost Governor configuration. Every field corresponds to one of the
/// `COST_GOVERNOR_*` environment variables.
#[derive(Debug, Clone)]
pub struct CostGovernorConfig {
    pub enabled: bool,
    pub daily_token_budget: u64,
    pub daily_thinking_budget: u64,
    pub soft_limit_percent: f64,
    pub max_retries_per_goal: u32,
    pub input_token_cost_per_m: f64,
    pub output_token_cost_per_m: f64,
    pub thinking_token_cost_per_m: f64,
}

impl Default for CostGovernorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_token_budget: 1_000_000,
            daily_thinking_budget: 500_000,
            soft_limit_percent: 0.8,
            max_retries_per_goal: 3,
            input_token_cost_per_m: 3.0,
            output_token_cost_per_m: 15.0,
            thinking_token_cost_per_m: 15.0,
        }
    }
}

impl CostGovernorConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            enabled: env_bool("COST_GOVERNOR_ENABLED", defaults.enabled)?,
            daily_token_budget: env_u64(
                "COST_GOVERNOR_DAILY_TOKEN_BUDGET",
                defaults.daily_token_budget,
            )?,
            daily_thinking_budget: env_u64(
                "COST_GOVERNOR_DAILY_THINKING_BUDGET",
                defaults.daily_thinking_budget,
            )?,
            soft_limit_percent: env_f64(
                "COST_GOVERNOR_SOFT_LIMIT_PERCENT",
                defaults.soft_limit_percent,
            )?,
            max_retries_per_goal: env_u32(
                "COST_GOVERNOR_MAX_RETRIES_PER_GOAL",
                defaults.max_retries_per_goal,
            )?,
            input_token_cost_per_m: env_f64(
                "COST_GOVERNOR_INPUT_TOKEN_COST_PER_M",
                defaults.input_token_cost_per_m,
            )?,
            output_token_cost_per_m: env_f64(
                "COST_GOVERNOR_OUTPUT_TOKEN_COST_PER_M",
                defaults.output_token_cost_per_m,
            )?,
            thinking_token_cost_per_m: env_f64(
                "COST_GOVERNOR_THINKING_TOKEN_COST_PER_M",
                defaults.thinking_token_cost_per_m,
            )?,
        })
    }

    /// Token budget for a given thinking effort tier, after downgrade has
    /// already been decided by the caller.
    pub fn thinking_budget(&self, effort: ThinkingEffort) -> u32 {
        effort.token_budget()
    }
}

/// Retry/backoff configuration for the LLM Gateway. Defaults match the
/// spec's "at most 3 attempts, exponential backoff" retry contract.
#[derive(Debug, Clone)]
pub struct GatewayRetryConfig {
    pub max_attempts: u32,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub backoff_coefficient: f64,
}

impl Default for GatewayRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval_ms: 500,
            max_interval_ms: 8_000,
            backoff_coefficient: 2.0,
        }
    }
}

/// Circuit breaker configuration for the LLM Gateway.
#[derive(Debug, Clone)]
pub struct GatewayCircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub reset_timeout_ms: u64,
}

impl Default for GatewayCircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            reset_timeout_ms: 30_000,
        }
    }
}

/// Bounds for the Agent Orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_tokens: u64,
    pub max_concurrent_agents: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_tokens: 200_000,
            max_concurrent_agents: 8,
        }
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool> {
    match env::var(key) {
        Ok(v) => match v.to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            other => Err(AriaError::config(format!(
                "invalid boolean for {key}: {other}"
            ))),
        },
        Err(_) => Ok(default),
    }
}

fn env_u64(key: &str, default: u64) -> Result<u64> {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .map_err(|_| AriaError::config(format!("invalid integer for {key}: {v}"))),
        Err(_) => Ok(default),
    }
}

fn env_u32(key: &str, default: u32) -> Result<u32> {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .map_err(|_| AriaError::config(format!("invalid integer for {key}: {v}"))),
        Err(_) => Ok(default),
    }
}

fn env_f64(key: &str, default: f64) -> Result<f64> {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .map_err(|_| AriaError::config(format!("invalid float for {key}: {v}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_scenario() {
        let cfg = CostGovernorConfig::default();
        assert_eq!(cfg.daily_token_budget, 1_000_000);
        assert_eq!(cfg.soft_limit_percent, 0.8);
        assert_eq!(cfg.max_retries_per_goal, 3);
    }

    #[test]
    fn thinking_budgets_match_contract() {
        assert_eq!(ThinkingEffort::Routine.token_budget(), 4_096);
        assert_eq!(ThinkingEffort::Complex.token_budget(), 16_384);
        assert_eq!(ThinkingEffort::Critical.token_budget(), 32_768);
    }

    #[test]
    fn downgrade_map_is_critical_complex_routine() {
        assert_eq!(ThinkingEffort::Critical.downgrade(), ThinkingEffort::Complex);
        assert_eq!(ThinkingEffort::Complex.downgrade(), ThinkingEffort::Routine);
        assert_eq!(ThinkingEffort::Routine.downgrade(), ThinkingEffort::Routine);
    }
}
