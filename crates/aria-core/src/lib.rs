// Agentic Execution Core
//
// Cognitive-friction-gated chat routing, planning/dispatch to specialized
// agents, per-user token budgets with soft degradation and hard cutoff, and
// the LLM Gateway every vendor call flows through.
//
// Key design decisions:
// - Storage is reached only through traits (UsageStore) so this crate never
//   links sqlx directly.
// - The Cost Governor, circuit breaker and retry policy are explicit
//   collaborators passed into the Gateway, not globals.
// - Agent inputs are a closed `AgentTask` enum, not a dynamically-typed
//   payload: a malformed task can't be constructed.

pub mod agent;
pub mod circuit_breaker;
pub mod config;
pub mod cost_governor;
pub mod error;
pub mod gateway;
pub mod llm;
pub mod orchestrator;
pub mod retry;
pub mod workflow;

pub use agent::{
    Agent, AgentKind, AgentResult, AgentTask, AnalystTask, HunterTask, OperatorTask, ScoutTask,
    ScribeTask, StrategistTask, VerifierTask,
};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerPermit, CircuitState};
pub use config::{CostGovernorConfig, GatewayCircuitBreakerConfig, GatewayRetryConfig, OrchestratorConfig};
pub use cost_governor::{BudgetStatus, CostGovernor, UsageRecord, UsageStore};
pub use error::{AriaError, Result};
pub use gateway::LlmGateway;
pub use llm::{
    estimate_thinking_tokens, LlmCallConfig, LlmCompletionMetadata, LlmContentPart, LlmMessage,
    LlmMessageContent, LlmMessageRole, LlmProvider, LlmResponse, LlmResponseStream,
    LlmStreamEvent, ThinkingEffort, ToolCall, ToolDefinition,
};
pub use orchestrator::{AgentOrchestrator, OrchestrationResult};
pub use retry::RetryPolicy;
pub use workflow::{run_workflow, ApprovalCallback, OnFailure, StepOutcome, StepStatus, WorkflowResult, WorkflowStep};
