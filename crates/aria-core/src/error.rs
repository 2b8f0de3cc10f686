// Error taxonomy for the Agentic Execution Core.
//
// Every fallible operation in this crate returns `Result<T>` with one of the
// variants below. Propagation/recovery rules live at each call site, not
// here: this module only defines the shape of the taxonomy.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias used throughout the core.
pub type Result<T> = std::result::Result<T, AriaError>;

/// Errors produced by the Agentic Execution Core.
#[derive(Debug, Error)]
pub enum AriaError {
    /// A user (or the process as a whole) has exhausted its token budget.
    /// Recovered by the caller as a polite "limit reached" message, never
    /// surfaced as a raw error string.
    #[error("budget exceeded: {0}")]
    BudgetExceeded(String),

    /// The circuit breaker guarding a downstream dependency is open.
    #[error("circuit open: {0}")]
    CircuitOpen(String),

    /// A transient failure (timeout, 5xx, connection reset) that the retry
    /// policy may retry.
    #[error("transient error: {0}")]
    TransientError(String),

    /// Caller-supplied input failed validation before any work began.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A unit of work (agent task, job invocation) ran and failed; this is
    /// a normal outcome, not a crash.
    #[error("execution failed: {0}")]
    ExecutionFailure(String),

    /// A referenced entity (user, agent, run) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Sanitization detected the model attempting to leak instructions,
    /// credentials, or other sandboxed content. Logged, not blocking,
    /// per the current policy.
    #[error("leakage detected: {0}")]
    Leakage(String),

    /// A sandboxed capability attempted an action outside its granted
    /// scope.
    #[error("sandbox violation: {0}")]
    SandboxViolation(String),

    /// Loop or job terminated due to a hard iteration/step cap.
    #[error("max iterations ({0}) reached")]
    MaxIterationsReached(usize),

    /// Work was cancelled by its caller.
    #[error("cancelled")]
    Cancelled,

    /// Agent not found in the registry.
    #[error("agent not found: {0}")]
    AgentNotFound(Uuid),

    /// Configuration error (missing/invalid environment variable, etc).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Anything else, wrapped from `anyhow`.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AriaError {
    pub fn budget_exceeded(msg: impl Into<String>) -> Self {
        AriaError::BudgetExceeded(msg.into())
    }

    pub fn circuit_open(msg: impl Into<String>) -> Self {
        AriaError::CircuitOpen(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        AriaError::TransientError(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        AriaError::InvalidInput(msg.into())
    }

    pub fn execution_failure(msg: impl Into<String>) -> Self {
        AriaError::ExecutionFailure(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AriaError::NotFound(msg.into())
    }

    pub fn leakage(msg: impl Into<String>) -> Self {
        AriaError::Leakage(msg.into())
    }

    pub fn sandbox_violation(msg: impl Into<String>) -> Self {
        AriaError::SandboxViolation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        AriaError::Configuration(msg.into())
    }

    pub fn agent_not_found(agent_id: Uuid) -> Self {
        AriaError::AgentNotFound(agent_id)
    }

    /// Whether the retry policy should consider this error type retryable.
    /// `transient_error` and `circuit_open` (half-open probe rejected) are
    /// the only variants a retry loop should ever re-attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AriaError::TransientError(_) | AriaError::CircuitOpen(_)
        )
    }

    /// A short machine-readable tag, used in logs and in the `aria.stream_error`
    /// payload's `recoverable` hint derivation.
    pub fn kind(&self) -> &'static str {
        match self {
            AriaError::BudgetExceeded(_) => "budget_exceeded",
            AriaError::CircuitOpen(_) => "circuit_open",
            AriaError::TransientError(_) => "transient_error",
            AriaError::InvalidInput(_) => "invalid_input",
            AriaError::ExecutionFailure(_) => "execution_failure",
            AriaError::NotFound(_) => "not_found",
            AriaError::Leakage(_) => "leakage",
            AriaError::SandboxViolation(_) => "sandbox_violation",
            AriaError::MaxIterationsReached(_) => "execution_failure",
            AriaError::Cancelled => "execution_failure",
            AriaError::AgentNotFound(_) => "not_found",
            AriaError::Configuration(_) => "execution_failure",
            AriaError::Internal(_) => "execution_failure",
        }
    }
}
