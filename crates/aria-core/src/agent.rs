// The polymorphic Agent kind the Orchestrator dispatches to.
//
// Per the dynamic-typing -> static-variants redesign: the original system
// passed each agent a loosely-shaped dict and asked it to `validate_input`
// at runtime. Here, each agent kind owns its own typed task payload; a
// malformed task simply can't be constructed, and `validate_input` is kept
// only for the cross-field invariants the type system can't express.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;

/// The seven domain agent kinds named by the original system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Analyst,
    Scout,
    Strategist,
    Scribe,
    Verifier,
    Operator,
    Hunter,
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgentKind::Analyst => "analyst",
            AgentKind::Scout => "scout",
            AgentKind::Strategist => "strategist",
            AgentKind::Scribe => "scribe",
            AgentKind::Verifier => "verifier",
            AgentKind::Operator => "operator",
            AgentKind::Hunter => "hunter",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalystTask {
    pub goal_id: String,
    pub user_id: String,
    pub competitors: Vec<String>,
    pub leads: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutTask {
    pub goal_id: String,
    pub user_id: String,
    pub entities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategistTask {
    pub goal_id: String,
    pub user_id: String,
    pub objective: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScribeTask {
    pub goal_id: String,
    pub user_id: String,
    pub source_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierTask {
    pub goal_id: String,
    pub user_id: String,
    pub claim: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorTask {
    pub goal_id: String,
    pub user_id: String,
    pub action: String,
    pub parameters: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HunterTask {
    pub goal_id: String,
    pub user_id: String,
    pub monitored_entities: Vec<String>,
}

/// Closed set of task inputs an agent can be spawned with. Subsumes the
/// original's dynamic input-dict dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentTask {
    Analyst(AnalystTask),
    Scout(ScoutTask),
    Strategist(StrategistTask),
    Scribe(ScribeTask),
    Verifier(VerifierTask),
    Operator(OperatorTask),
    Hunter(HunterTask),
}

impl AgentTask {
    pub fn kind(&self) -> AgentKind {
        match self {
            AgentTask::Analyst(_) => AgentKind::Analyst,
            AgentTask::Scout(_) => AgentKind::Scout,
            AgentTask::Strategist(_) => AgentKind::Strategist,
            AgentTask::Scribe(_) => AgentKind::Scribe,
            AgentTask::Verifier(_) => AgentKind::Verifier,
            AgentTask::Operator(_) => AgentKind::Operator,
            AgentTask::Hunter(_) => AgentKind::Hunter,
        }
    }

    pub fn goal_id(&self) -> &str {
        match self {
            AgentTask::Analyst(t) => &t.goal_id,
            AgentTask::Scout(t) => &t.goal_id,
            AgentTask::Strategist(t) => &t.goal_id,
            AgentTask::Scribe(t) => &t.goal_id,
            AgentTask::Verifier(t) => &t.goal_id,
            AgentTask::Operator(t) => &t.goal_id,
            AgentTask::Hunter(t) => &t.goal_id,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            AgentTask::Analyst(t) => &t.user_id,
            AgentTask::Scout(t) => &t.user_id,
            AgentTask::Strategist(t) => &t.user_id,
            AgentTask::Scribe(t) => &t.user_id,
            AgentTask::Verifier(t) => &t.user_id,
            AgentTask::Operator(t) => &t.user_id,
            AgentTask::Hunter(t) => &t.user_id,
        }
    }
}

/// Outcome of a single agent execution. Failures are caught and converted
/// here, not propagated as panics or bare errors — the Orchestrator never
/// retries at its own layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub goal_id: String,
    pub agent: AgentKind,
    pub success: bool,
    pub output: Option<String>,
    pub error: Option<String>,
    pub tokens_used: u64,
}

impl AgentResult {
    pub fn ok(goal_id: impl Into<String>, agent: AgentKind, output: impl Into<String>, tokens_used: u64) -> Self {
        Self {
            goal_id: goal_id.into(),
            agent,
            success: true,
            output: Some(output.into()),
            error: None,
            tokens_used,
        }
    }

    pub fn failed(goal_id: impl Into<String>, agent: AgentKind, error: impl Into<String>) -> Self {
        Self {
            goal_id: goal_id.into(),
            agent,
            success: false,
            output: None,
            error: Some(error.into()),
            tokens_used: 0,
        }
    }
}

/// A capability object the Orchestrator can spawn and execute.
///
/// `validate_input` covers invariants the `AgentTask` variant's shape
/// can't enforce on its own (e.g. "at least one of competitors/leads is
/// non-empty").
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn kind(&self) -> AgentKind;

    fn validate_input(&self, task: &AgentTask) -> Result<()>;

    async fn execute(&self, task: AgentTask) -> AgentResult;
}
