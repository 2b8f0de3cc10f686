// Workflow composition layer: ordered steps over the Agent Orchestrator,
// with optional human-approval gating and a per-step failure policy.

use std::sync::Arc;

use crate::agent::{AgentResult, AgentTask};
use crate::orchestrator::AgentOrchestrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Complete,
    Failed,
    AwaitingApproval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    Abort,
    Skip,
}

/// A callback that decides whether an `AwaitingApproval` step may proceed.
/// Implementations typically block on a UI response or a queued message.
#[async_trait::async_trait]
pub trait ApprovalCallback: Send + Sync {
    async fn await_approval(&self, step_name: &str) -> bool;
}

pub struct WorkflowStep {
    pub name: String,
    pub task: AgentTask,
    pub on_failure: OnFailure,
    pub requires_approval: bool,
}

impl WorkflowStep {
    pub fn new(name: impl Into<String>, task: AgentTask) -> Self {
        Self {
            name: name.into(),
            task,
            on_failure: OnFailure::Abort,
            requires_approval: false,
        }
    }

    pub fn on_failure(mut self, policy: OnFailure) -> Self {
        self.on_failure = policy;
        self
    }

    pub fn requires_approval(mut self) -> Self {
        self.requires_approval = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub name: String,
    pub status: StepStatus,
    pub result: Option<AgentResult>,
}

#[derive(Debug, Clone)]
pub struct WorkflowResult {
    pub steps: Vec<StepOutcome>,
    pub completed: bool,
}

/// Runs `steps` against `orchestrator` in declared order. A step whose
/// `on_failure` is `Abort` stops the whole workflow on failure; `Skip`
/// records the failure and continues to the next step.
pub async fn run_workflow(
    orchestrator: &AgentOrchestrator,
    steps: Vec<WorkflowStep>,
    approval: Option<Arc<dyn ApprovalCallback>>,
) -> WorkflowResult {
    let mut outcomes = Vec::with_capacity(steps.len());

    for step in steps {
        if step.requires_approval {
            let approved = match &approval {
                Some(cb) => cb.await_approval(&step.name).await,
                None => false,
            };
            if !approved {
                outcomes.push(StepOutcome {
                    name: step.name.clone(),
                    status: StepStatus::AwaitingApproval,
                    result: None,
                });
                return WorkflowResult {
                    steps: outcomes,
                    completed: false,
                };
            }
        }

        let result = orchestrator.spawn_and_execute(step.task).await;
        let status = if result.success {
            StepStatus::Complete
        } else {
            StepStatus::Failed
        };

        let should_abort = !result.success && step.on_failure == OnFailure::Abort;
        outcomes.push(StepOutcome {
            name: step.name,
            status,
            result: Some(result),
        });

        if should_abort {
            return WorkflowResult {
                steps: outcomes,
                completed: false,
            };
        }
    }

    WorkflowResult {
        steps: outcomes,
        completed: true,
    }
}
