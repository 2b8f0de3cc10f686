// Agent Orchestrator: spawns and dispatches agents, bounds concurrency and
// total token spend, never retries a failed agent itself (retry is the
// caller's decision, same as the Cost Governor's retry-budget contract).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agent::{Agent, AgentKind, AgentResult, AgentTask};
use crate::config::OrchestratorConfig;
use crate::error::{AriaError, Result};

/// Outcome of a batch of agent executions.
#[derive(Debug, Clone)]
pub struct OrchestrationResult {
    pub results: Vec<AgentResult>,
    pub total_tokens_used: u64,
}

pub struct AgentOrchestrator {
    registry: HashMap<AgentKind, Arc<dyn Agent>>,
    config: OrchestratorConfig,
    active_agents: RwLock<HashMap<Uuid, AgentKind>>,
    total_tokens_used: AtomicU64,
    semaphore: Arc<Semaphore>,
}

impl AgentOrchestrator {
    pub fn new(registry: HashMap<AgentKind, Arc<dyn Agent>>, config: OrchestratorConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_agents));
        Self {
            registry,
            config,
            active_agents: RwLock::new(HashMap::new()),
            total_tokens_used: AtomicU64::new(0),
            semaphore,
        }
    }

    pub fn total_tokens_used(&self) -> u64 {
        self.total_tokens_used.load(Ordering::SeqCst)
    }

    async fn active_count(&self) -> usize {
        self.active_agents.read().await.len()
    }

    /// Register a task as in-flight and return its handle. Callers use this
    /// to track cancellation-token propagation to descendants.
    async fn spawn(&self, task: &AgentTask) -> Uuid {
        let handle = Uuid::now_v7();
        self.active_agents.write().await.insert(handle, task.kind());
        handle
    }

    async fn despawn(&self, handle: Uuid) {
        self.active_agents.write().await.remove(&handle);
    }

    /// Run a single agent task to completion. Validates input, checks the
    /// total-token cap, and converts any failure into a structured
    /// `AgentResult` rather than propagating it.
    pub async fn spawn_and_execute(&self, task: AgentTask) -> AgentResult {
        let kind = task.kind();
        let goal_id = task.goal_id().to_string();

        let agent = match self.registry.get(&kind) {
            Some(agent) => agent.clone(),
            None => {
                return AgentResult::failed(
                    goal_id,
                    kind,
                    format!("no agent registered for kind {kind}"),
                )
            }
        };

        if let Err(err) = agent.validate_input(&task) {
            return AgentResult::failed(goal_id, kind, format!("invalid input: {err}"));
        }

        if self.total_tokens_used() >= self.config.max_tokens {
            return AgentResult::failed(
                goal_id,
                kind,
                "orchestrator token cap reached for this batch",
            );
        }

        let _permit = match self.semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return AgentResult::failed(goal_id, kind, "orchestrator shutting down"),
        };

        let handle = self.spawn(&task).await;
        let result = agent.execute(task).await;
        self.despawn(handle).await;

        self.total_tokens_used
            .fetch_add(result.tokens_used, Ordering::SeqCst);

        if !result.success {
            warn!(goal_id = %result.goal_id, agent = %result.agent, error = ?result.error, "agent execution failed");
        }

        result
    }

    /// Execute a batch of tasks with no ordering guarantee among them,
    /// bounded by `max_concurrent_agents`. A cancellation token, if
    /// cancelled, stops scheduling new tasks but lets in-flight ones finish.
    pub async fn execute_parallel(
        &self,
        tasks: Vec<AgentTask>,
        cancellation: CancellationToken,
    ) -> OrchestrationResult {
        let futures = tasks.into_iter().map(|task| {
            let cancellation = cancellation.clone();
            async move {
                if cancellation.is_cancelled() {
                    return AgentResult::failed(
                        task.goal_id().to_string(),
                        task.kind(),
                        "cancelled before start",
                    );
                }
                self.spawn_and_execute(task).await
            }
        });

        let results: Vec<AgentResult> = futures::future::join_all(futures).await;
        let total_tokens_used = results.iter().map(|r| r.tokens_used).sum();

        info!(count = results.len(), total_tokens_used, "orchestrator: parallel batch complete");

        OrchestrationResult {
            results,
            total_tokens_used,
        }
    }

    /// Execute tasks one at a time, in the given order. Stops early if
    /// `cancellation` fires between steps.
    pub async fn execute_sequential(
        &self,
        tasks: Vec<AgentTask>,
        cancellation: CancellationToken,
    ) -> OrchestrationResult {
        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            if cancellation.is_cancelled() {
                results.push(AgentResult::failed(
                    task.goal_id().to_string(),
                    task.kind(),
                    "cancelled",
                ));
                continue;
            }
            results.push(self.spawn_and_execute(task).await);
        }

        let total_tokens_used = results.iter().map(|r| r.tokens_used).sum();
        OrchestrationResult {
            results,
            total_tokens_used,
        }
    }

    pub async fn cancel_all(&self) -> Result<()> {
        let active = self.active_agents.read().await;
        if active.is_empty() {
            return Ok(());
        }
        Err(AriaError::execution_failure(
            "cannot force-cancel in-flight agents without a cancellation token propagated at spawn time",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoAgent(AgentKind, bool);

    #[async_trait]
    impl Agent for EchoAgent {
        fn name(&self) -> &'static str {
            "echo"
        }
        fn description(&self) -> &'static str {
            "test agent"
        }
        fn kind(&self) -> AgentKind {
            self.0
        }
        fn validate_input(&self, _task: &AgentTask) -> Result<()> {
            Ok(())
        }
        async fn execute(&self, task: AgentTask) -> AgentResult {
            if self.1 {
                AgentResult::ok(task.goal_id(), self.0, "done", 10)
            } else {
                AgentResult::failed(task.goal_id(), self.0, "boom")
            }
        }
    }

    fn task(kind: AgentKind) -> AgentTask {
        use crate::agent::*;
        match kind {
            AgentKind::Scout => AgentTask::Scout(ScoutTask {
                goal_id: "g1".into(),
                user_id: "u1".into(),
                entities: vec!["acme".into()],
            }),
            _ => AgentTask::Analyst(AnalystTask {
                goal_id: "g1".into(),
                user_id: "u1".into(),
                competitors: vec![],
                leads: vec![],
            }),
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_parallel_batch() {
        let mut registry: HashMap<AgentKind, Arc<dyn Agent>> = HashMap::new();
        registry.insert(AgentKind::Analyst, Arc::new(EchoAgent(AgentKind::Analyst, false)));
        registry.insert(AgentKind::Scout, Arc::new(EchoAgent(AgentKind::Scout, true)));

        let orchestrator = AgentOrchestrator::new(registry, OrchestratorConfig::default());
        let outcome = orchestrator
            .execute_parallel(vec![task(AgentKind::Analyst), task(AgentKind::Scout)], CancellationToken::new())
            .await;

        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.results.iter().any(|r| !r.success));
        assert!(outcome.results.iter().any(|r| r.success));
    }

    #[tokio::test]
    async fn missing_agent_kind_fails_gracefully() {
        let orchestrator = AgentOrchestrator::new(HashMap::new(), OrchestratorConfig::default());
        let result = orchestrator.spawn_and_execute(task(AgentKind::Analyst)).await;
        assert!(!result.success);
    }
}
