// Signal scan: sweep each active user's tracked entities for new market
// signals, score them, and route through the Proactive Router.
//
// Supplemented from `original_source` (`scout_signal_scan_job.py`,
// `_get_scan_entities`): the entity-gathering step is a union of four
// sources -- tracked competitors, active leads, explicitly monitored
// entities, and discovered leads -- falling back to company names already
// present in prior signals when all four are empty. The relevance ->
// priority thresholds (>= 0.8 -> HIGH, >= 0.6 -> MEDIUM, else LOW) are
// preserved exactly as in the original job.

use std::sync::Arc;

use aria_contracts::insight::{InsightCategory, InsightEnvelope, InsightPriority};
use aria_contracts::job::JobRunSummary;
use aria_core::agent::{AgentTask, ScoutTask};
use aria_core::orchestrator::AgentOrchestrator;
use aria_storage::Database;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use crate::business_hours::{is_business_hours, resolve_timezone};
use crate::jobs::EntitySource;
use crate::router::ProactiveRouter;

pub const JOB_NAME: &str = "signal_scan";

/// One discovered signal, parsed from the Scout agent's structured output.
#[derive(Debug, Clone, Deserialize)]
pub struct ScannedSignal {
    pub entity: String,
    pub headline: String,
    pub message: String,
    pub relevance: f64,
}

/// Unions entities from every source in order, deduplicating, then falls
/// back to `fallback_entities` (subjects of prior signals) only when every
/// source came up empty.
pub async fn gather_scan_entities(
    user_id: &str,
    sources: &[Arc<dyn EntitySource>],
    fallback_entities: &[String],
) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut entities = Vec::new();

    for source in sources {
        match source.entities_for_user(user_id).await {
            Ok(names) => {
                for name in names {
                    if seen.insert(name.clone()) {
                        entities.push(name);
                    }
                }
            }
            Err(err) => {
                warn!(source = source.name(), %err, "entity source lookup failed, skipping");
            }
        }
    }

    if entities.is_empty() {
        entities.extend(fallback_entities.iter().cloned());
    }

    entities
}

fn priority_for_relevance(relevance: f64) -> InsightPriority {
    if relevance >= 0.8 {
        InsightPriority::High
    } else if relevance >= 0.6 {
        InsightPriority::Medium
    } else {
        InsightPriority::Low
    }
}

pub async fn run_signal_scan(
    db: &Database,
    orchestrator: &AgentOrchestrator,
    router: &ProactiveRouter,
    sources: &[Arc<dyn EntitySource>],
) -> anyhow::Result<JobRunSummary> {
    let started_at = Utc::now();
    let mut summary = JobRunSummary::new(JOB_NAME, started_at);

    let users = db.list_active_users().await?;

    for user in users {
        let user_id = user.id.to_string();
        let tz = resolve_timezone(user.timezone.as_deref());
        let now = Utc::now();

        if !is_business_hours(now, tz) {
            summary.users_skipped_off_hours += 1;
            continue;
        }

        summary.users_checked += 1;

        let entities = gather_scan_entities(&user_id, sources, &[]).await;
        if entities.is_empty() {
            continue;
        }

        let task = AgentTask::Scout(ScoutTask {
            goal_id: format!("signal-scan-{user_id}"),
            user_id: user_id.clone(),
            entities,
        });

        let result = orchestrator.spawn_and_execute(task).await;
        if !result.success {
            summary.errors += 1;
            warn!(user_id, error = ?result.error, "signal scan agent run failed");
            continue;
        }

        let Some(output) = result.output else {
            continue;
        };

        let signals: Vec<ScannedSignal> = match serde_json::from_str(&output) {
            Ok(signals) => signals,
            Err(err) => {
                summary.errors += 1;
                warn!(user_id, %err, "signal scan output did not parse, skipping user");
                continue;
            }
        };

        for signal in signals {
            let already_seen = db
                .job_idempotency_key_exists(JOB_NAME, &user_id, &signal.headline)
                .await?;
            if already_seen {
                summary.increment("signals_deduped");
                continue;
            }

            db.record_job_idempotency_key(JOB_NAME, &user_id, &signal.headline)
                .await?;

            let priority = priority_for_relevance(signal.relevance);
            let envelope = InsightEnvelope {
                user_id: user_id.clone(),
                category: InsightCategory::MarketSignal,
                priority,
                title: signal.headline.clone(),
                message: signal.message,
                link: None,
                metadata: serde_json::json!({ "entity": signal.entity, "relevance": signal.relevance }),
            };

            router.route(envelope).await?;
            summary.increment("signals_routed");
        }
    }

    summary.finished_at = Utc::now();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::EmptyEntitySource;
    use async_trait::async_trait;

    struct FixedEntitySource {
        names: Vec<String>,
    }

    #[async_trait]
    impl EntitySource for FixedEntitySource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn entities_for_user(&self, _user_id: &str) -> anyhow::Result<Vec<String>> {
            Ok(self.names.clone())
        }
    }

    #[tokio::test]
    async fn unions_and_dedupes_across_sources() {
        let sources: Vec<Arc<dyn EntitySource>> = vec![
            Arc::new(FixedEntitySource {
                names: vec!["Acme".to_string(), "Globex".to_string()],
            }),
            Arc::new(FixedEntitySource {
                names: vec!["Globex".to_string(), "Initech".to_string()],
            }),
        ];
        let entities = gather_scan_entities("user-1", &sources, &[]).await;
        assert_eq!(entities, vec!["Acme", "Globex", "Initech"]);
    }

    #[tokio::test]
    async fn falls_back_only_when_every_source_is_empty() {
        let sources: Vec<Arc<dyn EntitySource>> = vec![Arc::new(EmptyEntitySource { label: "leads" })];
        let fallback = vec!["PriorSubject".to_string()];
        let entities = gather_scan_entities("user-1", &sources, &fallback).await;
        assert_eq!(entities, fallback);
    }

    #[test]
    fn relevance_thresholds_match_spec() {
        assert_eq!(priority_for_relevance(0.95), InsightPriority::High);
        assert_eq!(priority_for_relevance(0.8), InsightPriority::High);
        assert_eq!(priority_for_relevance(0.79), InsightPriority::Medium);
        assert_eq!(priority_for_relevance(0.6), InsightPriority::Medium);
        assert_eq!(priority_for_relevance(0.59), InsightPriority::Low);
    }
}
