use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use aria_core::{AgentOrchestrator, OrchestratorConfig};
use aria_storage::Database;
use aria_worker::jobs::{
    debrief_prompt::EmptyMeetingSource, overdue_commitment::EmptyCommitmentSource,
    run_debrief_prompt, run_overdue_commitment, run_signal_scan, run_weekly_digest,
    EmptyEntitySource,
};
use aria_worker::{JobRunnerConfig, ProactiveRouter, ScheduledJob, Scheduler, StreamHub};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aria_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("aria-worker starting");

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL environment variable required");
    let db = Database::from_url(&database_url).await?;
    tracing::info!("database connection established");

    let hub = StreamHub::new();
    let router = Arc::new(ProactiveRouter::new(db.clone(), hub.clone()));

    // Agent registry is deployment-specific wiring (see
    // `aria_core::orchestrator::AgentOrchestrator`'s constructor): a real
    // Scout agent backed by `aria-openai`/`aria-anthropic` is registered
    // by the application embedding this worker, not hardcoded here.
    let orchestrator = Arc::new(AgentOrchestrator::new(HashMap::new(), OrchestratorConfig::default()));

    let entity_sources: Vec<Arc<dyn aria_worker::jobs::EntitySource>> = vec![
        Arc::new(EmptyEntitySource { label: "tracked_competitors" }),
        Arc::new(EmptyEntitySource { label: "active_leads" }),
        Arc::new(EmptyEntitySource { label: "monitored_entities" }),
        Arc::new(EmptyEntitySource { label: "discovered_leads" }),
    ];
    let meeting_source: Arc<dyn aria_worker::jobs::debrief_prompt::MeetingSource> =
        Arc::new(EmptyMeetingSource);
    let commitment_source: Arc<dyn aria_worker::jobs::overdue_commitment::CommitmentSource> =
        Arc::new(EmptyCommitmentSource);

    let job_cfg = JobRunnerConfig::from_env();

    let jobs = {
        let db = db.clone();
        let router = router.clone();
        let orchestrator = orchestrator.clone();
        let entity_sources = entity_sources.clone();
        let meeting_source = meeting_source.clone();
        let commitment_source = commitment_source.clone();

        vec![
            ScheduledJob {
                name: "signal_scan",
                interval: job_cfg.signal_scan_interval,
                run: Box::new({
                    let db = db.clone();
                    let router = router.clone();
                    let orchestrator = orchestrator.clone();
                    let entity_sources = entity_sources.clone();
                    move || {
                        let db = db.clone();
                        let router = router.clone();
                        let orchestrator = orchestrator.clone();
                        let entity_sources = entity_sources.clone();
                        Box::pin(async move {
                            run_signal_scan(&db, &orchestrator, &router, &entity_sources).await
                        })
                    }
                }),
            },
            ScheduledJob {
                name: "weekly_digest",
                interval: job_cfg.weekly_digest_poll_interval,
                run: Box::new({
                    let db = db.clone();
                    let router = router.clone();
                    move || {
                        let db = db.clone();
                        let router = router.clone();
                        Box::pin(async move { run_weekly_digest(&db, &router).await })
                    }
                }),
            },
            ScheduledJob {
                name: "debrief_prompt",
                interval: job_cfg.debrief_prompt_interval,
                run: Box::new({
                    let db = db.clone();
                    let router = router.clone();
                    let meeting_source = meeting_source.clone();
                    move || {
                        let db = db.clone();
                        let router = router.clone();
                        let meeting_source = meeting_source.clone();
                        Box::pin(async move {
                            run_debrief_prompt(&db, &router, &meeting_source).await
                        })
                    }
                }),
            },
            ScheduledJob {
                name: "overdue_commitment",
                interval: job_cfg.overdue_commitment_interval,
                run: Box::new({
                    let db = db.clone();
                    let router = router.clone();
                    let commitment_source = commitment_source.clone();
                    move || {
                        let db = db.clone();
                        let router = router.clone();
                        let commitment_source = commitment_source.clone();
                        Box::pin(async move {
                            run_overdue_commitment(&db, &router, &commitment_source).await
                        })
                    }
                }),
            },
        ]
    };

    let scheduler = Scheduler::new(db, jobs);
    let handles = scheduler.spawn_all();
    tracing::info!(job_count = handles.len(), "scheduler running");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    for handle in handles {
        handle.abort();
    }

    Ok(())
}
