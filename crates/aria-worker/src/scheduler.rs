// Periodic per-job scheduler.
//
// One `tokio::time::interval` per job. Invocations are non-overlapping per
// (job, user) pair; since each job iterates its users sequentially inside
// one invocation, the guard here only needs to track "is this job's
// previous invocation still running", via a `HashSet<&'static str>` of
// in-flight job names.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use aria_contracts::job::JobRunSummary;
use aria_storage::{CreateJobRun, Database};

/// A job cadence and the async closure that runs one invocation.
pub struct ScheduledJob {
    pub name: &'static str,
    pub interval: Duration,
    pub run: Box<dyn Fn() -> futures::future::BoxFuture<'static, anyhow::Result<JobRunSummary>> + Send + Sync>,
}

pub struct Scheduler {
    db: Database,
    jobs: Vec<ScheduledJob>,
    in_flight: Arc<Mutex<HashSet<&'static str>>>,
}

impl Scheduler {
    pub fn new(db: Database, jobs: Vec<ScheduledJob>) -> Self {
        Self {
            db,
            jobs,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Spawns one background task per job, each ticking on its own
    /// interval. Returns immediately; the returned handles can be awaited
    /// for a clean shutdown or dropped to let them run for the process
    /// lifetime.
    pub fn spawn_all(self) -> Vec<tokio::task::JoinHandle<()>> {
        let db = self.db;
        let in_flight = self.in_flight;

        self.jobs
            .into_iter()
            .map(|job| {
                let db = db.clone();
                let in_flight = in_flight.clone();
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(job.interval);
                    loop {
                        ticker.tick().await;
                        run_one_invocation(&db, &in_flight, &job).await;
                    }
                })
            })
            .collect()
    }
}

async fn run_one_invocation(
    db: &Database,
    in_flight: &Arc<Mutex<HashSet<&'static str>>>,
    job: &ScheduledJob,
) {
    {
        let mut guard = in_flight.lock().await;
        if guard.contains(job.name) {
            warn!(job = job.name, "previous invocation still running, skipping tick");
            return;
        }
        guard.insert(job.name);
    }

    let result = (job.run)().await;

    {
        let mut guard = in_flight.lock().await;
        guard.remove(job.name);
    }

    match result {
        Ok(summary) => {
            info!(
                job = job.name,
                users_checked = summary.users_checked,
                users_skipped_off_hours = summary.users_skipped_off_hours,
                errors = summary.errors,
                "job run complete"
            );

            if let Err(err) = persist_summary(db, &summary).await {
                warn!(job = job.name, %err, "failed to persist job run summary");
            }
        }
        Err(err) => {
            warn!(job = job.name, %err, "job invocation failed outright");
        }
    }
}

async fn persist_summary(db: &Database, summary: &JobRunSummary) -> anyhow::Result<()> {
    db.record_job_run(CreateJobRun {
        job_name: summary.job_name.clone(),
        started_at: summary.started_at,
        finished_at: summary.finished_at,
        users_checked: summary.users_checked as i32,
        users_skipped_off_hours: summary.users_skipped_off_hours as i32,
        errors: summary.errors as i32,
        extra: serde_json::to_value(&summary.extra)?,
    })
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn a_job_already_in_flight_is_skipped() {
        let in_flight = Arc::new(Mutex::new(HashSet::new()));
        in_flight.lock().await.insert("signal_scan");

        let job = ScheduledJob {
            name: "signal_scan",
            interval: Duration::from_secs(60),
            run: Box::new(|| {
                Box::pin(async {
                    panic!("should not run while already in flight");
                })
            }),
        };

        // run_one_invocation needs a live Database; this test only
        // exercises the guard itself.
        let mut guard = in_flight.lock().await;
        assert!(guard.contains(job.name));
        guard.remove(job.name);
    }
}
