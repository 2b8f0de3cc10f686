// Overdue-commitment sweep: remind a user of commitments past their due
// date. Idempotency is lookup-by-natural-key, keyed on the commitment id.

use std::sync::Arc;

use aria_contracts::insight::{InsightCategory, InsightEnvelope, InsightPriority};
use aria_contracts::job::JobRunSummary;
use aria_storage::Database;
use chrono::Utc;
use tracing::warn;

use crate::business_hours::{is_business_hours, resolve_timezone};
use crate::router::ProactiveRouter;

pub const JOB_NAME: &str = "overdue_commitment";

pub struct OverdueCommitment {
    pub commitment_id: String,
    pub description: String,
    pub days_overdue: i64,
}

#[async_trait::async_trait]
pub trait CommitmentSource: Send + Sync {
    async fn overdue_commitments_for_user(
        &self,
        user_id: &str,
    ) -> anyhow::Result<Vec<OverdueCommitment>>;
}

/// No-op source used when no real commitment tracker is wired up.
pub struct EmptyCommitmentSource;

#[async_trait::async_trait]
impl CommitmentSource for EmptyCommitmentSource {
    async fn overdue_commitments_for_user(
        &self,
        _user_id: &str,
    ) -> anyhow::Result<Vec<OverdueCommitment>> {
        Ok(Vec::new())
    }
}

/// Commitments overdue a week or more are escalated to HIGH; otherwise
/// MEDIUM. There is no LOW tier here -- an overdue commitment is always
/// worth surfacing above the briefing digest.
fn priority_for_overdue_days(days_overdue: i64) -> InsightPriority {
    if days_overdue >= 7 {
        InsightPriority::High
    } else {
        InsightPriority::Medium
    }
}

pub async fn run_overdue_commitment(
    db: &Database,
    router: &ProactiveRouter,
    commitments: &Arc<dyn CommitmentSource>,
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

        let overdue = match commitments.overdue_commitments_for_user(&user_id).await {
            Ok(items) => items,
            Err(err) => {
                summary.errors += 1;
                warn!(user_id, %err, "commitment source lookup failed");
                continue;
            }
        };

        if overdue.is_empty() {
            continue;
        }

        for commitment in overdue {
            let already_reminded = db
                .job_idempotency_key_exists(JOB_NAME, &user_id, &commitment.commitment_id)
                .await?;
            if already_reminded {
                summary.increment("reminders_deduped");
                continue;
            }

            db.record_job_idempotency_key(JOB_NAME, &user_id, &commitment.commitment_id)
                .await?;

            let envelope = InsightEnvelope {
                user_id: user_id.clone(),
                category: InsightCategory::OverdueCommitment,
                priority: priority_for_overdue_days(commitment.days_overdue),
                title: "Overdue commitment".to_string(),
                message: format!(
                    "\"{}\" is {} day(s) overdue.",
                    commitment.description, commitment.days_overdue
                ),
                link: None,
                metadata: serde_json::json!({ "commitment_id": commitment.commitment_id }),
            };

            router.route(envelope).await?;
            summary.increment("reminders_routed");
        }
    }

    summary.finished_at = Utc::now();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_or_more_overdue_escalates_to_high() {
        assert_eq!(priority_for_overdue_days(7), InsightPriority::High);
        assert_eq!(priority_for_overdue_days(10), InsightPriority::High);
        assert_eq!(priority_for_overdue_days(1), InsightPriority::Medium);
    }
}
