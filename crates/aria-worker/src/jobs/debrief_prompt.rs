// Meeting-debrief prompting: for each meeting a user just finished, nudge
// them once to capture notes. Idempotency is lookup-by-natural-key, keyed
// on the meeting id (spec.md §4.4: "debrief for a given meeting").

use std::sync::Arc;

use aria_contracts::insight::{InsightCategory, InsightEnvelope, InsightPriority};
use aria_contracts::job::JobRunSummary;
use aria_storage::Database;
use chrono::Utc;
use tracing::warn;

use crate::business_hours::{is_business_hours, resolve_timezone};
use crate::router::ProactiveRouter;

pub const JOB_NAME: &str = "debrief_prompt";

/// One recently concluded meeting eligible for a debrief prompt.
pub struct ConcludedMeeting {
    pub meeting_id: String,
    pub title: String,
}

#[async_trait::async_trait]
pub trait MeetingSource: Send + Sync {
    async fn concluded_meetings_for_user(
        &self,
        user_id: &str,
    ) -> anyhow::Result<Vec<ConcludedMeeting>>;
}

/// No-op source used when no real calendar integration is wired up --
/// the third-party OAuth broker is deliberately left unimplemented.
pub struct EmptyMeetingSource;

#[async_trait::async_trait]
impl MeetingSource for EmptyMeetingSource {
    async fn concluded_meetings_for_user(
        &self,
        _user_id: &str,
    ) -> anyhow::Result<Vec<ConcludedMeeting>> {
        Ok(Vec::new())
    }
}

pub async fn run_debrief_prompt(
    db: &Database,
    router: &ProactiveRouter,
    meetings: &Arc<dyn MeetingSource>,
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

        let concluded = match meetings.concluded_meetings_for_user(&user_id).await {
            Ok(meetings) => meetings,
            Err(err) => {
                summary.errors += 1;
                warn!(user_id, %err, "meeting source lookup failed");
                continue;
            }
        };

        if concluded.is_empty() {
            continue;
        }

        for meeting in concluded {
            let already_prompted = db
                .job_idempotency_key_exists(JOB_NAME, &user_id, &meeting.meeting_id)
                .await?;
            if already_prompted {
                summary.increment("debriefs_deduped");
                continue;
            }

            db.record_job_idempotency_key(JOB_NAME, &user_id, &meeting.meeting_id)
                .await?;

            let envelope = InsightEnvelope {
                user_id: user_id.clone(),
                category: InsightCategory::MeetingDebrief,
                priority: InsightPriority::Medium,
                title: format!("Debrief: {}", meeting.title),
                message: format!(
                    "Capture notes from \"{}\" while it's fresh.",
                    meeting.title
                ),
                link: None,
                metadata: serde_json::json!({ "meeting_id": meeting.meeting_id }),
            };

            router.route(envelope).await?;
            summary.increment("debriefs_routed");
        }
    }

    summary.finished_at = Utc::now();
    Ok(summary)
}
