// Weekly digest: once per user per week, summarize the briefing queue and
// route a digest insight.
//
// Keeps the original's "Monday, local hour >= 7" gate (not just "Monday
// 07:00"), guarded by the `(user_id, week_start)` idempotency key.
// Non-Monday or before-7am invocations are counted under
// `digests_skipped_not_monday`; existing-row skips under
// `digests_skipped_existing` (`spec.md` §8 scenario 6).

use aria_contracts::insight::{InsightCategory, InsightEnvelope, InsightPriority};
use aria_contracts::job::JobRunSummary;
use aria_storage::Database;
use chrono::{Duration, Utc};
use tracing::warn;

use crate::business_hours::{is_business_hours, is_weekly_digest_window, resolve_timezone, week_start};
use crate::router::ProactiveRouter;

pub const JOB_NAME: &str = "weekly_digest";

pub async fn run_weekly_digest(
    db: &Database,
    router: &ProactiveRouter,
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

        if !is_weekly_digest_window(now, tz) {
            summary.increment("digests_skipped_not_monday");
            continue;
        }

        let digest_week_start = week_start(now, tz);

        if db.weekly_digest_exists(&user_id, digest_week_start).await? {
            summary.increment("digests_skipped_existing");
            continue;
        }

        let window_start = now - Duration::days(7);
        let items = match db.drain_briefing_queue(&user_id, window_start, now).await {
            Ok(items) => items,
            Err(err) => {
                summary.errors += 1;
                warn!(user_id, %err, "failed to drain briefing queue for weekly digest");
                continue;
            }
        };

        db.record_weekly_digest(&user_id, digest_week_start).await?;

        if items.is_empty() {
            summary.increment("digests_empty");
            continue;
        }

        let message = format!(
            "{} item(s) from this week: {}",
            items.len(),
            items
                .iter()
                .map(|item| item.title.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        );

        let envelope = InsightEnvelope {
            user_id: user_id.clone(),
            category: InsightCategory::WeeklyDigest,
            priority: InsightPriority::Medium,
            title: "Your weekly digest".to_string(),
            message,
            link: None,
            metadata: serde_json::json!({ "week_start": digest_week_start.to_string(), "item_count": items.len() }),
        };

        router.route(envelope).await?;
        summary.increment("digests_routed");
    }

    summary.finished_at = Utc::now();
    Ok(summary)
}
