// Database row models. The public DTOs (aria-contracts) are the
// wire/OpenAPI shape; these `FromRow` structs are the exact column layout
// and sometimes diverge (e.g. `i64` instead of `i32`, `Json` wrappers).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// Users
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub timezone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub timezone: Option<String>,
}

// ============================================
// Goals (work handed to the Agent Orchestrator)
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct GoalRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateGoal {
    pub user_id: Uuid,
    pub description: String,
}

// ============================================
// Usage tracking (Cost Governor storage seam)
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct UsageTrackingRow {
    pub user_id: String,
    pub date: NaiveDate,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub thinking_tokens: i64,
}

// ============================================
// Notifications (read/unread inbox)
// ============================================

/// Column is named `type` in the database (`spec.md` §6); mapped here to
/// `notification_type` since `type` is a reserved word.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub user_id: String,
    #[sqlx(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    #[sqlx(json)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: String,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub metadata: serde_json::Value,
}

// ============================================
// Briefing queue (next-login digest, not urgent enough to notify live)
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct BriefingQueueRow {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub category: String,
    #[sqlx(json)]
    pub metadata: serde_json::Value,
    pub consumed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateBriefingQueueEntry {
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub category: String,
    pub metadata: serde_json::Value,
}

// ============================================
// Login message queue (HIGH priority items missed while offline)
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct LoginQueueRow {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub category: String,
    #[sqlx(json)]
    pub metadata: serde_json::Value,
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateLoginQueueEntry {
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub category: String,
    pub metadata: serde_json::Value,
}

// ============================================
// Agent configuration (system prompt, default model)
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct AgentConfigRow {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub system_prompt: String,
    pub default_model: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAgentConfig {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub system_prompt: String,
    pub default_model: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateAgentConfig {
    pub name: Option<String>,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    pub default_model: Option<String>,
    pub status: Option<String>,
}

// ============================================
// Conversations & messages (working-memory persistence; internals of the
// rolling in-memory buffer itself are external to this spec, but the
// durable record of who-said-what is not)
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct ConversationRow {
    pub id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub conversation_id: Uuid,
    pub role: String,
    pub content: String,
}

// ============================================
// Job idempotency markers
// ============================================

/// "This-period-already-processed" marker row for the weekly digest,
/// keyed by `(user_id, week_start)`.
#[derive(Debug, Clone, FromRow)]
pub struct WeeklyDigestRow {
    pub user_id: String,
    pub week_start: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Lookup-by-natural-key marker for jobs that dedup on a domain key
/// (signal headline, meeting id, commitment id) rather than a period.
#[derive(Debug, Clone, FromRow)]
pub struct JobIdempotencyKeyRow {
    pub job_name: String,
    pub user_id: String,
    pub natural_key: String,
    pub created_at: DateTime<Utc>,
}

// ============================================
// Job run history (Background Job Runner)
// ============================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct JobRunRow {
    pub id: Uuid,
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub users_checked: i32,
    pub users_skipped_off_hours: i32,
    pub errors: i32,
    #[sqlx(json)]
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct CreateJobRun {
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub users_checked: i32,
    pub users_skipped_off_hours: i32,
    pub errors: i32,
    pub extra: serde_json::Value,
}
