// Repository layer for database operations.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::*;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUser) -> Result<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, name, timezone)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, timezone, created_at
            "#,
        )
        .bind(&input.email)
        .bind(&input.name)
        .bind(&input.timezone)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, timezone, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Active users (completed onboarding) for the Job Runner's per-invocation sweep.
    pub async fn list_active_users(&self) -> Result<Vec<UserRow>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, timezone, created_at
            FROM users
            WHERE onboarding_completed_at IS NOT NULL
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ============================================
    // Goals
    // ============================================

    pub async fn create_goal(&self, input: CreateGoal) -> Result<GoalRow> {
        let row = sqlx::query_as::<_, GoalRow>(
            r#"
            INSERT INTO goals (user_id, description, status)
            VALUES ($1, $2, 'pending')
            RETURNING id, user_id, description, status, created_at, updated_at
            "#,
        )
        .bind(input.user_id)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_goal(&self, id: Uuid) -> Result<Option<GoalRow>> {
        let row = sqlx::query_as::<_, GoalRow>(
            "SELECT id, user_id, description, status, created_at, updated_at FROM goals WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_goal_status(&self, id: Uuid, status: &str) -> Result<Option<GoalRow>> {
        let row = sqlx::query_as::<_, GoalRow>(
            r#"
            UPDATE goals
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, description, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_goals_for_user(&self, user_id: Uuid) -> Result<Vec<GoalRow>> {
        let rows = sqlx::query_as::<_, GoalRow>(
            r#"
            SELECT id, user_id, description, status, created_at, updated_at
            FROM goals
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ============================================
    // Conversations & messages
    // ============================================

    pub async fn create_conversation(&self, user_id: &str) -> Result<ConversationRow> {
        let row = sqlx::query_as::<_, ConversationRow>(
            r#"
            INSERT INTO conversations (user_id)
            VALUES ($1)
            RETURNING id, user_id, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// The user's most-recently-updated conversation, used when a
    /// `user.message` arrives without a `conversation_id`.
    pub async fn most_recent_conversation(&self, user_id: &str) -> Result<Option<ConversationRow>> {
        let row = sqlx::query_as::<_, ConversationRow>(
            r#"
            SELECT id, user_id, created_at, updated_at
            FROM conversations
            WHERE user_id = $1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_conversation(&self, id: Uuid) -> Result<Option<ConversationRow>> {
        let row = sqlx::query_as::<_, ConversationRow>(
            "SELECT id, user_id, created_at, updated_at FROM conversations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn append_message(&self, input: CreateMessage) -> Result<MessageRow> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (conversation_id, role, content)
            VALUES ($1, $2, $3)
            RETURNING id, conversation_id, role, content, created_at
            "#,
        )
        .bind(input.conversation_id)
        .bind(&input.role)
        .bind(&input.content)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE conversations SET updated_at = NOW() WHERE id = $1")
            .bind(input.conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row)
    }

    /// Most recent `limit` messages, oldest first, for building LLM context.
    pub async fn recent_messages(
        &self,
        conversation_id: Uuid,
        limit: i64,
    ) -> Result<Vec<MessageRow>> {
        let mut rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, conversation_id, role, content, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.reverse();
        Ok(rows)
    }

    // ============================================
    // Usage tracking (Cost Governor storage seam)
    // ============================================

    pub async fn get_usage_tracking_row(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<UsageTrackingRow>> {
        let row = sqlx::query_as::<_, UsageTrackingRow>(
            r#"
            SELECT user_id, date, input_tokens, output_tokens, thinking_tokens
            FROM usage_tracking
            WHERE user_id = $1 AND date = $2
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_usage_tracking_for_user(
        &self,
        user_id: &str,
        since: NaiveDate,
    ) -> Result<Vec<UsageTrackingRow>> {
        let rows = sqlx::query_as::<_, UsageTrackingRow>(
            r#"
            SELECT user_id, date, input_tokens, output_tokens, thinking_tokens
            FROM usage_tracking
            WHERE user_id = $1 AND date >= $2
            ORDER BY date ASC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Upsert today's usage, incrementing existing counters atomically.
    pub async fn increment_usage_tracking(
        &self,
        user_id: &str,
        date: NaiveDate,
        input_tokens: i64,
        output_tokens: i64,
        thinking_tokens: i64,
    ) -> Result<UsageTrackingRow> {
        let row = sqlx::query_as::<_, UsageTrackingRow>(
            r#"
            INSERT INTO usage_tracking (user_id, date, input_tokens, output_tokens, thinking_tokens)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, date) DO UPDATE SET
                input_tokens = usage_tracking.input_tokens + EXCLUDED.input_tokens,
                output_tokens = usage_tracking.output_tokens + EXCLUDED.output_tokens,
                thinking_tokens = usage_tracking.thinking_tokens + EXCLUDED.thinking_tokens
            RETURNING user_id, date, input_tokens, output_tokens, thinking_tokens
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(input_tokens)
        .bind(output_tokens)
        .bind(thinking_tokens)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // Notifications
    // ============================================

    /// Dedup lookup: does a matching (user, category, title) row already
    /// exist within the last hour?
    pub async fn find_recent_duplicate_notification(
        &self,
        user_id: &str,
        notification_type: &str,
        title: &str,
    ) -> Result<Option<NotificationRow>> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, type, title, message, link, metadata, created_at, read_at
            FROM notifications
            WHERE user_id = $1 AND type = $2 AND title = $3
              AND created_at >= NOW() - INTERVAL '1 hour'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(notification_type)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn create_notification(&self, input: CreateNotification) -> Result<NotificationRow> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (user_id, type, title, message, link, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, type, title, message, link, metadata, created_at, read_at
            "#,
        )
        .bind(&input.user_id)
        .bind(&input.notification_type)
        .bind(&input.title)
        .bind(&input.message)
        .bind(&input.link)
        .bind(&input.metadata)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_notifications_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> Result<Vec<NotificationRow>> {
        let rows = if unread_only {
            sqlx::query_as::<_, NotificationRow>(
                r#"
                SELECT id, user_id, type, title, message, link, metadata, created_at, read_at
                FROM notifications
                WHERE user_id = $1 AND read_at IS NULL
                ORDER BY created_at DESC
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, NotificationRow>(
                r#"
                SELECT id, user_id, type, title, message, link, metadata, created_at, read_at
                FROM notifications
                WHERE user_id = $1
                ORDER BY created_at DESC
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows)
    }

    pub async fn mark_notification_read(&self, id: Uuid, user_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = NOW() WHERE id = $1 AND user_id = $2 AND read_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // ============================================
    // Briefing queue
    // ============================================

    pub async fn enqueue_briefing(&self, input: CreateBriefingQueueEntry) -> Result<BriefingQueueRow> {
        let row = sqlx::query_as::<_, BriefingQueueRow>(
            r#"
            INSERT INTO briefing_queue (user_id, title, message, category, metadata, consumed)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            RETURNING id, user_id, title, message, category, metadata, consumed, created_at
            "#,
        )
        .bind(&input.user_id)
        .bind(&input.title)
        .bind(&input.message)
        .bind(&input.category)
        .bind(&input.metadata)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Drain every unconsumed briefing row for a user whose creation time
    /// falls within the given window, marking them consumed. Rows
    /// consumed never transition back to unconsumed.
    pub async fn drain_briefing_queue(
        &self,
        user_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<BriefingQueueRow>> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, BriefingQueueRow>(
            r#"
            SELECT id, user_id, title, message, category, metadata, consumed, created_at
            FROM briefing_queue
            WHERE user_id = $1 AND consumed = FALSE
              AND created_at >= $2 AND created_at < $3
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(window_start)
        .bind(window_end)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE briefing_queue SET consumed = TRUE
            WHERE user_id = $1 AND consumed = FALSE
              AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(user_id)
        .bind(window_start)
        .bind(window_end)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(rows)
    }

    // ============================================
    // Login message queue
    // ============================================

    pub async fn enqueue_login_message(&self, input: CreateLoginQueueEntry) -> Result<LoginQueueRow> {
        let row = sqlx::query_as::<_, LoginQueueRow>(
            r#"
            INSERT INTO login_message_queue (user_id, title, message, category, metadata, delivered)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            RETURNING id, user_id, title, message, category, metadata, delivered, created_at
            "#,
        )
        .bind(&input.user_id)
        .bind(&input.title)
        .bind(&input.message)
        .bind(&input.category)
        .bind(&input.metadata)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Fetch and mark-delivered the undelivered queue for a user, replayed
    /// on the next WebSocket handshake.
    pub async fn drain_login_queue(&self, user_id: &str) -> Result<Vec<LoginQueueRow>> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, LoginQueueRow>(
            r#"
            SELECT id, user_id, title, message, category, metadata, delivered, created_at
            FROM login_message_queue
            WHERE user_id = $1 AND delivered = FALSE
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE login_message_queue SET delivered = TRUE WHERE user_id = $1 AND delivered = FALSE",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(rows)
    }

    // ============================================
    // Job idempotency markers
    // ============================================

    pub async fn weekly_digest_exists(&self, user_id: &str, week_start: NaiveDate) -> Result<bool> {
        let row = sqlx::query_as::<_, WeeklyDigestRow>(
            "SELECT user_id, week_start, created_at FROM weekly_digests WHERE user_id = $1 AND week_start = $2",
        )
        .bind(user_id)
        .bind(week_start)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Records the weekly-digest marker. Idempotent: a second call for the
    /// same `(user_id, week_start)` is a no-op rather than an error.
    pub async fn record_weekly_digest(&self, user_id: &str, week_start: NaiveDate) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO weekly_digests (user_id, week_start)
            VALUES ($1, $2)
            ON CONFLICT (user_id, week_start) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(week_start)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn job_idempotency_key_exists(
        &self,
        job_name: &str,
        user_id: &str,
        natural_key: &str,
    ) -> Result<bool> {
        let row = sqlx::query_as::<_, JobIdempotencyKeyRow>(
            r#"
            SELECT job_name, user_id, natural_key, created_at
            FROM job_idempotency_keys
            WHERE job_name = $1 AND user_id = $2 AND natural_key = $3
            "#,
        )
        .bind(job_name)
        .bind(user_id)
        .bind(natural_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    pub async fn record_job_idempotency_key(
        &self,
        job_name: &str,
        user_id: &str,
        natural_key: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO job_idempotency_keys (job_name, user_id, natural_key)
            VALUES ($1, $2, $3)
            ON CONFLICT (job_name, user_id, natural_key) DO NOTHING
            "#,
        )
        .bind(job_name)
        .bind(user_id)
        .bind(natural_key)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ============================================
    // Job run history
    // ============================================

    pub async fn record_job_run(&self, input: CreateJobRun) -> Result<JobRunRow> {
        let row = sqlx::query_as::<_, JobRunRow>(
            r#"
            INSERT INTO job_runs (job_name, started_at, finished_at, users_checked, users_skipped_off_hours, errors, extra)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, job_name, started_at, finished_at, users_checked, users_skipped_off_hours, errors, extra
            "#,
        )
        .bind(&input.job_name)
        .bind(input.started_at)
        .bind(input.finished_at)
        .bind(input.users_checked)
        .bind(input.users_skipped_off_hours)
        .bind(input.errors)
        .bind(&input.extra)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_recent_job_runs(&self, job_name: &str, limit: i64) -> Result<Vec<JobRunRow>> {
        let rows = sqlx::query_as::<_, JobRunRow>(
            r#"
            SELECT id, job_name, started_at, finished_at, users_checked, users_skipped_off_hours, errors, extra
            FROM job_runs
            WHERE job_name = $1
            ORDER BY started_at DESC
            LIMIT $2
            "#,
        )
        .bind(job_name)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ============================================
    // Agent configuration
    // ============================================

    pub async fn create_agent_config(&self, input: CreateAgentConfig) -> Result<AgentConfigRow> {
        let row = sqlx::query_as::<_, AgentConfigRow>(
            r#"
            INSERT INTO agent_configs (slug, name, description, system_prompt, default_model, status)
            VALUES ($1, $2, $3, $4, $5, 'active')
            RETURNING id, slug, name, description, system_prompt, default_model, status, created_at, updated_at
            "#,
        )
        .bind(&input.slug)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.system_prompt)
        .bind(&input.default_model)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_agent_config_by_slug(&self, slug: &str) -> Result<Option<AgentConfigRow>> {
        let row = sqlx::query_as::<_, AgentConfigRow>(
            r#"
            SELECT id, slug, name, description, system_prompt, default_model, status, created_at, updated_at
            FROM agent_configs
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_agent_configs(&self) -> Result<Vec<AgentConfigRow>> {
        let rows = sqlx::query_as::<_, AgentConfigRow>(
            r#"
            SELECT id, slug, name, description, system_prompt, default_model, status, created_at, updated_at
            FROM agent_configs
            WHERE status = 'active'
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn update_agent_config(
        &self,
        id: Uuid,
        input: UpdateAgentConfig,
    ) -> Result<Option<AgentConfigRow>> {
        let row = sqlx::query_as::<_, AgentConfigRow>(
            r#"
            UPDATE agent_configs
            SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                system_prompt = COALESCE($4, system_prompt),
                default_model = COALESCE($5, default_model),
                status = COALESCE($6, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, slug, name, description, system_prompt, default_model, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.system_prompt)
        .bind(&input.default_model)
        .bind(&input.status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

/// Today's date in UTC, matching `chrono::Utc::now().date_naive()` without
/// requiring the caller to import `chrono` directly.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}
