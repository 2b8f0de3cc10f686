// Delivery decision and the three persisted queues the Proactive Router
// writes to (notifications, briefing_queue, login_message_queue).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::insight::InsightCategory;

/// Which channel(s) a given insight was routed to. Purely descriptive —
/// the actual routing decision logic lives in `aria-worker::router`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeliveryDecision {
    pub live_stream: bool,
    pub notification: bool,
    pub login_queue: bool,
    pub briefing_queue: bool,
    pub suppressed_duplicate: bool,
}

impl DeliveryDecision {
    pub fn none() -> Self {
        Self {
            live_stream: false,
            notification: false,
            login_queue: false,
            briefing_queue: false,
            suppressed_duplicate: false,
        }
    }

    pub fn duplicate() -> Self {
        Self {
            suppressed_duplicate: true,
            ..Self::none()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    MarketSignal,
    WeeklyDigest,
    MeetingDebrief,
    OverdueCommitment,
}

impl From<InsightCategory> for NotificationType {
    fn from(category: InsightCategory) -> Self {
        match category {
            InsightCategory::MarketSignal => NotificationType::MarketSignal,
            InsightCategory::WeeklyDigest => NotificationType::WeeklyDigest,
            InsightCategory::MeetingDebrief => NotificationType::MeetingDebrief,
            InsightCategory::OverdueCommitment => NotificationType::OverdueCommitment,
        }
    }
}

/// Wire shape for the user-facing inbox. Matches the `notifications` table
/// of `spec.md` §6 exactly: no stored priority, `read_at` rather than a
/// boolean flag.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub user_id: String,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BriefingQueueRow {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginQueueRow {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
}
