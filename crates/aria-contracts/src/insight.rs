// InsightEnvelope: the shared shape every proactive finding (signal,
// digest, debrief prompt, commitment reminder) is wrapped in before it
// reaches the Proactive Router.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum InsightPriority {
    High,
    Medium,
    Low,
}

/// Closed category enum. Each variant maps to exactly one delivery
/// notification type (see `aria-worker::router`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    MarketSignal,
    WeeklyDigest,
    MeetingDebrief,
    OverdueCommitment,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InsightEnvelope {
    pub user_id: String,
    pub category: InsightCategory,
    pub priority: InsightPriority,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}
