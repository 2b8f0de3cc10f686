// Wire/DB shape of the usage_tracking table (§6). The runtime-only
// UsageRecord/BudgetStatus types live in aria-core; this is the persisted
// row and its OpenAPI-visible projection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageTrackingRow {
    pub user_id: String,
    pub date: NaiveDate,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub thinking_tokens: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageSummary {
    pub user_id: String,
    pub days: Vec<UsageTrackingRow>,
    pub total_tokens: i64,
}
