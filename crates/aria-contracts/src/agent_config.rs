// Persisted agent configuration (system prompt, default model, tags) — an
// ambient administrative entity, distinct from the polymorphic `Agent`
// trait in aria-core that the Orchestrator dispatches to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AgentConfigStatus {
    Active,
    Archived,
}

impl std::fmt::Display for AgentConfigStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentConfigStatus::Active => write!(f, "active"),
            AgentConfigStatus::Archived => write!(f, "archived"),
        }
    }
}

impl From<&str> for AgentConfigStatus {
    fn from(s: &str) -> Self {
        match s {
            "archived" => AgentConfigStatus::Archived,
            _ => AgentConfigStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentConfigDto {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub system_prompt: String,
    pub default_model: String,
    pub status: AgentConfigStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
