// User DTO. The user table's full schema (auth, roles) is out of scope;
// this crate only needs the fields the core reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// IANA timezone name (e.g. "America/New_York"). Falls back to UTC
    /// when absent or unrecognized.
    #[serde(default)]
    pub timezone: Option<String>,
    pub created_at: DateTime<Utc>,
}
