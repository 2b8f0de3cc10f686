// JobRunSummary: what a single Background Job Runner invocation reports
// after sweeping every active user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobRunSummary {
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub users_checked: u32,
    pub users_skipped_off_hours: u32,
    pub errors: u32,
    /// Job-specific counters (e.g. `signals_routed_high`,
    /// `digests_skipped_existing`), kept open-ended so each job can report
    /// its own stats without a schema change here.
    #[serde(default)]
    pub extra: HashMap<String, u64>,
}

impl JobRunSummary {
    pub fn new(job_name: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            job_name: job_name.into(),
            started_at,
            finished_at: started_at,
            users_checked: 0,
            users_skipped_off_hours: 0,
            errors: 0,
            extra: HashMap::new(),
        }
    }

    pub fn increment(&mut self, key: &str) {
        *self.extra.entry(key.to_string()).or_insert(0) += 1;
    }
}
