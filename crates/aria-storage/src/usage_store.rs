// Postgres-backed `aria_core::cost_governor::UsageStore` adapter.

use async_trait::async_trait;
use aria_core::cost_governor::{UsageRecord, UsageStore};
use aria_core::error::{AriaError, Result};

use crate::repositories::{today_utc, Database};

/// Wraps `Database` to satisfy the Cost Governor's storage seam, the same
/// way a `DbAgentStore`/`DbEventEmitter` wraps it for its own trait.
pub struct DbUsageStore {
    db: Database,
}

impl DbUsageStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UsageStore for DbUsageStore {
    async fn get_today_usage(&self, user_id: &str) -> Result<UsageRecord> {
        let row = self
            .db
            .get_usage_tracking_row(user_id, today_utc())
            .await
            .map_err(|e| AriaError::execution_failure(e.to_string()))?;

        Ok(match row {
            Some(row) => UsageRecord {
                input_tokens: row.input_tokens.max(0) as u64,
                output_tokens: row.output_tokens.max(0) as u64,
                thinking_tokens: row.thinking_tokens.max(0) as u64,
            },
            None => UsageRecord::default(),
        })
    }

    async fn increment_usage(
        &self,
        user_id: &str,
        input_tokens: u64,
        output_tokens: u64,
        thinking_tokens: u64,
    ) -> Result<()> {
        self.db
            .increment_usage_tracking(
                user_id,
                today_utc(),
                input_tokens as i64,
                output_tokens as i64,
                thinking_tokens as i64,
            )
            .await
            .map_err(|e| AriaError::execution_failure(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_record_defaults_to_zero() {
        let record = UsageRecord::default();
        assert_eq!(record.total_tokens(), 0);
    }
}
