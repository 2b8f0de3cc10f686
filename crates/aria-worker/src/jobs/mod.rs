// The four example jobs (`spec.md` §4.4), each following the documented
// per-invocation skeleton: load active users -> timezone/business-hours
// gate -> gather inputs -> dispatch domain work -> idempotency check ->
// persist -> route -> `JobRunSummary`.

pub mod debrief_prompt;
pub mod overdue_commitment;
pub mod signal_scan;
pub mod weekly_digest;

use async_trait::async_trait;

/// A source of tracked entities (competitors, leads, monitored companies)
/// the signal-scan job unions together. The core doesn't hardcode a schema
/// for "leads" or "monitored entities" -- those tables are out of scope --
/// so each concrete source is a thin adapter over whatever external query
/// actually backs it.
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Human-readable name, used only in logs.
    fn name(&self) -> &str;

    /// Entity names this source contributes for the given user.
    async fn entities_for_user(&self, user_id: &str) -> anyhow::Result<Vec<String>>;
}

/// An `EntitySource` that always returns nothing -- used to let the job
/// runner compile and run against no real integration data, since the
/// third-party OAuth broker is deliberately left unimplemented.
pub struct EmptyEntitySource {
    pub label: &'static str,
}

#[async_trait]
impl EntitySource for EmptyEntitySource {
    fn name(&self) -> &str {
        self.label
    }

    async fn entities_for_user(&self, _user_id: &str) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }
}

pub use debrief_prompt::run_debrief_prompt;
pub use overdue_commitment::run_overdue_commitment;
pub use signal_scan::{gather_scan_entities, run_signal_scan};
pub use weekly_digest::run_weekly_digest;
