// Job cadences, environment-overridable the way `aria_core::config` reads
// `COST_GOVERNOR_*`. The distilled spec names cadences in prose only
// ("signal scan every 15 minutes", "weekly digest Mondays at 07:00
// user-local"); this gives them concrete, overridable constants.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct JobRunnerConfig {
    pub signal_scan_interval: Duration,
    pub debrief_prompt_interval: Duration,
    pub overdue_commitment_interval: Duration,
    /// The weekly-digest job still only fires on Monday local hour >= 7
    /// (`business_hours::is_weekly_digest_window`); this is just how
    /// often the scheduler checks.
    pub weekly_digest_poll_interval: Duration,
}

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self {
            signal_scan_interval: Duration::from_secs(15 * 60),
            debrief_prompt_interval: Duration::from_secs(15 * 60),
            overdue_commitment_interval: Duration::from_secs(60 * 60),
            weekly_digest_poll_interval: Duration::from_secs(15 * 60),
        }
    }
}

impl JobRunnerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            signal_scan_interval: env_duration_secs(
                "JOB_SIGNAL_SCAN_INTERVAL_SECS",
                defaults.signal_scan_interval,
            ),
            debrief_prompt_interval: env_duration_secs(
                "JOB_DEBRIEF_PROMPT_INTERVAL_SECS",
                defaults.debrief_prompt_interval,
            ),
            overdue_commitment_interval: env_duration_secs(
                "JOB_OVERDUE_COMMITMENT_INTERVAL_SECS",
                defaults.overdue_commitment_interval,
            ),
            weekly_digest_poll_interval: env_duration_secs(
                "JOB_WEEKLY_DIGEST_POLL_INTERVAL_SECS",
                defaults.weekly_digest_poll_interval,
            ),
        }
    }
}

fn env_duration_secs(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_examples() {
        let cfg = JobRunnerConfig::default();
        assert_eq!(cfg.signal_scan_interval, Duration::from_secs(900));
        assert_eq!(cfg.debrief_prompt_interval, Duration::from_secs(900));
    }
}
