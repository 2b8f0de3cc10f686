// Business-hours gating for the Background Job Runner.
//
// Every time-sensitive check uses the user's timezone, falling back to UTC
// on lookup failure.

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;

/// Default business-hours window, user-local. Matches the "don't wake
/// anyone up" intent in `spec.md` §4.4's business-hours gate.
pub const BUSINESS_HOURS_START: u32 = 7;
pub const BUSINESS_HOURS_END: u32 = 21;

/// Resolves an IANA timezone name, falling back to UTC on any lookup
/// failure (missing, malformed, or unknown).
pub fn resolve_timezone(timezone: Option<&str>) -> Tz {
    timezone
        .and_then(|tz| tz.parse::<Tz>().ok())
        .unwrap_or(chrono_tz::UTC)
}

/// True when `now` falls within the default business-hours window in the
/// given timezone.
pub fn is_business_hours(now: DateTime<Utc>, tz: Tz) -> bool {
    let local = now.with_timezone(&tz);
    let hour = local.hour();
    hour >= BUSINESS_HOURS_START && hour < BUSINESS_HOURS_END
}

/// The weekly digest's gate: Monday, local hour >= 7. Not "Monday 07:00"
/// exactly — a job invocation landing at 07:05 or 09:00 local on Monday
/// still passes.
pub fn is_weekly_digest_window(now: DateTime<Utc>, tz: Tz) -> bool {
    let local = now.with_timezone(&tz);
    local.weekday() == chrono::Weekday::Mon && local.hour() >= 7
}

/// The Monday (local) that `now` falls in, used as the `week_start`
/// idempotency key. Returns the date of the most recent Monday at or
/// before `now`, local to `tz`.
pub fn week_start(now: DateTime<Utc>, tz: Tz) -> chrono::NaiveDate {
    let local = now.with_timezone(&tz).date_naive();
    let days_since_monday = local.weekday().num_days_from_monday();
    local - chrono::Duration::days(days_since_monday as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unknown_timezone_falls_back_to_utc() {
        assert_eq!(resolve_timezone(Some("Not/AZone")), chrono_tz::UTC);
        assert_eq!(resolve_timezone(None), chrono_tz::UTC);
    }

    #[test]
    fn business_hours_respects_local_offset() {
        // 2026-01-05 is a Monday. 06:00 UTC is 22:00 previous day in
        // America/Los_Angeles (UTC-8 in January) -- outside business hours.
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 6, 0, 0).unwrap();
        let la = "America/Los_Angeles".parse::<Tz>().unwrap();
        assert!(!is_business_hours(now, la));

        let mid_morning = Utc.with_ymd_and_hms(2026, 1, 5, 17, 0, 0).unwrap();
        assert!(is_business_hours(mid_morning, la));
    }

    #[test]
    fn weekly_digest_window_accepts_any_monday_hour_after_seven() {
        let utc = chrono_tz::UTC;
        let seven_oh_five = Utc.with_ymd_and_hms(2026, 1, 5, 7, 5, 0).unwrap();
        assert!(is_weekly_digest_window(seven_oh_five, utc));

        let nine_am = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        assert!(is_weekly_digest_window(nine_am, utc));

        let before_seven = Utc.with_ymd_and_hms(2026, 1, 5, 6, 59, 0).unwrap();
        assert!(!is_weekly_digest_window(before_seven, utc));

        let tuesday = Utc.with_ymd_and_hms(2026, 1, 6, 9, 0, 0).unwrap();
        assert!(!is_weekly_digest_window(tuesday, utc));
    }

    #[test]
    fn week_start_is_stable_across_the_week() {
        let utc = chrono_tz::UTC;
        let monday = Utc.with_ymd_and_hms(2026, 1, 5, 7, 0, 0).unwrap();
        let thursday = Utc.with_ymd_and_hms(2026, 1, 8, 20, 0, 0).unwrap();
        assert_eq!(week_start(monday, utc), week_start(thursday, utc));
    }
}
