use chrono::{DateTime, Duration, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Anything last touched before the returned instant counts as idle.
pub fn idle_cutoff(now: DateTime<Utc>, idle_minutes: i64) -> DateTime<Utc> {
    now - Duration::minutes(idle_minutes.max(0))
}
