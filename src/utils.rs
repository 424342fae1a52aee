use chrono::{DateTime, Duration, Utc};

use crate::constants::MODEL_CYCLE_HOURS;

pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .init();
}

pub fn floor_timestamp(timestamp: DateTime<Utc>, step_seconds: i64) -> DateTime<Utc> {
    let step_ms = step_seconds.max(1) * 1000;
    let floored_ms = timestamp.timestamp_millis().div_euclid(step_ms) * step_ms;
    DateTime::<Utc>::from_timestamp_millis(floored_ms).unwrap_or(timestamp)
}

/// Forecast valid time for `days_ahead`: one 12-hour model step per day past
/// the first, truncated to the whole hour. Offsets beyond chrono's range
/// saturate at the representable bounds.
pub fn resolve_valid_time(now: DateTime<Utc>, days_ahead: i32) -> DateTime<Utc> {
    let offset_hours = MODEL_CYCLE_HOURS * (i64::from(days_ahead) - 1);
    let shifted = Duration::try_hours(offset_hours)
        .and_then(|offset| now.checked_add_signed(offset))
        .unwrap_or(if offset_hours >= 0 {
            DateTime::<Utc>::MAX_UTC
        } else {
            DateTime::<Utc>::MIN_UTC
        });
    floor_timestamp(shifted, 3600)
}

pub fn format_query_time(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
