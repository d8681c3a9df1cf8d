//! Time utilities: timezone-aware deadlines and signed hour arithmetic.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Parse a deadline like "2026-11-01 23:59" in an IANA tz like "America/New_York",
/// returning UTC. College portals publish deadlines in campus-local time.
pub fn parse_local_deadline_to_utc(local: &str, tz: &str) -> Result<DateTime<Utc>> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;

    let ndt = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M")
        .map_err(|e| anyhow::anyhow!("invalid local datetime '{local}': {e}"))?;

    let local_dt = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous or invalid local time (DST?): {local} {tz}"))?;

    Ok(local_dt.with_timezone(&Utc))
}

/// Signed wall-clock hours from `from` to `to`; negative when `to` is in the past.
pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}
