//! Daily reset boundary.

use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone};

/// Returns the first local midnight strictly after `now`.
///
/// If that midnight does not exist locally (DST gap), the first valid instant
/// an hour later is used.
pub fn next_local_midnight(now: DateTime<Local>) -> DateTime<Local> {
    let fallback = now + TimeDelta::days(1);
    let Some(tomorrow) = now.date_naive().succ_opt() else {
        return fallback;
    };
    let midnight = tomorrow.and_time(NaiveTime::MIN);

    Local
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(midnight + TimeDelta::hours(1)))
                .earliest()
        })
        .unwrap_or(fallback)
}
