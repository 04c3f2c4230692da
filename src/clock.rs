//! # Wall-clock source for quota windows.
//!
//! Quota resets happen at local midnight, so the ledger needs calendar time
//! rather than a monotonic instant. [`Clock`] abstracts it:
//! - [`SystemClock`] reads [`chrono::Local::now`];
//! - [`ManualClock`] is set and advanced explicitly (tests, simulations).
//!
//! Scheduler delays (handler deadline, inter-job cooldown) use `tokio::time`
//! and are unaffected by this clock.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta};

/// Source of the current local time.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current local time.
    fn now(&self) -> DateTime<Local>;
}

/// Clock backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use chrono::{Local, TimeZone};
/// use ratequeue::{Clock, ManualClock};
///
/// let start = Local.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).single().unwrap();
/// let clock = ManualClock::new(start);
/// clock.advance(Duration::from_secs(90));
/// assert_eq!((clock.now() - start).num_seconds(), 90);
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward by `by`.
    ///
    /// A step past the end of the calendar leaves the clock where it is.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(next) = now.checked_add_signed(to_delta(by)) {
            *now = next;
        }
    }

    /// Jumps to an absolute time (may move backwards).
    pub fn set(&self, at: DateTime<Local>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Converts a std duration into a chrono delta, saturating on overflow.
pub(crate) fn to_delta(d: Duration) -> TimeDelta {
    TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn advance_moves_forward() {
        let clock = ManualClock::new(start());
        clock.advance(Duration::from_millis(1500));
        assert_eq!((clock.now() - start()).num_milliseconds(), 1500);
    }

    #[test]
    fn advance_past_the_calendar_is_ignored() {
        let clock = ManualClock::new(start());
        clock.advance(Duration::MAX);
        assert_eq!(clock.now(), start());

        clock.advance(Duration::from_secs(1));
        assert_eq!((clock.now() - start()).num_seconds(), 1);
    }

    #[test]
    fn to_delta_saturates() {
        assert_eq!(to_delta(Duration::MAX), TimeDelta::MAX);
        assert_eq!(to_delta(Duration::from_secs(60)), TimeDelta::seconds(60));
    }
}
