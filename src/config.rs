//! # Queue configuration.
//!
//! [`QueueConfig`] centralizes the quota policy and scheduler timings for one
//! queue actor. The defaults are the production policy:
//!
//! | Setting              | Default        |
//! |----------------------|----------------|
//! | global daily limit   | 50             |
//! | caller daily limit   | 5              |
//! | caller cooldown      | 60s            |
//! | inter-job cooldown   | 60s            |
//! | handler deadline     | 5 min          |
//! | retention            | 10 000 / 24h   |
//!
//! ## Sentinel values
//! - `handler_timeout = 0s` → no deadline
//! - `retention.max_records = 0` → no count bound
//! - `retention.max_age = 0s` → no age bound

use std::time::Duration;

/// Configuration for a single queue actor.
///
/// All fields are public; prefer the helper accessors over checking sentinels
/// (`0`) at call sites.
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Logical queue name (carried in events and logs).
    pub name: String,

    /// Admissions allowed per reset window across all callers.
    pub global_daily_limit: u32,

    /// Admissions allowed per reset window for one caller.
    pub caller_daily_limit: u32,

    /// Minimum gap between two admissions of the same caller.
    pub caller_cooldown: Duration,

    /// Pause after each job before the next one starts.
    ///
    /// Applies across callers: all jobs share one execution slot.
    pub job_cooldown: Duration,

    /// Deadline for one handler call (`Duration::ZERO` = none).
    ///
    /// On expiry the job is marked `error` and the queue advances.
    pub handler_timeout: Duration,

    /// Retention of finished job records.
    pub retention: RetentionPolicy,

    /// Capacity of the actor mailbox (clamped to at least 1).
    pub mailbox_capacity: usize,

    /// Capacity of the event bus ring buffer (clamped to at least 1).
    pub bus_capacity: usize,
}

impl QueueConfig {
    /// Returns the handler deadline as an `Option`.
    ///
    /// - `None` → handler may run forever
    /// - `Some(d)` → deadline applied per job
    #[inline]
    pub fn handler_deadline(&self) -> Option<Duration> {
        if self.handler_timeout == Duration::ZERO {
            None
        } else {
            Some(self.handler_timeout)
        }
    }

    /// Mailbox capacity clamped to a minimum of 1.
    #[inline]
    pub fn mailbox_capacity_clamped(&self) -> usize {
        self.mailbox_capacity.max(1)
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Quota part of the configuration, as consumed by the ledger.
    pub fn quota_policy(&self) -> QuotaPolicy {
        QuotaPolicy {
            global_daily_limit: self.global_daily_limit,
            caller_daily_limit: self.caller_daily_limit,
            caller_cooldown: self.caller_cooldown,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "global".to_string(),
            global_daily_limit: 50,
            caller_daily_limit: 5,
            caller_cooldown: Duration::from_secs(60),
            job_cooldown: Duration::from_secs(60),
            handler_timeout: Duration::from_secs(300),
            retention: RetentionPolicy::default(),
            mailbox_capacity: 1024,
            bus_capacity: 1024,
        }
    }
}

/// Limits enforced by the quota ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuotaPolicy {
    /// Admissions per reset window, all callers combined.
    pub global_daily_limit: u32,
    /// Admissions per reset window, per caller.
    pub caller_daily_limit: u32,
    /// Minimum gap between admissions of one caller.
    pub caller_cooldown: Duration,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        QueueConfig::default().quota_policy()
    }
}

/// Bounds on how many finished job records are kept, and for how long.
///
/// Only `done`/`error` records are evicted; pending and processing jobs stay
/// until they finish. Evicted ids answer `NotFound`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Maximum finished records kept (`0` = unbounded).
    pub max_records: usize,
    /// Maximum age of a finished record, measured from completion (`0s` = unbounded).
    pub max_age: Duration,
}

impl RetentionPolicy {
    /// Keeps every record forever.
    pub const UNBOUNDED: Self = Self {
        max_records: 0,
        max_age: Duration::ZERO,
    };

    /// Default count bound with the given age bound; `0s` keeps everything forever.
    pub fn for_age(max_age: Duration) -> Self {
        if max_age == Duration::ZERO {
            Self::UNBOUNDED
        } else {
            Self {
                max_age,
                ..Self::default()
            }
        }
    }

    /// Count bound as an `Option`.
    #[inline]
    pub fn record_limit(&self) -> Option<usize> {
        (self.max_records != 0).then_some(self.max_records)
    }

    /// Age bound as an `Option`.
    #[inline]
    pub fn age_limit(&self) -> Option<Duration> {
        (self.max_age != Duration::ZERO).then_some(self.max_age)
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_records: 10_000,
            max_age: Duration::from_secs(24 * 60 * 60),
        }
    }
}
