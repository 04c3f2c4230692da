//! # Quota ledger: global and per-caller daily usage.
//!
//! Pure data plus reset logic, no I/O. The ledger is owned by the queue actor,
//! which is the only thing that ever mutates it.
//!
//! ## Admission protocol
//! ```text
//! check_and_reset_if_expired(now)   lazy daily reset
//! check_global()                    read-only, count < global limit
//! check_caller(caller, now)         read-only, daily limit then cooldown
//! commit(caller, now)               both increments, only after all checks passed
//! ```
//!
//! Checks never write, so a rejected submission leaves every counter as it
//! was. Check and commit are not separated by any await point inside the
//! actor, which makes the sequence atomic with respect to other submissions.
//!
//! ## Reset
//! When `now` is past `reset_at`, the global count and every caller's daily
//! count go back to zero and `reset_at` moves to the next local midnight.
//! There is no timer: figures stay stale until the next admission attempt.

mod reset;
mod usage;

pub use reset::next_local_midnight;
pub use usage::{CallerUsage, GlobalUsage, UsageView};

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::{config::QuotaPolicy, error::RejectReason};

/// Global and per-caller usage for the current reset window.
#[derive(Debug, Clone)]
pub struct QuotaLedger {
    policy: QuotaPolicy,
    global: GlobalUsage,
    callers: HashMap<String, CallerUsage>,
}

impl QuotaLedger {
    /// Creates an empty ledger whose first reset is the local midnight after `now`.
    pub fn new(policy: QuotaPolicy, now: DateTime<Local>) -> Self {
        Self {
            policy,
            global: GlobalUsage {
                count: 0,
                reset_at: next_local_midnight(now),
            },
            callers: HashMap::new(),
        }
    }

    /// Limits this ledger enforces.
    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Applies the daily reset if `now` is past the reset instant.
    ///
    /// Returns `true` when counters were zeroed.
    pub fn check_and_reset_if_expired(&mut self, now: DateTime<Local>) -> bool {
        if now <= self.global.reset_at {
            return false;
        }
        self.global.count = 0;
        for usage in self.callers.values_mut() {
            usage.daily_count = 0;
        }
        self.global.reset_at = next_local_midnight(now);
        true
    }

    /// Fails with `GlobalLimitReached` once the global budget is spent.
    pub fn check_global(&self) -> Result<(), RejectReason> {
        if self.global.count >= self.policy.global_daily_limit {
            return Err(RejectReason::GlobalLimitReached {
                limit: self.policy.global_daily_limit,
            });
        }
        Ok(())
    }

    /// Fails with `CallerLimitReached` or `CallerCoolingDown` for `caller`.
    ///
    /// An unknown caller passes; its record is created on [`commit`](Self::commit).
    pub fn check_caller(&self, caller: &str, now: DateTime<Local>) -> Result<(), RejectReason> {
        let Some(usage) = self.callers.get(caller) else {
            return Ok(());
        };
        if usage.daily_count >= self.policy.caller_daily_limit {
            return Err(RejectReason::CallerLimitReached {
                limit: self.policy.caller_daily_limit,
            });
        }
        match self.cooldown_remaining(usage, now) {
            Some(retry_after_secs) => Err(RejectReason::CallerCoolingDown { retry_after_secs }),
            None => Ok(()),
        }
    }

    /// Records one admission for `caller` and for the global count.
    pub fn commit(&mut self, caller: &str, now: DateTime<Local>) {
        self.global.count = self.global.count.saturating_add(1);
        let usage = self.callers.entry(caller.to_owned()).or_default();
        usage.daily_count = usage.daily_count.saturating_add(1);
        usage.last_request_at = Some(now);
    }

    /// Global usage as stored (not adjusted for an expired window).
    pub fn global_usage(&self) -> GlobalUsage {
        self.global
    }

    /// Caller usage as stored, if the caller was ever admitted.
    pub fn caller_usage(&self, caller: &str) -> Option<CallerUsage> {
        self.callers.get(caller).copied()
    }

    /// Number of callers with a usage record.
    pub fn caller_count(&self) -> usize {
        self.callers.len()
    }

    /// Snapshot for `caller` as it would be seen by a submission at `now`.
    ///
    /// Does not mutate: an expired window is reported as zero usage.
    pub fn usage_view(&self, caller: &str, now: DateTime<Local>) -> UsageView {
        let expired = now > self.global.reset_at;
        let usage = self.callers.get(caller).copied().unwrap_or_default();
        let (global_count, caller_count, reset_at) = if expired {
            (0, 0, next_local_midnight(now))
        } else {
            (self.global.count, usage.daily_count, self.global.reset_at)
        };

        UsageView {
            caller: caller.to_owned(),
            caller_count,
            caller_limit: self.policy.caller_daily_limit,
            global_count,
            global_limit: self.policy.global_daily_limit,
            retry_after_secs: self.cooldown_remaining(&usage, now),
            reset_at,
        }
    }

    /// Whole seconds (ceiling) until `usage` leaves its cooldown, if it is in one.
    fn cooldown_remaining(&self, usage: &CallerUsage, now: DateTime<Local>) -> Option<u64> {
        let last = usage.last_request_at?;
        // A clock that moved backwards counts as no time elapsed.
        let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
        let remaining = self.policy.caller_cooldown.checked_sub(elapsed)?;
        if remaining.is_zero() {
            return None;
        }
        let secs = remaining
            .as_secs()
            .saturating_add(u64::from(remaining.subsec_nanos() > 0));
        Some(secs)
    }
}
