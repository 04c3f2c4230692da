use chrono::{DateTime, Local};
use serde::Serialize;

/// Usage across all callers for the current reset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlobalUsage {
    /// Admissions since the last reset.
    pub count: u32,
    /// Next reset instant (local midnight).
    pub reset_at: DateTime<Local>,
}

/// Usage of a single caller.
///
/// `daily_count` is zeroed by the global reset; `last_request_at` never is,
/// so a cooldown straddling midnight still applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CallerUsage {
    /// Admissions in the current reset window.
    pub daily_count: u32,
    /// Time of the last admitted submission.
    pub last_request_at: Option<DateTime<Local>>,
}

/// Read-only quota snapshot for one caller, as exposed at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageView {
    /// Caller the snapshot is for.
    pub caller: String,
    /// Caller admissions in the current window.
    pub caller_count: u32,
    /// Per-caller daily limit.
    pub caller_limit: u32,
    /// Admissions across all callers in the current window.
    pub global_count: u32,
    /// Global daily limit.
    pub global_limit: u32,
    /// Seconds until the caller may submit again (`None` = not cooling down).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    /// Next reset instant.
    pub reset_at: DateTime<Local>,
}

impl UsageView {
    /// Remaining admissions for this caller, bounded by the global budget.
    pub fn remaining(&self) -> u32 {
        let caller_left = self.caller_limit.saturating_sub(self.caller_count);
        let global_left = self.global_limit.saturating_sub(self.global_count);
        caller_left.min(global_left)
    }
}
