//! # Queue events emitted by the actor, the job runner and subscriber workers.
//!
//! [`EventKind`] groups events into:
//! - **Admission**: a submission admitted or rejected, daily quota reset
//! - **Execution**: job started, completed, failed, timed out; cooldown scheduled; queue idle
//! - **Housekeeping**: finished records evicted by retention
//! - **Subscriber**: overflow or panic inside a subscriber worker
//!
//! [`Event`] carries the metadata relevant to its kind (job id, caller,
//! reason, delay, ...).
//!
//! ## Ordering guarantees
//! Each event has a process-wide sequence number (`seq`) that increases
//! monotonically, so consumers can restore emission order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use ratequeue::{Event, EventKind, JobId};
//!
//! let job = JobId::new();
//! let ev = Event::new(EventKind::CooldownScheduled)
//!     .with_queue("global")
//!     .with_job(job)
//!     .with_delay(Duration::from_secs(60));
//!
//! assert_eq!(ev.job, Some(job));
//! assert_eq!(ev.delay_ms, Some(60_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::store::JobId;

/// Process-wide sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of queue events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Admission ===
    /// Submission passed every check and was enqueued.
    ///
    /// Sets: `queue`, `job`, `caller`, `count` (queue depth after enqueue).
    JobAdmitted,

    /// Submission refused.
    ///
    /// Sets: `queue`, `caller`, `reason` (rejection label and message).
    JobRejected,

    /// Daily counters were zeroed by the lazy reset.
    ///
    /// Sets: `queue`.
    QuotaReset,

    // === Execution ===
    /// Job popped from the queue and handed to the handler.
    ///
    /// Sets: `queue`, `job`, `caller`.
    JobStarted,

    /// Handler returned a result; job is `done`.
    ///
    /// Sets: `queue`, `job`, `caller`.
    JobCompleted,

    /// Handler failed (or timed out); job is `error`.
    ///
    /// Sets: `queue`, `job`, `caller`, `reason`.
    JobFailed,

    /// Handler exceeded its deadline (always followed by `JobFailed`).
    ///
    /// Sets: `queue`, `job`, `timeout_ms`.
    JobTimedOut,

    /// Drainer is pausing before the next job.
    ///
    /// Sets: `queue`, `job` (the job just finished), `delay_ms`.
    CooldownScheduled,

    /// Queue drained; scheduler went back to idle.
    ///
    /// Sets: `queue`.
    QueueIdle,

    // === Housekeeping ===
    /// Finished records dropped by the retention policy.
    ///
    /// Sets: `queue`, `count`.
    JobsEvicted,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason` (subscriber name and cause).
    SubscriberOverflow,

    /// Subscriber panicked while handling an event.
    ///
    /// Sets: `reason` (subscriber name and panic info).
    SubscriberPanicked,
}

/// Queue event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Monotonic, process-wide sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Logical queue name.
    pub queue: Option<Arc<str>>,
    /// Job the event is about.
    pub job: Option<JobId>,
    /// Caller the event is about.
    pub caller: Option<Arc<str>>,
    /// Human-readable reason (rejections, failures, subscriber issues).
    pub reason: Option<Arc<str>>,
    /// Delay before the next job in milliseconds.
    pub delay_ms: Option<u32>,
    /// Handler deadline in milliseconds.
    pub timeout_ms: Option<u32>,
    /// Generic counter (queue depth, evicted records).
    pub count: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            queue: None,
            job: None,
            caller: None,
            reason: None,
            delay_ms: None,
            timeout_ms: None,
            count: None,
        }
    }

    /// Attaches the queue name.
    #[inline]
    pub fn with_queue(mut self, queue: impl Into<Arc<str>>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    /// Attaches a job id.
    #[inline]
    pub fn with_job(mut self, job: JobId) -> Self {
        self.job = Some(job);
        self
    }

    /// Attaches a caller id.
    #[inline]
    pub fn with_caller(mut self, caller: impl Into<Arc<str>>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a cooldown delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a handler deadline (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a counter value.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::JobAdmitted);
        let b = Event::new(EventKind::JobAdmitted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_saturate_at_u32_millis() {
        let ev = Event::new(EventKind::JobTimedOut).with_timeout(Duration::from_secs(u64::MAX / 4));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }
}
