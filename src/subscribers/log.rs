//! # LogWriter: events as structured `tracing` records
//!
//! ```text
//! INFO  job admitted   queue=global job=5f0c… caller=u1 depth=1
//! INFO  job rejected   queue=global caller=u1 reason="caller_cooling_down: …"
//! INFO  job started    queue=global job=5f0c… caller=u1
//! WARN  job failed     queue=global job=5f0c… caller=u1 reason="upstream 502"
//! DEBUG cooldown       queue=global job=5f0c… delay_ms=60000
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that renders every event through `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let queue = e.queue.as_deref().unwrap_or("-");
        let caller = e.caller.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        let job = e.job.map(|j| j.to_string()).unwrap_or_default();

        match e.kind {
            EventKind::JobAdmitted => {
                let depth = e.count.unwrap_or_default();
                tracing::info!(queue, %job, caller, depth, "job admitted");
            }
            EventKind::JobRejected => {
                tracing::info!(queue, caller, reason, "job rejected");
            }
            EventKind::QuotaReset => {
                tracing::info!(queue, "daily quota reset");
            }
            EventKind::JobStarted => {
                tracing::info!(queue, %job, caller, "job started");
            }
            EventKind::JobCompleted => {
                tracing::info!(queue, %job, caller, "job completed");
            }
            EventKind::JobFailed => {
                tracing::warn!(queue, %job, caller, reason, "job failed");
            }
            EventKind::JobTimedOut => {
                let timeout_ms = e.timeout_ms.unwrap_or_default();
                tracing::warn!(queue, %job, timeout_ms, "job timed out");
            }
            EventKind::CooldownScheduled => {
                let delay_ms = e.delay_ms.unwrap_or_default();
                tracing::debug!(queue, %job, delay_ms, "cooldown");
            }
            EventKind::QueueIdle => {
                tracing::debug!(queue, "queue idle");
            }
            EventKind::JobsEvicted => {
                let evicted = e.count.unwrap_or_default();
                tracing::debug!(queue, evicted, "finished jobs evicted");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
