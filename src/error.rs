//! Error types used by the queue, its boundary handle and job handlers.
//!
//! - [`RejectReason`]: synchronous admission rejections (input and quota).
//! - [`SubmitError`] / [`StatusError`] / [`QueueClosed`]: errors surfaced by
//!   [`QueueHandle`](crate::QueueHandle).
//! - [`HandlerError`]: failures of a single job execution; captured per job
//!   and recorded as the job's terminal `error` status.
//! - [`TransitionError`]: illegal status changes inside the job store.
//!
//! Every enum provides `as_label` (stable snake_case) for logs and events.

use std::time::Duration;

use thiserror::Error;

use crate::store::{JobId, JobStatus};

/// # Reasons a submission is refused at admission time.
///
/// Rejections are synchronous and never change any counter or create a job.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Caller id or query missing/empty.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Global daily budget is spent.
    #[error("global daily limit ({limit}) reached")]
    GlobalLimitReached {
        /// Configured global daily limit.
        limit: u32,
    },

    /// Caller's daily budget is spent.
    #[error("caller daily limit ({limit}) reached")]
    CallerLimitReached {
        /// Configured per-caller daily limit.
        limit: u32,
    },

    /// Caller submitted too recently.
    #[error("caller must wait {retry_after_secs}s before next request")]
    CallerCoolingDown {
        /// Remaining cooldown, ceiling-rounded to whole seconds.
        retry_after_secs: u64,
    },
}

impl RejectReason {
    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use ratequeue::RejectReason;
    ///
    /// let r = RejectReason::CallerCoolingDown { retry_after_secs: 12 };
    /// assert_eq!(r.as_label(), "caller_cooling_down");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RejectReason::InvalidInput(_) => "invalid_input",
            RejectReason::GlobalLimitReached { .. } => "global_limit_reached",
            RejectReason::CallerLimitReached { .. } => "caller_limit_reached",
            RejectReason::CallerCoolingDown { .. } => "caller_cooling_down",
        }
    }

    /// True for quota and cooldown rejections (as opposed to bad input).
    pub fn is_quota(&self) -> bool {
        !matches!(self, RejectReason::InvalidInput(_))
    }
}

/// The queue actor is gone (shut down or cancelled).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("queue actor is closed")]
pub struct QueueClosed;

/// Error returned by [`QueueHandle::submit`](crate::QueueHandle::submit).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Admission refused the submission.
    #[error(transparent)]
    Rejected(#[from] RejectReason),

    /// Queue actor is no longer running.
    #[error("queue actor is closed")]
    Closed,
}

impl From<QueueClosed> for SubmitError {
    fn from(_: QueueClosed) -> Self {
        SubmitError::Closed
    }
}

/// Error returned by [`QueueHandle::status`](crate::QueueHandle::status).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    /// No job with this id exists (never issued, or evicted by retention).
    #[error("job not found: {0}")]
    NotFound(String),

    /// Queue actor is no longer running.
    #[error("queue actor is closed")]
    Closed,
}

impl From<QueueClosed> for StatusError {
    fn from(_: QueueClosed) -> Self {
        StatusError::Closed
    }
}

/// # Failure of one job execution.
///
/// Never crosses the scheduler: the message becomes the job's `error` field.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Handler reported a failure.
    #[error("{message}")]
    Fail {
        /// Failure message (may be empty).
        message: String,
    },

    /// Handler exceeded the configured deadline.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },
}

impl HandlerError {
    /// Message used when a handler fails without saying why.
    pub const UNKNOWN: &'static str = "Unknown error";

    /// Convenience constructor for [`HandlerError::Fail`].
    pub fn fail(message: impl Into<String>) -> Self {
        HandlerError::Fail {
            message: message.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::Timeout { .. } => "handler_timeout",
        }
    }

    /// Message recorded on the job; falls back to [`Self::UNKNOWN`].
    ///
    /// # Example
    /// ```
    /// use ratequeue::HandlerError;
    ///
    /// assert_eq!(HandlerError::fail("").job_message(), "Unknown error");
    /// assert_eq!(HandlerError::fail("upstream 502").job_message(), "upstream 502");
    /// ```
    pub fn job_message(&self) -> String {
        match self {
            HandlerError::Fail { message } if message.trim().is_empty() => Self::UNKNOWN.to_string(),
            other => other.to_string(),
        }
    }
}

/// Illegal change requested on a job record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The id is not in the store.
    #[error("unknown job {0}")]
    UnknownJob(JobId),

    /// Status may only move `pending → processing → {done, error}`.
    #[error("job {id}: illegal transition {from} -> {to}")]
    Illegal {
        /// Job id.
        id: JobId,
        /// Current status.
        from: JobStatus,
        /// Requested status.
        to: JobStatus,
    },
}

impl TransitionError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransitionError::UnknownJob(_) => "transition_unknown_job",
            TransitionError::Illegal { .. } => "transition_illegal",
        }
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
