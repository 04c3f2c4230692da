use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::TransitionError;

/// Opaque, unique job identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle state of a job.
///
/// Moves only `Pending → Processing → {Done, Error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Admitted, waiting in the queue.
    Pending,
    /// Handler is running.
    Processing,
    /// Handler returned a result.
    Done,
    /// Handler failed or timed out.
    Error,
}

impl JobStatus {
    /// True for `Done` and `Error`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }

    /// Wire name (`"pending"`, `"processing"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested status change.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// `Pending → Processing`.
    Start,
    /// `Processing → Done` with the handler's result.
    Complete(Value),
    /// `Processing → Error` with a failure message.
    Fail(String),
}

impl Transition {
    /// Status this transition leads to.
    pub fn target(&self) -> JobStatus {
        match self {
            Transition::Start => JobStatus::Processing,
            Transition::Complete(_) => JobStatus::Done,
            Transition::Fail(_) => JobStatus::Error,
        }
    }
}

/// One submitted job and everything known about it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Unique id handed back to the caller.
    pub id: JobId,
    /// Owning caller.
    pub caller: String,
    /// Submitted query, passed verbatim to the handler.
    pub query: String,
    /// Current status.
    pub status: JobStatus,
    /// Handler result, set only when `Done`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure message, set only when `Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Admission time.
    pub created_at: DateTime<Local>,
    /// When the handler was invoked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Local>>,
    /// When the job reached a terminal status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Local>>,
}

impl JobRecord {
    /// Creates a pending record with a fresh id.
    pub fn new(caller: impl Into<String>, query: impl Into<String>, now: DateTime<Local>) -> Self {
        Self {
            id: JobId::new(),
            caller: caller.into(),
            query: query.into(),
            status: JobStatus::Pending,
            result: None,
            error: None,
            created_at: now,
            started_at: None,
            finished_at: None,
        }
    }

    /// Applies `t` if it is legal from the current status.
    ///
    /// On error the record is left unchanged.
    pub fn apply(&mut self, t: Transition, now: DateTime<Local>) -> Result<(), TransitionError> {
        let legal = matches!(
            (self.status, &t),
            (JobStatus::Pending, Transition::Start)
                | (JobStatus::Processing, Transition::Complete(_) | Transition::Fail(_))
        );
        if !legal {
            return Err(TransitionError::Illegal {
                id: self.id,
                from: self.status,
                to: t.target(),
            });
        }

        self.status = t.target();
        match t {
            Transition::Start => self.started_at = Some(now),
            Transition::Complete(result) => {
                self.result = Some(result);
                self.finished_at = Some(now);
            }
            Transition::Fail(message) => {
                self.error = Some(message);
                self.finished_at = Some(now);
            }
        }
        Ok(())
    }

    /// Boundary view of this record.
    pub fn view(&self) -> JobView {
        JobView::from(self)
    }
}

/// What a poller sees: status plus result or error once terminal.
///
/// Pending/processing views carry neither field; `done` carries only
/// `result`, `error` only `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    /// Current status.
    pub status: JobStatus,
    /// Handler result (`done` only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure message (`error` only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&JobRecord> for JobView {
    fn from(r: &JobRecord) -> Self {
        Self {
            status: r.status,
            result: r.result.clone(),
            error: r.error.clone(),
        }
    }
}
