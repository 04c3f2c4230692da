//! # QueueHandle: the public, cloneable face of a running queue.
//!
//! Every call is one round-trip through the actor mailbox, so results reflect
//! a single consistent view of ledger, store and scheduler.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::{
    error::{QueueClosed, StatusError, SubmitError},
    events::{Bus, Event},
    ledger::UsageView,
    store::{JobId, JobView},
};

use super::actor::{Command, QueueStats};

/// Receipt for an admitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitted {
    /// Id to poll with [`QueueHandle::status`].
    pub job_id: JobId,
}

/// Cloneable handle to a queue actor.
///
/// The actor stops once every clone is dropped (or its token is cancelled).
#[derive(Clone)]
pub struct QueueHandle {
    name: Arc<str>,
    tx: mpsc::Sender<Command>,
    bus: Bus,
}

impl QueueHandle {
    pub(crate) fn new(name: Arc<str>, tx: mpsc::Sender<Command>, bus: Bus) -> Self {
        Self { name, tx, bus }
    }

    /// Submits a job for `caller`.
    ///
    /// Returns as soon as admission has decided; the job runs later.
    ///
    /// # Errors
    /// - [`SubmitError::Rejected`] with the admission reason (bad input, quota, cooldown)
    /// - [`SubmitError::Closed`] if the queue is no longer running
    pub async fn submit(
        &self,
        caller: impl Into<String>,
        query: impl Into<String>,
    ) -> Result<Submitted, SubmitError> {
        let (caller, query) = (caller.into(), query.into());
        self.request(|reply| Command::Submit {
            caller,
            query,
            reply,
        })
        .await?
        .map_err(SubmitError::from)
    }

    /// Reads the public view of a job.
    pub async fn status(&self, id: JobId) -> Result<JobView, StatusError> {
        self.request(|reply| Command::Status { id, reply })
            .await?
            .ok_or_else(|| StatusError::NotFound(id.to_string()))
    }

    /// Like [`status`](Self::status) with an unparsed id; malformed ids are not found.
    pub async fn status_by_str(&self, id: &str) -> Result<JobView, StatusError> {
        let parsed: JobId = id
            .parse()
            .map_err(|_| StatusError::NotFound(id.to_string()))?;
        self.status(parsed).await
    }

    /// Quota usage of `caller` in the current window.
    pub async fn usage(&self, caller: impl Into<String>) -> Result<UsageView, QueueClosed> {
        let caller = caller.into();
        self.request(|reply| Command::Usage { caller, reply }).await
    }

    /// Scheduler and store counters.
    pub async fn stats(&self) -> Result<QueueStats, QueueClosed> {
        self.request(|reply| Command::Stats { reply }).await
    }

    /// Subscribes to the queue's event stream.
    ///
    /// Only events published after this call are delivered.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, QueueClosed> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).await.map_err(|_| QueueClosed)?;
        rx.await.map_err(|_| QueueClosed)
    }
}
