//! # Drainer: the processing loop of the FIFO scheduler.
//!
//! Spawned by the actor when the first job lands in an idle queue; exits when
//! the actor reports the queue empty. All suspension happens here, so the
//! actor keeps serving submissions and status polls while a job runs or the
//! queue cools down.
//!
//! ```text
//! loop {
//!   ├─► Next ──► actor pops head, marks it processing   (None → actor goes Idle, exit)
//!   ├─► run_once(handler, query, deadline)
//!   ├─► Finish{id, outcome} ──► actor records done/error, publishes CooldownScheduled
//!   └─► sleep(job_cooldown)                              (cancellable)
//! }
//! ```
//!
//! ## Rules
//! - One job at a time; a failed job never stops the loop; no retries.
//! - The cooldown follows every job, including the last one, so two jobs are
//!   always at least `job_cooldown` apart even across idle periods.
//! - Cancellation is honoured at every await point.

use std::sync::Arc;
use std::time::Duration;

use tokio::{
    select,
    sync::{mpsc, oneshot},
    time,
};
use tokio_util::sync::CancellationToken;

use crate::{events::Bus, handlers::HandlerRef};

use super::actor::{DrainRequest, NextJob};
use super::runner::run_once;

/// Processing loop parameters.
pub(crate) struct Drainer {
    pub handler: HandlerRef,
    pub requests: mpsc::Sender<DrainRequest>,
    pub cooldown: Duration,
    pub timeout: Option<Duration>,
    pub queue: Arc<str>,
    pub bus: Bus,
}

impl Drainer {
    /// Runs until the queue is empty or `token` is cancelled.
    pub async fn run(self, token: CancellationToken) {
        loop {
            let (reply, next) = oneshot::channel();
            if self
                .requests
                .send(DrainRequest::Next { reply })
                .await
                .is_err()
            {
                break;
            }

            let next = select! {
                res = next => res,
                _ = token.cancelled() => break,
            };
            let Ok(Some(NextJob { id, query })) = next else {
                break;
            };

            let outcome = select! {
                res = run_once(self.handler.as_ref(), &query, self.timeout, id, &self.queue, &self.bus) => res,
                _ = token.cancelled() => break,
            };
            if self
                .requests
                .send(DrainRequest::Finish { id, outcome })
                .await
                .is_err()
            {
                break;
            }

            let sleep = time::sleep(self.cooldown);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = token.cancelled() => break,
            }
        }
        tracing::debug!(queue = %self.queue, "drainer stopped");
    }
}
