//! # QueueActor: the single serialization point of a queue.
//!
//! Owns the quota ledger, the job store and the scheduler. Every read and
//! write of that state happens inside one message handler at a time, and no
//! handler awaits, so admission's check-then-commit can never interleave with
//! another submission.
//!
//! ## Mailboxes
//! ```text
//! QueueHandle ── Command ──────►┐
//!                               ├─► QueueActor::run() ── select! ──► handle_command / handle_drain
//! Drainer ───── DrainRequest ──►┘
//! ```
//!
//! - `Command` comes from the public handle. When every handle is dropped the
//!   mailbox closes and the actor stops.
//! - `DrainRequest` comes from the drainer. The actor keeps a sender itself so
//!   this channel never closes while it runs.
//!
//! ## Exit
//! The actor stops when its token is cancelled or the command mailbox closes;
//! on exit it cancels its token so the drainer and the subscriber listener
//! stop too.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::{
    clock::Clock,
    config::QueueConfig,
    error::{HandlerError, RejectReason},
    events::{Bus, Event, EventKind},
    handlers::HandlerRef,
    ledger::{QuotaLedger, UsageView},
    store::{JobId, JobStore, JobView, Transition},
};

use super::{
    admission::AdmissionState,
    drainer::Drainer,
    handle::Submitted,
    scheduler::{Scheduler, SchedulerState},
};

/// Messages from [`QueueHandle`](crate::QueueHandle).
pub(crate) enum Command {
    Submit {
        caller: String,
        query: String,
        reply: oneshot::Sender<Result<Submitted, RejectReason>>,
    },
    Status {
        id: JobId,
        reply: oneshot::Sender<Option<JobView>>,
    },
    Usage {
        caller: String,
        reply: oneshot::Sender<UsageView>,
    },
    Stats {
        reply: oneshot::Sender<QueueStats>,
    },
}

/// Messages from the drainer.
pub(crate) enum DrainRequest {
    /// Pop the next job and mark it processing; `None` means the queue is empty.
    Next {
        reply: oneshot::Sender<Option<NextJob>>,
    },
    /// Record the outcome of a processed job.
    Finish {
        id: JobId,
        outcome: Result<Value, HandlerError>,
    },
}

/// Job handed to the drainer.
pub(crate) struct NextJob {
    pub id: JobId,
    pub query: String,
}

/// Point-in-time view of a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    /// Queue name.
    pub name: String,
    /// Whether a drainer is running.
    pub state: SchedulerState,
    /// Jobs waiting to start.
    pub depth: usize,
    /// Job records held (all statuses).
    pub jobs: usize,
    /// Callers with a usage record.
    pub callers: usize,
    /// Admissions in the current window, as stored.
    pub global_count: u32,
    /// Global daily limit.
    pub global_limit: u32,
}

pub(crate) struct QueueActor {
    name: Arc<str>,
    cfg: QueueConfig,
    clock: Arc<dyn Clock>,
    handler: HandlerRef,
    bus: Bus,
    token: CancellationToken,

    ledger: QuotaLedger,
    store: JobStore,
    scheduler: Scheduler,

    drain_tx: mpsc::Sender<DrainRequest>,
}

impl QueueActor {
    /// Creates the actor and the receiving end of its drainer channel.
    pub fn new(
        cfg: QueueConfig,
        clock: Arc<dyn Clock>,
        handler: HandlerRef,
        bus: Bus,
        token: CancellationToken,
    ) -> (Self, mpsc::Receiver<DrainRequest>) {
        let (drain_tx, drain_rx) = mpsc::channel(8);
        let now = clock.now();
        let actor = Self {
            name: Arc::from(cfg.name.as_str()),
            ledger: QuotaLedger::new(cfg.quota_policy(), now),
            store: JobStore::new(cfg.retention),
            scheduler: Scheduler::new(),
            cfg,
            clock,
            handler,
            bus,
            token,
            drain_tx,
        };
        (actor, drain_rx)
    }

    /// Serves both mailboxes until cancellation or until every handle is dropped.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut drain: mpsc::Receiver<DrainRequest>,
    ) {
        tracing::debug!(queue = %self.name, "queue actor started");
        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,

                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                Some(req) = drain.recv() => self.handle_drain(req),
            }
        }
        self.token.cancel();
        tracing::debug!(queue = %self.name, jobs = self.store.len(), "queue actor stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Submit {
                caller,
                query,
                reply,
            } => {
                let res = self.submit(&caller, &query);
                let _ = reply.send(res);
            }
            Command::Status { id, reply } => {
                let _ = reply.send(self.store.get(&id).map(JobView::from));
            }
            Command::Usage { caller, reply } => {
                let _ = reply.send(self.ledger.usage_view(&caller, self.clock.now()));
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    fn handle_drain(&mut self, req: DrainRequest) {
        match req {
            DrainRequest::Next { reply } => self.next_job(reply),
            DrainRequest::Finish { id, outcome } => self.finish_job(id, outcome),
        }
    }

    /// Admission, then drainer start if the scheduler was idle.
    fn submit(&mut self, caller: &str, query: &str) -> Result<Submitted, RejectReason> {
        let now = self.clock.now();
        let outcome = AdmissionState {
            ledger: &mut self.ledger,
            store: &mut self.store,
            scheduler: &mut self.scheduler,
        }
        .admit(caller, query, now);

        if outcome.reset {
            self.publish(Event::new(EventKind::QuotaReset));
        }

        match outcome.result {
            Ok(admitted) => {
                let job_id = admitted.record.id;
                self.publish(
                    Event::new(EventKind::JobAdmitted)
                        .with_job(job_id)
                        .with_caller(caller)
                        .with_count(self.scheduler.depth()),
                );
                if admitted.start_drainer {
                    self.spawn_drainer();
                }
                self.evict_expired();
                Ok(Submitted { job_id })
            }
            Err(reason) => {
                self.publish(
                    Event::new(EventKind::JobRejected)
                        .with_caller(caller)
                        .with_reason(format!("{}: {reason}", reason.as_label())),
                );
                Err(reason)
            }
        }
    }

    fn spawn_drainer(&self) {
        let drainer = Drainer {
            handler: Arc::clone(&self.handler),
            requests: self.drain_tx.clone(),
            cooldown: self.cfg.job_cooldown,
            timeout: self.cfg.handler_deadline(),
            queue: Arc::clone(&self.name),
            bus: self.bus.clone(),
        };
        tokio::spawn(drainer.run(self.token.clone()));
    }

    /// Pops queued ids until one can be started; an empty queue goes idle.
    fn next_job(&mut self, reply: oneshot::Sender<Option<NextJob>>) {
        let now = self.clock.now();
        loop {
            let Some(id) = self.scheduler.pop() else {
                self.publish(Event::new(EventKind::QueueIdle));
                let _ = reply.send(None);
                return;
            };

            let (caller, query) = match self.store.transition(id, Transition::Start, now) {
                Ok(record) => (record.caller.clone(), record.query.clone()),
                Err(err) => {
                    tracing::warn!(
                        queue = %self.name,
                        job = %id,
                        kind = err.as_label(),
                        error = %err,
                        "skipping queued job"
                    );
                    continue;
                }
            };

            self.publish(
                Event::new(EventKind::JobStarted)
                    .with_job(id)
                    .with_caller(caller),
            );
            if reply.send(Some(NextJob { id, query })).is_err() {
                // Drainer is gone; the job cannot run any more.
                self.finish_job(id, Err(HandlerError::fail("queue stopped before job ran")));
            }
            return;
        }
    }

    fn finish_job(&mut self, id: JobId, outcome: Result<Value, HandlerError>) {
        let now = self.clock.now();
        let (transition, failure) = match outcome {
            Ok(result) => (Transition::Complete(result), None),
            Err(err) => {
                let message = err.job_message();
                (Transition::Fail(message.clone()), Some(message))
            }
        };

        let caller = match self.store.transition(id, transition, now) {
            Ok(record) => record.caller.clone(),
            Err(err) => {
                tracing::warn!(
                    queue = %self.name,
                    job = %id,
                    kind = err.as_label(),
                    error = %err,
                    "dropping job outcome"
                );
                return;
            }
        };

        let ev = match failure {
            None => Event::new(EventKind::JobCompleted),
            Some(message) => Event::new(EventKind::JobFailed).with_reason(message),
        };
        self.publish(ev.with_job(id).with_caller(caller));
        self.publish(
            Event::new(EventKind::CooldownScheduled)
                .with_job(id)
                .with_delay(self.cfg.job_cooldown),
        );
        self.evict_expired();
    }

    fn evict_expired(&mut self) {
        let evicted = self.store.evict_expired(self.clock.now());
        if evicted > 0 {
            self.publish(Event::new(EventKind::JobsEvicted).with_count(evicted));
        }
    }

    fn stats(&self) -> QueueStats {
        let global = self.ledger.global_usage();
        QueueStats {
            name: self.name.to_string(),
            state: self.scheduler.state(),
            depth: self.scheduler.depth(),
            jobs: self.store.len(),
            callers: self.ledger.caller_count(),
            global_count: global.count,
            global_limit: self.ledger.policy().global_daily_limit,
        }
    }

    fn publish(&self, ev: Event) {
        self.bus.publish(ev.with_queue(Arc::clone(&self.name)));
    }
}
