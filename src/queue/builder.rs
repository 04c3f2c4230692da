use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    clock::{Clock, SystemClock},
    config::QueueConfig,
    events::{Bus, Event},
    handlers::HandlerRef,
    subscribers::{Subscribe, SubscriberSet},
};

use super::{actor::QueueActor, handle::QueueHandle};

/// Builder for a running queue.
pub struct QueueBuilder {
    cfg: QueueConfig,
    handler: HandlerRef,
    subscribers: Vec<Arc<dyn Subscribe>>,
    clock: Arc<dyn Clock>,
}

impl QueueBuilder {
    /// Creates a builder that runs every job through `handler`.
    pub fn new(cfg: QueueConfig, handler: HandlerRef) -> Self {
        Self {
            cfg,
            handler,
            subscribers: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber gets its own worker and bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the wall clock used for quota windows and job timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Spawns the actor (and subscriber workers) and returns its handle.
    ///
    /// Cancelling `token` stops the queue; a job in flight is abandoned.
    /// Must be called inside a Tokio runtime.
    pub fn spawn(self, token: CancellationToken) -> QueueHandle {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let local = token.child_token();

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            tokio::spawn(forward(bus.subscribe(), set, local.clone()));
        }

        let (tx, rx) = mpsc::channel(self.cfg.mailbox_capacity_clamped());
        let name: Arc<str> = Arc::from(self.cfg.name.as_str());
        let (actor, drain_rx) =
            QueueActor::new(self.cfg, self.clock, self.handler, bus.clone(), local);
        tokio::spawn(actor.run(rx, drain_rx));

        QueueHandle::new(name, tx, bus)
    }
}

/// Pumps bus events into the subscriber set until the queue stops.
async fn forward(mut rx: broadcast::Receiver<Event>, set: SubscriberSet, token: CancellationToken) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            ev = rx.recv() => match ev {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    // Deliver whatever was already published before stopping.
    while let Ok(ev) = rx.try_recv() {
        set.emit(&ev);
    }
    set.shutdown().await;
}
