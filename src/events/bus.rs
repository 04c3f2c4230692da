//! # Event bus for broadcasting queue events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`]: the actor and the job runner
//! publish without blocking; the subscriber listener (and any caller of
//! [`QueueHandle::events`](crate::QueueHandle::events)) receives clones.
//!
//! ```text
//! QueueActor ──┐
//!              ├──► Bus ──► subscriber listener ──► SubscriberSet
//! run_once   ──┘        └─► QueueHandle::events() receivers
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails; with no receivers the event is dropped.
//! - One shared ring buffer; slow receivers get `RecvError::Lagged(n)`.
//! - No persistence.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for queue events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus with the given ring-buffer capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver for events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_only_see_later_events() {
        let bus = Bus::new(8);
        bus.publish(Event::new(EventKind::QueueIdle));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::QuotaReset));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::QuotaReset);
        assert!(rx.try_recv().is_err());
    }
}
