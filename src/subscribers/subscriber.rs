//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for reacting to queue events
//! (logging, metrics, audit trails).
//!
//! Each subscriber gets a dedicated worker task and a bounded queue inside
//! [`SubscriberSet`](crate::SubscriberSet); panics are caught and reported as
//! `EventKind::SubscriberPanicked`.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use async_trait::async_trait;
//! use ratequeue::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct RejectCounter(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for RejectCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::JobRejected {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "reject-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for queue observability.
///
/// ### Implementation requirements
/// - Avoid blocking the executor; use async I/O.
/// - Handle errors internally.
/// - A slow subscriber only fills its own queue.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes one event. Called from the subscriber's worker, in FIFO order.
    async fn on_event(&self, event: &Event);

    /// Name used in logs and overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity (clamped to at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
