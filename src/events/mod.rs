//! Queue events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`]: classification and metadata
//! - [`Bus`]: thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `QueueActor` (admission, start, finish, idle, reset,
//!   eviction, cooldown), `runner::run_once` (timeout),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the subscriber listener spawned by
//!   [`QueueBuilder::spawn`](crate::QueueBuilder::spawn), and receivers from
//!   [`QueueHandle::events`](crate::QueueHandle::events).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
