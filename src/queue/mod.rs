//! # Queue runtime: admission, FIFO scheduling and job execution.
//!
//! ```text
//!  QueueHandle::submit ──► QueueActor ──► AdmissionState::admit
//!                              │             ├─ reset window if expired
//!                              │             ├─ check global, check caller, check input
//!                              │             └─ commit + create record + enqueue
//!                              │
//!                              ├─ enqueue on Idle ──► spawn Drainer
//!                              │
//!  Drainer ── Next/Finish ────►┘  run_once(handler) ─► cooldown ─► Next …
//! ```
//!
//! - [`QueueBuilder`] wires bus, subscribers and the actor.
//! - [`QueueHandle`] is the cloneable API; every call is one actor round-trip.

mod actor;
mod admission;
mod builder;
mod drainer;
mod handle;
mod runner;
mod scheduler;

pub use actor::QueueStats;
pub use builder::QueueBuilder;
pub use handle::{QueueHandle, Submitted};
pub use scheduler::SchedulerState;
