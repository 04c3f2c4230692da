//! # ratequeue
//!
//! **ratequeue** is a single-instance, rate-limited job queue for costly
//! background work.
//!
//! It accepts submissions under layered quotas (global daily budget,
//! per-caller daily budget, per-caller cooldown), runs accepted jobs one at a
//! time with an enforced pause between them, and exposes each job's status to
//! pollers. All state is in memory and owned by one actor task, which makes
//! admission atomic under concurrent submissions.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!    QueueHandle (clone)   QueueHandle (clone)   axum router (feature "http")
//!           │                     │                       │
//!           └─────────── Command (mpsc mailbox) ──────────┘
//!                                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  QueueActor (single owner of all state)                           │
//! │  - QuotaLedger (global + per-caller usage, lazy midnight reset)   │
//! │  - JobStore    (JobId → JobRecord, bounded retention)             │
//! │  - Scheduler   (FIFO of JobIds, Idle ⇄ Draining)                  │
//! └──────┬─────────────────────────────▲─────────────────────┬────────┘
//!        │ spawn on Idle → Draining    │ Next / Finish       │ publish
//!        ▼                             │                     ▼
//!   ┌──────────┐   run_once(handler)   │           ┌───────────────────┐
//!   │ Drainer  │ ──────────────────────┘           │ Bus (broadcast)   │
//!   │ (1 task) │ ─ cooldown sleep ─► Next …        └─────────┬─────────┘
//!   └──────────┘                                             ▼
//!                                                  ┌───────────────────┐
//!                                                  │   SubscriberSet   │
//!                                                  └──┬─────────────┬──┘
//!                                                     ▼             ▼
//!                                                 LogWriter    custom subs
//! ```
//!
//! ### Job lifecycle
//! ```text
//! submit ──► admission ──► pending ──► processing ──► done  { result }
//!               │                          │
//!               └─► RejectReason           └────────► error { error }
//!                   (no record, no counter change)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Queue**         | Spawn a queue, submit jobs, poll status and usage.           | [`QueueBuilder`], [`QueueHandle`]           |
//! | **Handlers**      | The work behind a job, as a trait object or a closure.       | [`JobHandler`], [`HandlerFn`]               |
//! | **Quotas**        | Daily budgets and cooldowns, reset at local midnight.        | [`QuotaLedger`], [`QuotaPolicy`]            |
//! | **Jobs**          | Records, status transitions, retention.                      | [`JobStore`], [`JobRecord`], [`JobStatus`]  |
//! | **Events**        | Lifecycle events and subscribers.                            | [`Event`], [`Subscribe`], [`LogWriter`]     |
//! | **Errors**        | Typed rejections and failures.                               | [`RejectReason`], [`SubmitError`]           |
//! | **Configuration** | Policy constants and timings.                                | [`QueueConfig`], [`RetentionPolicy`]        |
//!
//! ## Optional features
//! - `http` (default): axum router over a [`QueueHandle`] and the
//!   `ratequeue` server binary.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//! use ratequeue::{HandlerError, HandlerFn, JobStatus, QueueBuilder, QueueConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = QueueConfig::default();
//!     cfg.job_cooldown = Duration::ZERO;
//!
//!     let handler = HandlerFn::arc("upper", |query: String| async move {
//!         Ok::<_, HandlerError>(json!({ "answer": query.to_uppercase() }))
//!     });
//!
//!     let token = CancellationToken::new();
//!     let queue = QueueBuilder::new(cfg, handler).spawn(token.clone());
//!
//!     let job = queue.submit("u1", "ocean sunset").await?;
//!     loop {
//!         let view = queue.status(job.job_id).await?;
//!         if view.status == JobStatus::Done {
//!             assert_eq!(view.result, Some(json!({ "answer": "OCEAN SUNSET" })));
//!             break;
//!         }
//!         tokio::time::sleep(Duration::from_millis(10)).await;
//!     }
//!
//!     token.cancel();
//!     Ok(())
//! }
//! ```
mod clock;
mod config;
mod error;
mod events;
mod handlers;
mod ledger;
mod queue;
mod shutdown;
mod store;
mod subscribers;

// ---- Public re-exports ----

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{QueueConfig, QuotaPolicy, RetentionPolicy};
pub use error::{HandlerError, QueueClosed, RejectReason, StatusError, SubmitError, TransitionError};
pub use events::{Bus, Event, EventKind};
pub use handlers::{EchoHandler, HandlerFn, HandlerRef, JobHandler};
pub use ledger::{CallerUsage, GlobalUsage, QuotaLedger, UsageView, next_local_midnight};
pub use queue::{QueueBuilder, QueueHandle, QueueStats, SchedulerState, Submitted};
pub use shutdown::wait_for_shutdown_signal;
pub use store::{JobId, JobRecord, JobStatus, JobStore, JobView, Transition};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};

// Optional: HTTP edge over a queue handle.
// Enabled by default; disable with `--no-default-features`.
#[cfg(feature = "http")]
pub mod http;
