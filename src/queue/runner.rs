//! # Run one job through the handler.
//!
//! - Applies the handler deadline if configured (`tokio::time::timeout`)
//! - Converts a panicking handler into a failure instead of killing the drainer
//! - Publishes `JobTimedOut` when the deadline fires
//!
//! ```text
//! Success:  handler.execute() → Ok(value)
//! Failure:  handler.execute() → Err(Fail)
//! Panic:    handler.execute() ✗ → Err(Fail "handler panicked: …")
//! Timeout:  deadline elapsed  → publish JobTimedOut → Err(Timeout)
//! ```
//!
//! The terminal `JobCompleted`/`JobFailed` events are published by the actor
//! when it records the outcome, not here.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value;
use tokio::time;

use crate::{
    error::{HandlerError, panic_message},
    events::{Bus, Event, EventKind},
    handlers::JobHandler,
    store::JobId,
};

/// Executes `query` on `handler` once, bounded by `timeout` when set.
pub(crate) async fn run_once<H: JobHandler + ?Sized>(
    handler: &H,
    query: &str,
    timeout: Option<Duration>,
    job: JobId,
    queue: &Arc<str>,
    bus: &Bus,
) -> Result<Value, HandlerError> {
    let call = std::panic::AssertUnwindSafe(handler.execute(query))
        .catch_unwind()
        .map(|res| {
            res.unwrap_or_else(|panic| {
                let info = panic_message(panic.as_ref());
                Err(HandlerError::fail(format!("handler panicked: {info}")))
            })
        });

    let Some(dur) = timeout.filter(|d| *d > Duration::ZERO) else {
        return call.await;
    };

    match time::timeout(dur, call).await {
        Ok(res) => res,
        Err(_elapsed) => {
            bus.publish(
                Event::new(EventKind::JobTimedOut)
                    .with_queue(Arc::clone(queue))
                    .with_job(job)
                    .with_timeout(dur),
            );
            Err(HandlerError::Timeout { timeout: dur })
        }
    }
}
