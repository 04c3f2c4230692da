//! # Job handler abstraction.
//!
//! A [`JobHandler`] performs the costly external work behind a job: it gets
//! the submitted query and returns an opaque JSON result or a failure. It has
//! no access to quota state or the queue.
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use serde_json::{json, Value};
//! use ratequeue::{HandlerError, JobHandler};
//!
//! struct Upper;
//!
//! #[async_trait]
//! impl JobHandler for Upper {
//!     fn name(&self) -> &str { "upper" }
//!
//!     async fn execute(&self, query: &str) -> Result<Value, HandlerError> {
//!         if query.is_empty() {
//!             return Err(HandlerError::fail("nothing to do"));
//!         }
//!         Ok(json!({ "text": query.to_uppercase() }))
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::HandlerError;

/// Executes one job.
///
/// May take arbitrarily long; the queue wraps the call in its configured
/// deadline and marks the job `error` on expiry.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    /// Stable, human-readable handler name.
    fn name(&self) -> &str;

    /// Runs the job for `query`.
    async fn execute(&self, query: &str) -> Result<Value, HandlerError>;
}

/// Shared handle to a handler.
pub type HandlerRef = Arc<dyn JobHandler>;
