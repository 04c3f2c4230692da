//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(String) -> Fut`, producing a fresh
//! future per job. Shared state goes behind an explicit `Arc` captured by the
//! closure.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use ratequeue::{HandlerError, HandlerFn, HandlerRef, JobHandler};
//!
//! let h: HandlerRef = HandlerFn::arc("echo", |query: String| async move {
//!     Ok::<_, HandlerError>(json!({ "answer": query }))
//! });
//! assert_eq!(h.name(), "echo");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::HandlerError;
use crate::handlers::handler::JobHandler;

/// Function-backed handler implementation.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`](crate::HandlerRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> JobHandler for HandlerFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, query: &str) -> Result<Value, HandlerError> {
        (self.f)(query.to_owned()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn closure_receives_query() {
        let h = HandlerFn::new("len", |q: String| async move {
            Ok::<_, HandlerError>(json!(q.len()))
        });
        assert_eq!(h.execute("abcd").await, Ok(json!(4)));
    }

    #[tokio::test]
    async fn closure_failure_passes_through() {
        let h = HandlerFn::new("nope", |_q: String| async move {
            Err::<Value, _>(HandlerError::fail("quota upstream"))
        });
        assert_eq!(
            h.execute("x").await,
            Err(HandlerError::fail("quota upstream"))
        );
    }
}
