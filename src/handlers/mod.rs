//! # Job handlers.
//!
//! - [`JobHandler`]: trait for the external work behind a job
//! - [`HandlerRef`]: shared handle (`Arc<dyn JobHandler>`)
//! - [`HandlerFn`]: closure-backed implementation
//! - [`EchoHandler`]: simulated generator for demos and the server binary

mod echo;
mod handler;
mod handler_fn;

pub use echo::EchoHandler;
pub use handler::{HandlerRef, JobHandler};
pub use handler_fn::HandlerFn;
