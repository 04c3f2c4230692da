//! # Event subscribers.
//!
//! ```text
//! QueueActor ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                          ├──► LogWriter
//!                                                          └──► custom Subscribe impls
//! ```
//!
//! [`LogWriter`] is always available; add your own [`Subscribe`]
//! implementations through [`QueueBuilder::with_subscribers`](crate::QueueBuilder::with_subscribers).

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
