//! # FIFO scheduler state.
//!
//! Holds the queue of admitted job ids and the `Idle ⇄ Draining` state. The
//! drainer task does the actual waiting; this struct only answers "is a
//! drainer needed?" on enqueue and "what is next?" on pop.
//!
//! ```text
//!            enqueue (was Idle) → spawn drainer
//!   ┌──────┐ ───────────────────────────────► ┌──────────┐
//!   │ Idle │                                  │ Draining │ ◄─┐ enqueue: job waits
//!   └──────┘ ◄─────────────────────────────── └──────────┘ ──┘ pop: next id
//!            pop on empty queue → drainer exits
//! ```
//!
//! ## Invariants
//! - At most one drainer exists: `enqueue` requests one only from `Idle`.
//! - Ids come out in the order they went in.

use std::collections::VecDeque;

use serde::Serialize;

use crate::store::JobId;

/// Whether a drainer is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    /// No drainer; the next enqueue starts one.
    Idle,
    /// A drainer is working through the queue (or cooling down).
    Draining,
}

/// FIFO queue plus drainer state.
#[derive(Debug)]
pub(crate) struct Scheduler {
    state: SchedulerState,
    queue: VecDeque<JobId>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            queue: VecDeque::new(),
        }
    }

    /// Appends `id`; returns `true` if the caller must start a drainer.
    pub fn enqueue(&mut self, id: JobId) -> bool {
        self.queue.push_back(id);
        match self.state {
            SchedulerState::Idle => {
                self.state = SchedulerState::Draining;
                true
            }
            SchedulerState::Draining => false,
        }
    }

    /// Pops the head; an empty queue switches back to `Idle`.
    pub fn pop(&mut self) -> Option<JobId> {
        let next = self.queue.pop_front();
        if next.is_none() {
            self.state = SchedulerState::Idle;
        }
        next
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Number of jobs waiting (excluding the one being processed).
    pub fn depth(&self) -> usize {
        self.queue.len()
    }
}
