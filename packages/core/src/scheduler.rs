//! # Deferred re-render queue
//!
//! `set_state` / `update_props` never re-render inline. They push a task
//! here, and the host drains the queue later with `Renderer::flush`.
//! Each drained batch is one scheduler turn; tasks queued while a turn runs
//! land in the next one.
//!
//! Tasks are not coalesced and cannot be cancelled. The renderer may merge
//! same-component tasks of one turn when `coalesce_updates` is enabled.

use crate::tree::NodeId;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

/// Runs after the diff pass a task belongs to
pub type UpdateCallback = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskReason {
    State,
    Props,
}

/// One pending render + diff pass
pub struct Task {
    pub id: NodeId,
    pub reason: TaskReason,
    pub callback: Option<UpdateCallback>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("reason", &self.reason)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[derive(Default)]
pub struct Scheduler {
    queue: RefCell<VecDeque<Task>>,
    scheduled: Cell<u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&self, task: Task) {
        self.scheduled.set(self.scheduled.get() + 1);
        self.queue.borrow_mut().push_back(task);
    }

    /// Take every task queued so far (one turn)
    pub fn take_turn(&self) -> Vec<Task> {
        self.queue.borrow_mut().drain(..).collect()
    }

    /// Put unprocessed tasks back at the front, keeping their order
    pub fn requeue(&self, tasks: Vec<Task>) {
        let mut queue = self.queue.borrow_mut();
        for task in tasks.into_iter().rev() {
            queue.push_front(task);
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Total tasks ever scheduled
    pub fn total_scheduled(&self) -> u64 {
        self.scheduled.get()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("scheduled", &self.total_scheduled())
            .finish()
    }
}
