use anyhow::Result;

use crate::domain::task::{Task, TaskId};

pub mod appwrite;
pub mod local;
pub mod memory;

/// Whether the store has finished its initial load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Loading,
    Ready,
    Failed,
}

/// Result of a mutating call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The change took effect and is durable.
    Done(Task),
    /// A round trip is in flight; completion arrives via `poll`.
    Pending,
    /// Empty text after trimming.
    Rejected,
    NotFound,
}

/// Completion of an asynchronous round trip, drained via `poll`.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Loaded(usize),
    LoadFailed(String),
    Added(Task),
    Toggled(Task),
    Deleted(TaskId),
    Failed(String),
}

pub trait TaskStore {
    fn readiness(&self) -> Readiness;

    /// All known tasks in insertion order.
    fn tasks(&self) -> Vec<Task>;

    fn add(&mut self, text: &str) -> Result<Outcome>;

    fn toggle(&mut self, id: &TaskId) -> Result<Outcome>;

    fn delete(&mut self, id: &TaskId) -> Result<Outcome>;

    /// Re-read the backing storage. No-op for backends whose snapshot
    /// cannot go stale.
    fn refresh(&mut self) -> Result<()> {
        Ok(())
    }

    /// Drain completions of in-flight round trips into the snapshot.
    /// Synchronous backends have nothing to report.
    fn poll(&mut self) -> Vec<StoreEvent> {
        Vec::new()
    }
}

impl<S: TaskStore + ?Sized> TaskStore for Box<S> {
    fn readiness(&self) -> Readiness {
        (**self).readiness()
    }

    fn tasks(&self) -> Vec<Task> {
        (**self).tasks()
    }

    fn add(&mut self, text: &str) -> Result<Outcome> {
        (**self).add(text)
    }

    fn toggle(&mut self, id: &TaskId) -> Result<Outcome> {
        (**self).toggle(id)
    }

    fn delete(&mut self, id: &TaskId) -> Result<Outcome> {
        (**self).delete(id)
    }

    fn refresh(&mut self) -> Result<()> {
        (**self).refresh()
    }

    fn poll(&mut self) -> Vec<StoreEvent> {
        (**self).poll()
    }
}
