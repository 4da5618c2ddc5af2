use std::{
    future::Future,
    pin::Pin,
    rc::Weak,
    task::{Context, Poll},
};

use thiserror::Error;

use crate::util::oneshot;

use super::rt::{Runtime, TaskId};

////////////////////////////////////////////////////////////////////////////////

/// Appears when task has been aborted before producing its output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("task aborted before completion")]
pub struct JoinError {}

////////////////////////////////////////////////////////////////////////////////

/// Handle to a task spawned in a [`super::Simulation`].
#[derive(Clone, Debug)]
pub struct TaskHandle {
    task_id: TaskId,
    rt: Weak<Runtime>,
}

impl TaskHandle {
    pub(crate) fn new(task_id: TaskId, rt: Weak<Runtime>) -> Self {
        Self { task_id, rt }
    }

    /// Handle of a task that was never scheduled.
    pub(crate) fn detached() -> Self {
        Self {
            task_id: TaskId::MAX,
            rt: Weak::new(),
        }
    }

    pub fn id(&self) -> TaskId {
        self.task_id
    }

    pub fn abort(&self) {
        if let Some(rt) = self.rt.upgrade() {
            rt.abort(self.task_id);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

pub struct JoinHandle<T> {
    task: TaskHandle,
    result: oneshot::Receiver<T>,
}

impl<T> JoinHandle<T> {
    pub(crate) fn new(task: TaskHandle, result: oneshot::Receiver<T>) -> Self {
        Self { task, result }
    }

    pub fn id(&self) -> TaskId {
        self.task.id()
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.result).poll(cx).map_err(|_| JoinError {})
    }
}
