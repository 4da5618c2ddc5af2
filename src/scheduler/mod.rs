//! Scheduling capability consumed by countdowns.
//!
//! Countdowns never touch an executor directly: they spawn their poll loop
//! and sleep between polls through a [`Scheduler`]. [`TokioScheduler`] runs
//! on a tokio `LocalSet`, [`crate::SimScheduler`] runs in virtual time.

use std::{fmt::Debug, time::Duration};

use futures::future::LocalBoxFuture;

use crate::sim::TaskHandle;

mod realtime;

////////////////////////////////////////////////////////////////////////////////

pub use realtime::TokioScheduler;

////////////////////////////////////////////////////////////////////////////////

pub trait Scheduler {
    /// Time elapsed since the scheduler was created.
    fn now(&self) -> Duration;

    /// Spawns a task on the local, single-threaded executor.
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) -> PollHandle;

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

////////////////////////////////////////////////////////////////////////////////

enum Handle {
    Tokio(tokio::task::JoinHandle<()>),
    Sim(TaskHandle),
    Custom(Box<dyn FnOnce()>),
}

/// Owns a spawned poll loop.
///
/// Dropping the handle cancels the loop; [`PollHandle::detach`] releases
/// it without cancelling.
pub struct PollHandle(Option<Handle>);

impl PollHandle {
    pub fn tokio(handle: tokio::task::JoinHandle<()>) -> Self {
        Self(Some(Handle::Tokio(handle)))
    }

    pub fn sim(handle: TaskHandle) -> Self {
        Self(Some(Handle::Sim(handle)))
    }

    /// Handle for schedulers outside of this crate; `cancel` is invoked at most once.
    pub fn with_cancel(cancel: impl FnOnce() + 'static) -> Self {
        Self(Some(Handle::Custom(Box::new(cancel))))
    }

    pub fn cancel(mut self) {
        self.abort();
    }

    pub fn detach(mut self) {
        self.0.take();
    }

    fn abort(&mut self) {
        match self.0.take() {
            Some(Handle::Tokio(handle)) => handle.abort(),
            Some(Handle::Sim(handle)) => handle.abort(),
            Some(Handle::Custom(cancel)) => cancel(),
            None => {}
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

impl Debug for PollHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.0 {
            Some(Handle::Tokio(_)) => "tokio",
            Some(Handle::Sim(_)) => "sim",
            Some(Handle::Custom(_)) => "custom",
            None => "released",
        };
        f.debug_tuple("PollHandle").field(&kind).finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
