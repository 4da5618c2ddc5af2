use std::time::Duration;

use futures::future::LocalBoxFuture;
use tokio::time::Instant;

use super::{PollHandle, Scheduler};

////////////////////////////////////////////////////////////////////////////////

/// Real-time scheduler backed by tokio.
///
/// Tasks are spawned with [`tokio::task::spawn_local`], so countdowns must be
/// started from within a [`tokio::task::LocalSet`].
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    epoch: Instant,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) -> PollHandle {
        PollHandle::tokio(tokio::task::spawn_local(task))
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

////////////////////////////////////////////////////////////////////////////////
