//! Deterministic single-threaded executor with virtual time.
//!
//! Time only moves when the owner of the [`Simulation`] says so, which makes
//! every poll of a countdown observable and reproducible in tests:
//!
//! ```
//! use std::time::Duration;
//!
//! use blocktimer::{Simulation, Timer};
//!
//! let sim = Simulation::new();
//! let timer = Timer::new(3, sim.scheduler());
//! timer.start();
//! sim.advance(Duration::from_secs(2));
//! assert_eq!(timer.remaining(), 1);
//! sim.advance(Duration::from_secs(1));
//! assert!(timer.is_complete());
//! ```

use std::{cell::RefCell, future::Future, rc::Rc, time::Duration};

use futures::future::LocalBoxFuture;

use crate::{
    scheduler::{PollHandle, Scheduler},
    util::oneshot,
};

mod rt;
mod task;
mod timer;
mod waker;

////////////////////////////////////////////////////////////////////////////////

pub use rt::TaskId;
pub use task::{JoinError, JoinHandle, TaskHandle};

use rt::Runtime;
use timer::{Sleep, Timers};

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests;

////////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
pub struct Simulation {
    rt: Rc<Runtime>,
    timers: Rc<RefCell<Timers>>,
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduler(&self) -> Rc<SimScheduler> {
        Rc::new(SimScheduler {
            rt: Rc::downgrade(&self.rt),
            timers: Rc::downgrade(&self.timers),
        })
    }

    /// Virtual time elapsed since the simulation was created.
    pub fn now(&self) -> Duration {
        self.timers.borrow().now()
    }

    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let task_id = self.rt.spawn(Box::pin(async move {
            let result = task.await;
            let _ = sender.send(result); // receiver can be dropped which is ok
        }));
        JoinHandle::new(TaskHandle::new(task_id, Rc::downgrade(&self.rt)), receiver)
    }

    /// Runs woken tasks until none is left, without moving time.
    /// Returns the number of processed wake-ups.
    pub fn run_until_stalled(&self) -> usize {
        self.rt.process_tasks()
    }

    /// Jumps to the nearest deadline, fires every timer due at it and runs
    /// woken tasks. Returns `false` if no timer is pending.
    pub fn step(&self) -> bool {
        self.run_until_stalled();
        let Some(deadline) = self.timers.borrow().next_deadline() else {
            return false;
        };
        self.fire_until(deadline);
        self.run_until_stalled();
        true
    }

    /// Moves time forward by `duration`, firing timers in deadline order.
    pub fn advance(&self, duration: Duration) {
        let target = self.now() + duration;
        loop {
            self.run_until_stalled();
            let next = self.timers.borrow().next_deadline();
            match next {
                Some(deadline) if deadline <= target => self.fire_until(deadline),
                _ => break,
            }
        }
        self.fire_until(target);
        self.run_until_stalled();
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn alive_tasks(&self) -> usize {
        self.rt.alive_tasks()
    }

    fn fire_until(&self, time: Duration) {
        let due = self.timers.borrow_mut().advance_to(time);
        due.into_iter().for_each(|timer| {
            let _ = timer.send(()); // sleep can be dropped concurrently
        });
    }
}

////////////////////////////////////////////////////////////////////////////////

/// [`Scheduler`] bound to a [`Simulation`].
///
/// Holds weak references only; once the simulation is dropped, spawned
/// tasks are discarded and sleeps never complete.
#[derive(Clone)]
pub struct SimScheduler {
    rt: std::rc::Weak<Runtime>,
    timers: std::rc::Weak<RefCell<Timers>>,
}

impl Scheduler for SimScheduler {
    fn now(&self) -> Duration {
        self.timers
            .upgrade()
            .map(|timers| timers.borrow().now())
            .unwrap_or_default()
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) -> PollHandle {
        match self.rt.upgrade() {
            Some(rt) => {
                let task_id = rt.spawn(task);
                PollHandle::sim(TaskHandle::new(task_id, Rc::downgrade(&rt)))
            }
            None => PollHandle::sim(TaskHandle::detached()),
        }
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        match self.timers.upgrade() {
            Some(timers) => Box::pin(Sleep::new(&timers, duration)),
            None => Box::pin(futures::future::pending()),
        }
    }
}
