use std::{
    cell::RefCell,
    collections::BTreeMap,
    future::Future,
    pin::Pin,
    rc::{Rc, Weak},
    task::{Context, Poll},
    time::Duration,
};

use crate::util::oneshot;

////////////////////////////////////////////////////////////////////////////////

/// Deadline first, registration order second.
type TimerKey = (Duration, usize);

////////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
pub(crate) struct Timers {
    now: Duration,
    next_id: usize,
    pending: BTreeMap<TimerKey, oneshot::Sender<()>>,
}

impl Timers {
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    fn register(&mut self, duration: Duration) -> (TimerKey, oneshot::Receiver<()>) {
        let key = (self.now + duration, self.next_id);
        self.next_id += 1;
        let (sender, receiver) = oneshot::channel();
        let prev = self.pending.insert(key, sender);
        assert!(prev.is_none());
        (key, receiver)
    }

    fn cancel(&mut self, key: TimerKey) -> Option<oneshot::Sender<()>> {
        self.pending.remove(&key)
    }

    /// Moves time forward and returns the timers that became due,
    /// in deadline order. Time never moves backwards.
    #[must_use]
    pub fn advance_to(&mut self, time: Duration) -> Vec<oneshot::Sender<()>> {
        self.now = self.now.max(time);
        let later = self.pending.split_off(&(self.now, usize::MAX));
        std::mem::replace(&mut self.pending, later)
            .into_values()
            .collect()
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Future resolved once the virtual time reaches its deadline.
pub(crate) struct Sleep {
    key: TimerKey,
    recv: oneshot::Receiver<()>,
    timers: Weak<RefCell<Timers>>,
    fired: bool,
}

impl Sleep {
    pub fn new(timers: &Rc<RefCell<Timers>>, duration: Duration) -> Self {
        let (key, recv) = timers.borrow_mut().register(duration);
        Self {
            key,
            recv,
            timers: Rc::downgrade(timers),
            fired: false,
        }
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.fired {
            return Poll::Ready(());
        }
        // a dropped sender means the simulation is gone, nothing will poll us again
        let poll = Pin::new(&mut self.recv).poll(cx).map(|_| ());
        if poll.is_ready() {
            self.fired = true;
        }
        poll
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if self.fired {
            return;
        }
        if let Some(timers) = self.timers.upgrade() {
            let sender = timers.borrow_mut().cancel(self.key);
            drop(sender);
        }
    }
}
