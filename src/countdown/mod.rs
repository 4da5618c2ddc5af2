//! Countdown synchronizers.
//!
//! A [`Countdown`] holds a remaining duration and a completion signal. Once
//! started it polls its [`TickSource`] at a fixed local interval and
//! subtracts whatever the source reports as elapsed. The signal settles
//! exactly once: when the remaining duration reaches zero, when the
//! countdown is stopped, or when the source fails.
//!
//! Two strategies are provided:
//!
//! - [`Timer`] counts local polls, one unit each.
//! - [`BlockTimer`] counts the forward delta of an external clock, typically
//!   the timestamp of the latest block. It stays correct when blocks stall
//!   (no decrement) or jump (one large decrement, clamped at zero).
//!
//! A failed clock read is terminal: the signal is rejected, polling stops
//! and the countdown never resolves successfully afterwards.

use std::{
    cell::{Cell, RefCell},
    fmt::Debug,
    future::Future,
    ops::ControlFlow,
    pin::{pin, Pin},
    rc::Rc,
    task::{Context, Poll},
    time::Duration,
};

use futures::future::{self, Either};

use crate::{
    clock::{ClockError, ClockResult, ClockSource},
    config::CountdownConfig,
    log::{Completed, Failed, Log, LogEntry, Primed, Started, Stalled, Stopped, Ticked},
    scheduler::{PollHandle, Scheduler},
    util::signal,
};

mod error;
mod ticks;

////////////////////////////////////////////////////////////////////////////////

pub use error::{CountdownError, CountdownResult};
pub use ticks::{ChainTicks, Observation, TickSource, WallTicks};

/// Countdown driven by local polls.
pub type Timer = Countdown<WallTicks>;

/// Countdown driven by the timestamp of an external clock.
pub type BlockTimer<C> = Countdown<ChainTicks<C>>;

////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountdownState {
    /// Constructed, not started yet.
    Dormant,
    Running,
    /// Remaining duration reached zero.
    Completed,
    /// Stopped before reaching zero.
    Stopped,
    /// Clock read failed.
    Failed,
}

impl CountdownState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CountdownState::Completed | CountdownState::Stopped | CountdownState::Failed
        )
    }
}

////////////////////////////////////////////////////////////////////////////////

struct Shared {
    remaining: u64,
    state: CountdownState,
    poll: Option<PollHandle>,
    signal: signal::Sender<CountdownResult<()>>,
    scheduler: Rc<dyn Scheduler>,
    log: Log,
    verbose: bool,
}

impl Shared {
    fn record(&mut self, entry: LogEntry) {
        if self.verbose {
            println!("{}", entry);
        }
        self.log.add_entry(entry);
    }

    fn now(&self) -> Duration {
        self.scheduler.now()
    }

    fn primed(&mut self, timestamp: Option<u64>) -> ControlFlow<()> {
        if self.state != CountdownState::Running {
            return ControlFlow::Break(());
        }
        let time = self.now();
        self.record(LogEntry::Primed(Primed { time, timestamp }));
        ControlFlow::Continue(())
    }

    fn observe(&mut self, observation: Observation) -> ControlFlow<()> {
        if self.state != CountdownState::Running {
            return ControlFlow::Break(());
        }
        let time = self.now();
        if self.remaining > 0 {
            // clamp, a jump past the deadline completes without going negative
            let elapsed = observation.elapsed.min(self.remaining);
            self.remaining -= elapsed;
            let entry = if elapsed == 0 {
                LogEntry::Stalled(Stalled {
                    time,
                    timestamp: observation.timestamp,
                    remaining: self.remaining,
                    polls: 1,
                })
            } else {
                LogEntry::Ticked(Ticked {
                    time,
                    timestamp: observation.timestamp,
                    elapsed: observation.elapsed,
                    remaining: self.remaining,
                })
            };
            self.record(entry);
        }
        if self.remaining > 0 {
            return ControlFlow::Continue(());
        }
        self.record(LogEntry::Completed(Completed { time }));
        self.state = CountdownState::Completed;
        self.signal.settle(Ok(()));
        ControlFlow::Break(())
    }

    fn fail(&mut self, error: ClockError) -> ControlFlow<()> {
        if self.state != CountdownState::Running {
            return ControlFlow::Break(());
        }
        let error = CountdownError::from(error);
        let time = self.now();
        self.record(LogEntry::Failed(Failed {
            time,
            error: error.clone(),
        }));
        self.state = CountdownState::Failed;
        self.signal.settle(Err(error));
        ControlFlow::Break(())
    }

    fn stop(&mut self) -> Option<PollHandle> {
        if self.state.is_terminal() {
            return None;
        }
        let time = self.now();
        let remaining = self.remaining;
        self.record(LogEntry::Stopped(Stopped { time, remaining }));
        self.state = CountdownState::Stopped;
        self.signal.settle(Ok(()));
        self.poll.take()
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Future returned by [`Countdown::wait`].
///
/// Every clone observes the same outcome. Dropping the countdown while it
/// is still pending settles waiters with [`CountdownError::Abandoned`].
#[derive(Clone)]
pub struct Completion(signal::Receiver<CountdownResult<()>>);

impl Future for Completion {
    type Output = CountdownResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0)
            .poll(cx)
            .map(|r| r.unwrap_or(Err(CountdownError::Abandoned)))
    }
}

////////////////////////////////////////////////////////////////////////////////

pub struct Countdown<T> {
    shared: Rc<RefCell<Shared>>,
    receiver: signal::Receiver<CountdownResult<()>>,
    ticks: Cell<Option<T>>,
    config: CountdownConfig,
}

impl Countdown<WallTicks> {
    /// Non-positive counts are clamped to zero.
    pub fn new(count: i64, scheduler: Rc<dyn Scheduler>) -> Self {
        Self::with_config(count, scheduler, CountdownConfig::default())
    }

    pub fn with_config(count: i64, scheduler: Rc<dyn Scheduler>, config: CountdownConfig) -> Self {
        Self::with_ticks(WallTicks, count, scheduler, config)
    }
}

impl<C: ClockSource> Countdown<ChainTicks<C>> {
    /// Non-positive durations are clamped to zero. The clock is not read
    /// until [`Countdown::start`].
    pub fn new(clock: C, duration: i64, scheduler: Rc<dyn Scheduler>) -> Self {
        Self::with_config(clock, duration, scheduler, CountdownConfig::default())
    }

    pub fn with_config(
        clock: C,
        duration: i64,
        scheduler: Rc<dyn Scheduler>,
        config: CountdownConfig,
    ) -> Self {
        Self::with_ticks(ChainTicks::new(clock), duration, scheduler, config)
    }
}

impl<T: TickSource> Countdown<T> {
    pub fn with_ticks(
        ticks: T,
        duration: i64,
        scheduler: Rc<dyn Scheduler>,
        config: CountdownConfig,
    ) -> Self {
        let config = config.normalized();
        let log = match config.log_capacity {
            Some(capacity) => Log::with_capacity(capacity),
            None => Log::new(),
        };
        let (sender, receiver) = signal::channel();
        let shared = Shared {
            remaining: u64::try_from(duration).unwrap_or(0),
            state: CountdownState::Dormant,
            poll: None,
            signal: sender,
            scheduler,
            log,
            verbose: config.verbose,
        };
        Self {
            shared: Rc::new(RefCell::new(shared)),
            receiver,
            ticks: Cell::new(Some(ticks)),
            config,
        }
    }

    /// Spawns the poll loop. Does nothing unless the countdown is dormant.
    pub fn start(&self) {
        let scheduler = {
            let mut shared = self.shared.borrow_mut();
            if shared.state != CountdownState::Dormant {
                return;
            }
            shared.state = CountdownState::Running;
            let time = shared.now();
            let remaining = shared.remaining;
            shared.record(LogEntry::Started(Started { time, remaining }));
            shared.scheduler.clone()
        };
        let Some(ticks) = self.ticks.take() else {
            return;
        };
        let task = poll_loop(self.shared.clone(), ticks, self.config.clone());
        let handle = scheduler.spawn(Box::pin(task));
        let mut shared = self.shared.borrow_mut();
        if shared.state == CountdownState::Running {
            shared.poll = Some(handle);
        } else {
            // settled while being spawned
            handle.detach();
        }
    }

    /// Cancels polling and resolves the signal, whatever the remaining
    /// duration. Safe to call at any time; has no effect once settled.
    pub fn stop(&self) {
        let handle = self.shared.borrow_mut().stop();
        if let Some(handle) = handle {
            handle.cancel();
        }
    }

    pub fn wait(&self) -> Completion {
        Completion(self.receiver.clone())
    }

    /// Settled outcome, `None` while pending.
    pub fn outcome(&self) -> Option<CountdownResult<()>> {
        self.receiver
            .peek()
            .map(|r| r.unwrap_or(Err(CountdownError::Abandoned)))
    }

    /// True iff the remaining duration is zero. A countdown stopped early
    /// is not complete; see [`Countdown::state`].
    pub fn is_complete(&self) -> bool {
        self.shared.borrow().remaining == 0
    }

    pub fn remaining(&self) -> u64 {
        self.shared.borrow().remaining
    }

    pub fn state(&self) -> CountdownState {
        self.shared.borrow().state
    }

    pub fn is_polling(&self) -> bool {
        self.shared.borrow().poll.is_some()
    }

    /// Snapshot of the trace, at most `log_capacity` entries long.
    pub fn log(&self) -> Log {
        self.shared.borrow().log.clone()
    }

    pub fn config(&self) -> &CountdownConfig {
        &self.config
    }
}

impl<T> Drop for Countdown<T> {
    fn drop(&mut self) {
        let handle = {
            let mut shared = self.shared.borrow_mut();
            shared.signal.abandon();
            shared.poll.take()
        };
        if let Some(handle) = handle {
            handle.cancel();
        }
    }
}

impl<T> Debug for Countdown<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.shared.borrow();
        f.debug_struct("Countdown")
            .field("state", &shared.state)
            .field("remaining", &shared.remaining)
            .field("poll", &shared.poll)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////

async fn poll_loop<T: TickSource>(shared: Rc<RefCell<Shared>>, mut ticks: T, config: CountdownConfig) {
    let scheduler = shared.borrow().scheduler.clone();

    let primed = read(&*scheduler, config.read_timeout, ticks.prime()).await;
    let mut flow = match primed {
        Ok(timestamp) => shared.borrow_mut().primed(timestamp),
        Err(error) => shared.borrow_mut().fail(error),
    };

    // reads are awaited before the next sleep, so at most one is in flight
    while flow.is_continue() {
        scheduler.sleep(config.poll_interval).await;
        let observed = read(&*scheduler, config.read_timeout, ticks.observe()).await;
        flow = match observed {
            Ok(observation) => shared.borrow_mut().observe(observation),
            Err(error) => shared.borrow_mut().fail(error),
        };
    }

    // the loop is finishing on its own, release without aborting
    let handle = shared.borrow_mut().poll.take();
    if let Some(handle) = handle {
        handle.detach();
    }
}

async fn read<R>(
    scheduler: &dyn Scheduler,
    timeout: Option<Duration>,
    read: impl Future<Output = ClockResult<R>>,
) -> ClockResult<R> {
    let Some(after) = timeout else {
        return read.await;
    };
    let read = pin!(read);
    match future::select(read, scheduler.sleep(after)).await {
        Either::Left((result, _)) => result,
        Either::Right(_) => Err(ClockError::Timeout { after }),
    }
}
