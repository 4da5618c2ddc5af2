mod clock;
mod config;
mod countdown;
mod scheduler;
mod sim;
mod util;

pub mod log;

////////////////////////////////////////////////////////////////////////////////

pub use countdown::{
    BlockTimer, ChainTicks, Completion, Countdown, CountdownError, CountdownResult,
    CountdownState, Observation, TickSource, Timer, WallTicks,
};

pub use clock::{ClockError, ClockResult, ClockSource};

#[cfg(feature = "jsonrpc")]
pub use clock::JsonRpcClock;

pub use config::{
    CountdownConfig, CountdownConfigBuilder, DEFAULT_LOG_CAPACITY, DEFAULT_POLL_INTERVAL,
    MIN_POLL_INTERVAL,
};

pub use log::{Log, LogEntry};

pub use scheduler::{PollHandle, Scheduler, TokioScheduler};

pub use sim::{JoinError, JoinHandle, SimScheduler, Simulation, TaskHandle, TaskId};
