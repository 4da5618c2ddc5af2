use std::{collections::VecDeque, fmt::Display, time::Duration};

use colored::Colorize;

use crate::countdown::CountdownError;

////////////////////////////////////////////////////////////////////////////////

struct Time(Duration);

impl Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.3}]", self.0.as_secs_f64())
    }
}

struct Reading(Option<u64>);

impl Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(timestamp) => write!(f, "@{timestamp}"),
            None => write!(f, "tick"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    pub time: Duration,
    pub remaining: u64,
}

impl Display for Started {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:>10}  remaining={}",
            Time(self.time),
            "started",
            self.remaining
        )
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primed {
    pub time: Duration,
    pub timestamp: Option<u64>,
}

impl Display for Primed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:>10}  {}",
            Time(self.time),
            "primed",
            Reading(self.timestamp)
        )
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticked {
    pub time: Duration,
    pub timestamp: Option<u64>,
    pub elapsed: u64,
    pub remaining: u64,
}

impl Display for Ticked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:>10}  {} -{} remaining={}",
            Time(self.time),
            "ticked",
            Reading(self.timestamp),
            self.elapsed,
            self.remaining
        )
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Consecutive polls without progress, folded into one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stalled {
    /// Time of the first stalled poll.
    pub time: Duration,
    /// Reading of the latest stalled poll.
    pub timestamp: Option<u64>,
    pub remaining: u64,
    pub polls: u64,
}

impl Display for Stalled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut line = format!(
            "{} {:>10}  {} remaining={}",
            Time(self.time),
            "stalled",
            Reading(self.timestamp),
            self.remaining
        );
        if self.polls > 1 {
            line.push_str(&format!(" x{}", self.polls));
        }
        write!(f, "{}", line.yellow())
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub time: Duration,
}

impl Display for Completed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            format!("{} {:>10}  ✓", Time(self.time), "completed").green()
        )
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stopped {
    pub time: Duration,
    pub remaining: u64,
}

impl Display for Stopped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            format!(
                "{} {:>10}  remaining={}",
                Time(self.time),
                "stopped",
                self.remaining
            )
            .purple()
        )
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failed {
    pub time: Duration,
    pub error: CountdownError,
}

impl Display for Failed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            format!(
                "{} {:>10}  {} <--- failed",
                Time(self.time),
                "failed",
                self.error
            )
            .red()
        )
    }
}

////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Started(Started),
    Primed(Primed),
    Ticked(Ticked),
    Stalled(Stalled),
    Completed(Completed),
    Stopped(Stopped),
    Failed(Failed),
}

impl LogEntry {
    pub fn time(&self) -> Duration {
        match self {
            LogEntry::Started(e) => e.time,
            LogEntry::Primed(e) => e.time,
            LogEntry::Ticked(e) => e.time,
            LogEntry::Stalled(e) => e.time,
            LogEntry::Completed(e) => e.time,
            LogEntry::Stopped(e) => e.time,
            LogEntry::Failed(e) => e.time,
        }
    }
}

impl Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogEntry::Started(e) => write!(f, "{}", e),
            LogEntry::Primed(e) => write!(f, "{}", e),
            LogEntry::Ticked(e) => write!(f, "{}", e),
            LogEntry::Stalled(e) => write!(f, "{}", e),
            LogEntry::Completed(e) => write!(f, "{}", e),
            LogEntry::Stopped(e) => write!(f, "{}", e),
            LogEntry::Failed(e) => write!(f, "{}", e),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Countdown trace.
///
/// Consecutive stalls are folded into one [`Stalled`] entry. With a
/// capacity set, the oldest entries are dropped once it is reached.
#[derive(Debug, Clone, Default)]
pub struct Log {
    data: VecDeque<LogEntry>,
    capacity: Option<usize>,
    dropped: usize,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::default()
        }
    }

    pub fn add_entry(&mut self, log_entry: LogEntry) {
        if let (Some(LogEntry::Stalled(last)), LogEntry::Stalled(next)) =
            (self.data.back_mut(), &log_entry)
        {
            last.timestamp = next.timestamp;
            last.remaining = next.remaining;
            last.polls += next.polls;
            return;
        }
        if self.capacity.is_some_and(|capacity| self.data.len() >= capacity) {
            self.data.pop_front();
            self.dropped += 1;
        }
        self.data.push_back(log_entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.data.back()
    }

    /// Number of entries evicted by the capacity limit.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl Display for Log {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.dropped > 0 {
            writeln!(f, "... {} earlier entries dropped", self.dropped)?;
        }
        for e in self.data.iter() {
            writeln!(f, "{}", e)?;
        }
        write!(f, "=======================")
    }
}

////////////////////////////////////////////////////////////////////////////////
