#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

use blocktimer::{ClockError, ClockResult, ClockSource};

////////////////////////////////////////////////////////////////////////////////

pub enum Reading {
    At(u64),
    Fail(ClockError),
    Hang,
}

/// Replays readings in order, then keeps repeating the last timestamp.
pub struct ScriptedClock {
    script: RefCell<VecDeque<Reading>>,
    last: Cell<u64>,
    reads: Cell<usize>,
}

impl ScriptedClock {
    pub fn new(script: impl IntoIterator<Item = Reading>) -> Rc<Self> {
        Rc::new(Self {
            script: RefCell::new(script.into_iter().collect()),
            last: Cell::new(0),
            reads: Cell::new(0),
        })
    }

    pub fn at(timestamps: impl IntoIterator<Item = u64>) -> Rc<Self> {
        Self::new(timestamps.into_iter().map(Reading::At))
    }

    /// `t0`, then `steps` readings each `step` seconds after the previous.
    pub fn stepping(t0: u64, step: u64, steps: u64) -> Rc<Self> {
        Self::at((0..=steps).map(|i| t0 + i * step))
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl ClockSource for ScriptedClock {
    async fn timestamp(&self) -> ClockResult<u64> {
        self.reads.set(self.reads.get() + 1);
        let next = self.script.borrow_mut().pop_front();
        match next {
            Some(Reading::At(timestamp)) => {
                self.last.set(timestamp);
                Ok(timestamp)
            }
            Some(Reading::Fail(error)) => Err(error),
            Some(Reading::Hang) => futures::future::pending().await,
            None => Ok(self.last.get()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Clock moved by hand.
pub struct ManualClock(Cell<u64>);

impl ManualClock {
    pub fn new(timestamp: u64) -> Rc<Self> {
        Rc::new(Self(Cell::new(timestamp)))
    }

    pub fn set(&self, timestamp: u64) {
        self.0.set(timestamp);
    }

    pub fn advance(&self, seconds: u64) {
        self.0.set(self.0.get() + seconds);
    }
}

impl ClockSource for ManualClock {
    async fn timestamp(&self) -> ClockResult<u64> {
        Ok(self.0.get())
    }
}

////////////////////////////////////////////////////////////////////////////////

pub fn transport(info: &str) -> ClockError {
    ClockError::Transport {
        info: info.to_owned(),
    }
}
