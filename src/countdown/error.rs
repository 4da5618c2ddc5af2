use thiserror::Error;

use crate::clock::ClockError;

////////////////////////////////////////////////////////////////////////////////

/// Reported to every waiter of a countdown that did not settle successfully.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CountdownError {
    #[error("clock read failed: {0}")]
    Clock(#[from] ClockError),
    #[error("countdown dropped before it settled")]
    Abandoned,
}

////////////////////////////////////////////////////////////////////////////////

pub type CountdownResult<T> = Result<T, CountdownError>;
