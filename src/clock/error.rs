use std::time::Duration;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClockError {
    #[error("transport: {info}")]
    Transport { info: String },
    #[error("malformed clock reading: {info}")]
    Malformed { info: String },
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("clock read timed out after {after:?}")]
    Timeout { after: Duration },
    #[error("clock unavailable: {info}")]
    Unavailable { info: String },
}

impl From<serde_json::Error> for ClockError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed {
            info: value.to_string(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

pub type ClockResult<T> = Result<T, ClockError>;
