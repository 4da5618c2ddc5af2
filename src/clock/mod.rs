//! External clock sources.
//!
//! A clock source is an untrusted, independently advancing time authority,
//! typically the timestamp of the latest block of a chain. It is only ever
//! read, so a single source can back any number of countdowns.

use std::{future::Future, rc::Rc};

mod error;

#[cfg(feature = "jsonrpc")]
mod jsonrpc;

////////////////////////////////////////////////////////////////////////////////

pub use error::{ClockError, ClockResult};

#[cfg(feature = "jsonrpc")]
pub use jsonrpc::JsonRpcClock;

////////////////////////////////////////////////////////////////////////////////

/// Capability of reading the current external timestamp.
pub trait ClockSource: 'static {
    /// Current timestamp, in seconds.
    fn timestamp(&self) -> impl Future<Output = ClockResult<u64>>;
}

impl<C: ClockSource> ClockSource for Rc<C> {
    fn timestamp(&self) -> impl Future<Output = ClockResult<u64>> {
        (**self).timestamp()
    }
}
