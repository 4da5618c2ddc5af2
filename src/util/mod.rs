//! Provides common crate utilities.

pub(crate) mod oneshot;
pub(crate) mod signal;
