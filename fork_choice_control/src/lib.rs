//! The lock-guarded surface of the fork choice store.
//!
//! A networking shell drives [`Controller`] with decoded blocks and
//! attestations and with wall-clock ticks; validators drive it through the
//! production methods. The store itself is single-writer: every mutating call
//! takes the write lock for its full duration and never suspends while
//! holding it. Read-only queries share the read lock.

pub use crate::controller::{Controller, Error};

mod controller;

#[cfg(test)]
mod extra_tests;
