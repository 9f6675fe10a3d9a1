//! The fork choice store for the lean consensus protocol.
//!
//! [`Store`] is a plain data structure with no lock of its own; the
//! `fork_choice_control` crate wraps it for concurrent use. All mutating
//! operations assume a single active writer.
//!
//! Votes move through two buckets. Gossiped attestations land in
//! `latest_new_votes` and are only promoted to `latest_known_votes` at the
//! accept phases of the slot clock or when a block pulls them in. The safe
//! target is computed from the pending bucket with a supermajority floor, so
//! it gets a stable window before head recomputation commits. The buckets
//! must not be collapsed into one.

pub use crate::{
    error::Error,
    lmd_ghost::{get_head, latest_justified_checkpoint},
    store::{ProcessBlockFn, ProcessSlotsFn, Store},
};

mod error;
mod lmd_ghost;
mod store;
