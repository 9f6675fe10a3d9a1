pub use crate::{
    block_processing::{process_attestations, process_block, process_block_header},
    error::Error,
    slot_processing::process_slots,
};

mod block_processing;
mod error;
mod justifications;
mod slot_processing;
