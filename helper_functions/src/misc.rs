use types::primitives::{Slot, ValidatorIndex};

/// Proposer assignment is round-robin over the registry.
#[must_use]
pub const fn proposer_index(slot: Slot, validator_count: u64) -> ValidatorIndex {
    slot % validator_count
}
