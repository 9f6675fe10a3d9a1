use serde::{Deserialize, Serialize};

use crate::{
    collections::{
        HistoricalRoots, JustificationRoots, JustificationValidators, JustifiedSlots, Validators,
    },
    containers::{BlockHeader, Checkpoint, Config},
    primitives::Slot,
};

/// The consensus state.
///
/// Created once at genesis and then only ever produced by the pure transition
/// functions; every transition clones and returns a fresh value. The list- and
/// bitlist-backed fields own their storage, so `Clone` is the deep copy the
/// transition discipline requires.
#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct State {
    pub config: Config,
    pub slot: Slot,
    pub latest_block_header: BlockHeader,

    pub latest_justified: Checkpoint,
    pub latest_finalized: Checkpoint,

    // Indexed by slot. The entry for a slot is appended when a descendant
    // block is processed: the slot of the latest header gets its header root,
    // skipped slots get the zero root and an unjustified bit.
    pub historical_block_hashes: HistoricalRoots,
    pub justified_slots: JustifiedSlots,

    // Immutable after genesis.
    pub validators: Validators,

    // Roots currently under justification voting, sorted by byte order.
    // Rows of `justification_validators` correspond to `justification_roots`
    // one to one: bit `row * len(validators) + validator` records a vote.
    pub justification_roots: JustificationRoots,
    pub justification_validators: JustificationValidators,
}

impl State {
    /// Number of validators in the registry.
    ///
    /// The registry never changes after genesis, so this doubles as the
    /// denominator of every supermajority check.
    #[must_use]
    pub fn validator_count(&self) -> u64 {
        self.validators.len() as u64
    }
}
