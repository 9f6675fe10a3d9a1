use thiserror::Error;
use types::primitives::{Slot, H256};

#[derive(Debug, Error)]
pub enum Error {
    #[error("anchor block state root {block:?} does not match the anchor state root {state:?}")]
    AnchorStateRootMismatch { block: H256, state: H256 },
    #[error("parent {parent_root:?} of block {block_root:?} is not in the store")]
    ParentNotFound { block_root: H256, parent_root: H256 },
    #[error(
        "block {block_root:?} claims state root {in_block:?} \
         but the transition produced {computed:?}"
    )]
    StateRootMismatch {
        block_root: H256,
        in_block: H256,
        computed: H256,
    },
    #[error("validator {validator_id} is out of range for a registry of {validator_count}")]
    ValidatorOutOfRange {
        validator_id: u64,
        validator_count: usize,
    },
    #[error("source root {root:?} is not in the store")]
    SourceNotFound { root: H256 },
    #[error("target root {root:?} is not in the store")]
    TargetNotFound { root: H256 },
    #[error("head root {root:?} is not in the store")]
    HeadNotFound { root: H256 },
    #[error("checkpoint slot {actual} disagrees with block slot {expected}")]
    SlotMismatch { expected: Slot, actual: Slot },
    #[error("attestation slot {slot} is ahead of the current slot {current}")]
    FutureVote { slot: Slot, current: Slot },
    #[error("state transition rejected the block")]
    Transition(#[source] anyhow::Error),
}
