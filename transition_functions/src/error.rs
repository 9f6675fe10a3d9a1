use thiserror::Error;
use types::primitives::{Slot, ValidatorIndex, H256};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("target slot {target} is not later than state slot {current}")]
    TargetSlotNotFuture { target: Slot, current: Slot },
    #[error("block slot {block} does not match state slot {state}")]
    SlotMismatch { block: Slot, state: Slot },
    #[error("block slot {block} is not newer than latest header slot {head}")]
    NotNewerThanHead { block: Slot, head: Slot },
    #[error("validator {actual} is not the proposer for slot {slot}, expected {expected}")]
    WrongProposer {
        slot: Slot,
        expected: ValidatorIndex,
        actual: ValidatorIndex,
    },
    #[error("block parent root {actual:?} does not match latest header root {expected:?}")]
    ParentMismatch { expected: H256, actual: H256 },
}
