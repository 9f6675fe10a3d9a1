//! Block and attestation-data production.
//!
//! Producers run against the fork choice store: they advance its clock to the
//! production slot, promote pending votes, and read the resulting head.

use std::collections::HashSet;

use log::debug;
use ssz::SszHash as _;
use thiserror::Error;

use fork_choice_store::Store;
use helper_functions::misc;
use types::{
    collections::Attestations,
    containers::{Attestation, AttestationData, Block, BlockBody, Checkpoint},
    primitives::{Slot, ValidatorIndex, H256},
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("validator {actual} is not the proposer for slot {slot}, expected {expected}")]
    NotProposer {
        slot: Slot,
        expected: ValidatorIndex,
        actual: ValidatorIndex,
    },
    #[error("head state {head:?} is missing from the store")]
    HeadStateNotFound { head: H256 },
    #[error("state transition failed while building a block")]
    Transition(#[source] anyhow::Error),
}

/// Builds a block for `slot` on the current head, collecting attestations to
/// a fixed point.
///
/// Processing a batch of attestations may justify a new checkpoint, which
/// becomes the valid source for further attestations in the same block; those
/// would have been rejected against the previous source. Without the loop,
/// blocks silently under-count votes. Convergence is bounded by the number of
/// justifiable target slots in play and typically takes one or two rounds.
pub fn produce_block(
    store: &mut Store,
    slot: Slot,
    validator_index: ValidatorIndex,
) -> Result<Block, Error> {
    let expected = misc::proposer_index(slot, store.validator_count());

    if validator_index != expected {
        return Err(Error::NotProposer {
            slot,
            expected,
            actual: validator_index,
        });
    }

    store.advance_to_slot(slot);

    let head_root = store.head();

    let mut attestations: Vec<Attestation> = vec![];

    loop {
        let head_state = store
            .state(head_root)
            .ok_or(Error::HeadStateNotFound { head: head_root })?;

        let advanced = store
            .run_process_slots(head_state, slot)
            .map_err(Error::Transition)?;

        let mut block = Block {
            slot,
            proposer_index: validator_index,
            parent_root: head_root,
            state_root: H256::zero(),
            body: BlockBody {
                attestations: Attestations::try_from(attestations.clone())
                    .expect("one attestation per validator fits in the registry limit"),
            },
        };

        let post_state = store
            .run_process_block(&advanced, &block)
            .map_err(Error::Transition)?;

        let new_attestations = collect_new_attestations(
            store.known_votes(),
            |root| store.has_block(root),
            post_state.latest_justified,
            &attestations,
        );

        if new_attestations.is_empty() {
            block.state_root = post_state.hash_tree_root();

            debug!(
                "produced block for slot {slot} with {} attestations",
                attestations.len(),
            );

            store.insert_produced_block(block.clone(), post_state);

            return Ok(block);
        }

        attestations.extend(new_attestations);
    }
}

/// Assembles the data a validator should attest to at `slot`.
pub fn produce_attestation_data(store: &mut Store, slot: Slot) -> AttestationData {
    store.advance_to_slot(slot);

    let head_root = store.head();

    let head_slot = store
        .block(head_root)
        .expect("the head block is always stored")
        .slot;

    AttestationData {
        slot,
        head: Checkpoint {
            root: head_root,
            slot: head_slot,
        },
        target: store.vote_target(),
        source: store.latest_justified(),
    }
}

/// Turns known votes into attestations not yet represented in `existing`.
///
/// Votes whose target block is missing from the store are left out; the block
/// they would produce could never validate.
fn collect_new_attestations(
    known_votes: &[Checkpoint],
    block_exists: impl Fn(H256) -> bool,
    latest_justified: Checkpoint,
    existing: &[Attestation],
) -> Vec<Attestation> {
    let seen: HashSet<u64> = existing
        .iter()
        .map(|attestation| attestation.validator_id)
        .collect();

    known_votes
        .iter()
        .enumerate()
        .filter(|(_, checkpoint)| !checkpoint.root.is_zero() && block_exists(checkpoint.root))
        .filter(|(validator_id, _)| !seen.contains(&(*validator_id as u64)))
        .map(|(validator_id, checkpoint)| Attestation {
            validator_id: validator_id as u64,
            data: AttestationData {
                slot: checkpoint.slot,
                head: *checkpoint,
                target: *checkpoint,
                source: latest_justified,
            },
        })
        .collect()
}
