use helper_functions::{misc, predicates};
use ssz::SszHash as _;
use types::{
    containers::{Attestation, Block, BlockHeader},
    primitives::H256,
    state::State,
};

use crate::{error::Error, justifications};

/// Full block processing: header validation followed by the body attestations.
pub fn process_block(state: &State, block: &Block) -> Result<State, Error> {
    let post = process_block_header(state, block)?;
    Ok(process_attestations(&post, &block.body.attestations))
}

pub fn process_block_header(state: &State, block: &Block) -> Result<State, Error> {
    if block.slot != state.slot {
        return Err(Error::SlotMismatch {
            block: block.slot,
            state: state.slot,
        });
    }

    if block.slot <= state.latest_block_header.slot {
        return Err(Error::NotNewerThanHead {
            block: block.slot,
            head: state.latest_block_header.slot,
        });
    }

    let expected_proposer = misc::proposer_index(block.slot, state.validator_count());

    if block.proposer_index != expected_proposer {
        return Err(Error::WrongProposer {
            slot: block.slot,
            expected: expected_proposer,
            actual: block.proposer_index,
        });
    }

    let expected_parent = state.latest_block_header.hash_tree_root();

    if block.parent_root != expected_parent {
        return Err(Error::ParentMismatch {
            expected: expected_parent,
            actual: block.parent_root,
        });
    }

    let mut post = state.clone();

    // The first block after genesis anchors both checkpoints to the genesis
    // header. Their slots stay 0.
    if state.latest_block_header.slot == 0 {
        post.latest_justified.root = block.parent_root;
        post.latest_finalized.root = block.parent_root;
    }

    let parent_slot = state.latest_block_header.slot;

    post.historical_block_hashes
        .push(block.parent_root)
        .expect("history is bounded by the historical roots limit");

    // Genesis is the only slot justified by fiat.
    post.justified_slots
        .set_or_grow(parent_slot as usize, parent_slot == 0);

    for empty_slot in parent_slot + 1..block.slot {
        post.historical_block_hashes
            .push(H256::zero())
            .expect("history is bounded by the historical roots limit");
        post.justified_slots.set_or_grow(empty_slot as usize, false);
    }

    // The new header's state root stays zero until the next slot advance.
    post.latest_block_header = BlockHeader {
        slot: block.slot,
        proposer_index: block.proposer_index,
        parent_root: block.parent_root,
        state_root: H256::zero(),
        body_root: block.body.hash_tree_root(),
    };

    Ok(post)
}

/// The justification and finalization engine.
///
/// Attestations that fail validation are skipped silently: a peer may include
/// stale votes in a block and that must not invalidate the block. Targets that
/// gather a 2/3 supermajority become the new justified checkpoint, and the
/// source finalizes when no justifiable slot sits strictly between source and
/// target.
pub fn process_attestations(state: &State, attestations: &[Attestation]) -> State {
    let mut post = state.clone();
    let validator_count = post.validator_count() as usize;

    let mut pending = justifications::expand(&post);

    for attestation in attestations {
        let data = attestation.data;
        let source_slot = data.source.slot as usize;
        let target_slot = data.target.slot as usize;

        if attestation.validator_id >= post.validator_count() {
            continue;
        }

        // The source must be justified and the target must not be. A target
        // that is already justified has had its tracking row cleared; the
        // remaining votes for it must not reintroduce the row.
        if !post.justified_slots.get_bit(source_slot) {
            continue;
        }

        if post.justified_slots.get_bit(target_slot) {
            continue;
        }

        if post.historical_block_hashes.get(source_slot) != Some(&data.source.root) {
            continue;
        }

        if post.historical_block_hashes.get(target_slot) != Some(&data.target.root) {
            continue;
        }

        if data.target.slot <= data.source.slot {
            continue;
        }

        if !predicates::is_justifiable_after(data.target.slot, post.latest_finalized.slot) {
            continue;
        }

        let votes = pending
            .entry(data.target.root)
            .or_insert_with(|| vec![false; validator_count]);

        votes[attestation.validator_id as usize] = true;

        let count = votes.iter().filter(|voted| **voted).count();

        if 3 * count >= 2 * validator_count {
            post.latest_justified = data.target;
            post.justified_slots.set_or_grow(target_slot, true);
            pending.remove(&data.target.root);

            // If no slot in the gap could have been a valid target, the source
            // is the last honest ancestor and is safe to finalize.
            let can_finalize = (data.source.slot + 1..data.target.slot)
                .all(|slot| !predicates::is_justifiable_after(slot, post.latest_finalized.slot));

            if can_finalize {
                post.latest_finalized = data.source;
            }
        }
    }

    justifications::flatten(&mut post, &pending);

    post
}
