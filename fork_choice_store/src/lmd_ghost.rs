//! LMD-GHOST head selection.

use std::collections::HashMap;

use types::{
    containers::{Block, Checkpoint},
    primitives::H256,
    state::State,
};

/// Walks the block tree down from `root`, at each fork choosing the child
/// whose subtree carries the most votes.
///
/// Every non-zero vote adds weight to each block strictly below its target on
/// the path toward `root`. Only children whose weight reaches `min_score`
/// participate in the descent; a `min_score` of 0 admits everything. Ties are
/// broken by higher slot, then by lexicographically greater block root, so the
/// result depends only on the contents of the store.
#[must_use]
pub fn get_head(
    blocks: &HashMap<H256, Block>,
    root: H256,
    latest_votes: &[Checkpoint],
    min_score: usize,
) -> H256 {
    // A zero root stands for the genesis anchor. Start from the earliest block.
    let root = if root.is_zero() {
        match blocks
            .iter()
            .min_by_key(|(hash, block)| (block.slot, **hash))
        {
            Some((hash, _)) => *hash,
            None => return root,
        }
    } else {
        root
    };

    let Some(root_block) = blocks.get(&root) else {
        return root;
    };
    let root_slot = root_block.slot;

    let mut weights = HashMap::<H256, usize>::new();

    for vote in latest_votes {
        if vote.root.is_zero() {
            continue;
        }

        let mut cursor = vote.root;

        while let Some(block) = blocks.get(&cursor) {
            if block.slot <= root_slot {
                break;
            }

            *weights.entry(cursor).or_default() += 1;
            cursor = block.parent_root;
        }
    }

    let mut children = HashMap::<H256, Vec<H256>>::new();

    for (hash, block) in blocks {
        if block.parent_root.is_zero() {
            continue;
        }

        if weights.get(hash).copied().unwrap_or_default() >= min_score {
            children.entry(block.parent_root).or_default().push(*hash);
        }
    }

    let mut current = root;

    loop {
        let Some(candidates) = children.get(&current) else {
            return current;
        };

        current = candidates
            .iter()
            .copied()
            .max_by_key(|child| {
                let weight = weights.get(child).copied().unwrap_or_default();
                (weight, blocks[child].slot, *child)
            })
            .expect("children lists contain at least the block that created them");
    }
}

/// The justified checkpoint with the highest slot across all stored states.
#[must_use]
pub fn latest_justified_checkpoint(states: &HashMap<H256, State>) -> Option<Checkpoint> {
    states
        .values()
        .map(|state| state.latest_justified)
        .max_by_key(|checkpoint| (checkpoint.slot, checkpoint.root))
}
