use ssz::SszHash as _;
use types::{
    collections::Validators,
    containers::{Block, BlockBody, BlockHeader, Config, Validator},
    primitives::{PublicKeyBytes, UnixSeconds, H256, PUBLIC_KEY_SIZE},
    state::State,
};

/// Builds the genesis state and its anchor block.
///
/// Every root in the genesis header is zero except `body_root`, which commits
/// to an empty body. Both checkpoints start at the zero root; the fork choice
/// treats that as the genesis anchor. The anchor block carries the genesis
/// state root so a fresh store can verify it against the state.
#[must_use]
pub fn generate(genesis_time: UnixSeconds, validator_count: u64) -> (State, Block) {
    let body = BlockBody::default();
    let body_root = body.hash_tree_root();

    let latest_block_header = BlockHeader {
        body_root,
        ..BlockHeader::default()
    };

    let validators = Validators::try_from_iter((0..validator_count).map(placeholder_validator))
        .expect("validator count is bounded by the registry limit");

    let state = State {
        config: Config { genesis_time },
        latest_block_header,
        validators,
        ..State::default()
    };

    let state_root = state.hash_tree_root();

    let block = Block {
        slot: 0,
        proposer_index: 0,
        parent_root: H256::zero(),
        state_root,
        body,
    };

    (state, block)
}

// Deterministic placeholder keys until XMSS keygen is wired in. The index in
// the leading bytes keeps the keys distinct.
fn placeholder_validator(index: u64) -> Validator {
    let mut pubkey = [0; PUBLIC_KEY_SIZE];
    pubkey[..8].copy_from_slice(&index.to_le_bytes());

    Validator {
        pubkey: PublicKeyBytes::from(pubkey),
        index,
    }
}

#[cfg(test)]
mod tests {
    use ssz::{SszHash as _, SszRead as _, SszWrite as _};

    use super::*;

    #[test]
    fn anchor_block_commits_to_the_genesis_state() {
        let (state, block) = generate(1_000_000_000, 8);

        assert_eq!(state.slot, 0);
        assert_eq!(state.validator_count(), 8);
        assert_eq!(block.slot, 0);
        assert_eq!(block.proposer_index, 0);
        assert!(block.parent_root.is_zero());
        assert_eq!(block.state_root, state.hash_tree_root());
    }

    #[test]
    fn genesis_checkpoints_and_lists_are_empty() {
        let (state, _) = generate(1_000_000_000, 8);

        assert!(state.latest_justified.root.is_zero());
        assert!(state.latest_finalized.root.is_zero());
        assert!(state.historical_block_hashes.is_empty());
        assert!(state.justified_slots.is_empty());
        assert!(state.justification_roots.is_empty());
        assert!(state.justification_validators.is_empty());
    }

    // The empty bit list is a single delimiter byte, not zero bytes. Confusing
    // the two changes the state root and breaks peer-to-peer compatibility,
    // so the genesis round trip is the canary.
    #[test]
    fn genesis_state_round_trips_through_ssz() {
        let (state, block) = generate(1_000_000_000, 8);

        let state_bytes = state.to_ssz().expect("offsets fit in u32");
        let decoded = State::from_ssz(state_bytes).expect("encoder output is valid");

        assert_eq!(decoded, state);
        assert_eq!(decoded.hash_tree_root(), state.hash_tree_root());

        let block_bytes = block.to_ssz().expect("offsets fit in u32");
        let decoded = Block::from_ssz(block_bytes).expect("encoder output is valid");

        assert_eq!(decoded, block);
    }

    #[test]
    fn validator_pubkeys_are_distinct() {
        let (state, _) = generate(1_000_000_000, 8);

        for window in state.validators.windows(2) {
            assert_ne!(window[0].pubkey, window[1].pubkey);
        }
    }
}
