use ssz::SszHash as _;
use types::{primitives::Slot, state::State};

use crate::error::Error;

/// Advances the state through empty slots up to `target_slot`.
///
/// Before each increment, a zero `state_root` in the latest block header is
/// replaced with the root of the current state. This caches the pre-increment
/// state root into the pending header so that a future block can reference its
/// parent's post-state without a forward dependency.
pub fn process_slots(state: &State, target_slot: Slot) -> Result<State, Error> {
    if target_slot <= state.slot {
        return Err(Error::TargetSlotNotFuture {
            target: target_slot,
            current: state.slot,
        });
    }

    let mut post = state.clone();

    while post.slot < target_slot {
        if post.latest_block_header.state_root.is_zero() {
            let state_root = post.hash_tree_root();
            post.latest_block_header.state_root = state_root;
        }

        post.slot += 1;
    }

    Ok(post)
}

#[cfg(test)]
mod tests {
    use ssz::SszHash as _;

    use super::*;

    #[test]
    fn advancing_fills_the_pending_state_root_once() {
        let (state, _) = genesis::generate(1_000_000_000, 4);

        let expected_root = state.hash_tree_root();
        let post = process_slots(&state, 3).expect("target slot is in the future");

        assert_eq!(post.slot, 3);
        assert_eq!(post.latest_block_header.state_root, expected_root);
        // The input state is untouched.
        assert!(state.latest_block_header.state_root.is_zero());
        assert_eq!(state.slot, 0);
    }

    #[test]
    fn advancing_to_the_past_fails() {
        let (state, _) = genesis::generate(1_000_000_000, 4);
        let post = process_slots(&state, 2).expect("target slot is in the future");

        assert_eq!(
            process_slots(&post, 2),
            Err(Error::TargetSlotNotFuture {
                target: 2,
                current: 2,
            }),
        );

        assert_eq!(
            process_slots(&post, 1),
            Err(Error::TargetSlotNotFuture {
                target: 1,
                current: 2,
            }),
        );
    }
}
