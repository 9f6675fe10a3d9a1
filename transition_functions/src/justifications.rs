//! Conversion between the state's flattened justification tracking and the
//! map form the attestation processing logic works with.
//!
//! `justification_roots` lists the targets currently under voting
//! consideration in ascending byte order. `justification_validators` is the
//! matching bit matrix, flattened row-major with one column per validator.

use std::collections::BTreeMap;

use types::{
    collections::{JustificationRoots, JustificationValidators},
    primitives::H256,
    state::State,
};

pub fn expand(state: &State) -> BTreeMap<H256, Vec<bool>> {
    let validator_count = state.validator_count() as usize;

    state
        .justification_roots
        .iter()
        .enumerate()
        .map(|(row, root)| {
            let start = row * validator_count;

            let votes = (0..validator_count)
                .map(|column| state.justification_validators.get_bit(start + column))
                .collect();

            (*root, votes)
        })
        .collect()
}

// `BTreeMap` iterates in ascending key order and `H256` orders byte-wise,
// so the roots come out sorted without an explicit sort.
pub fn flatten(state: &mut State, justifications: &BTreeMap<H256, Vec<bool>>) {
    let validator_count = state.validator_count() as usize;

    let mut roots = JustificationRoots::default();
    let mut bits = JustificationValidators::with_length(justifications.len() * validator_count);

    for (row, (root, votes)) in justifications.iter().enumerate() {
        roots
            .push(*root)
            .expect("justification targets are bounded by the historical roots limit");

        for (column, voted) in votes.iter().enumerate() {
            if *voted {
                bits.set_or_grow(row * validator_count + column, true);
            }
        }
    }

    state.justification_roots = roots;
    state.justification_validators = bits;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_and_flatten_preserve_row_order_and_votes() {
        let (mut state, _) = genesis::generate(1_000_000_000, 3);

        let mut justifications = BTreeMap::new();
        justifications.insert(H256::repeat_byte(0x02), vec![true, false, true]);
        justifications.insert(H256::repeat_byte(0x01), vec![false, true, false]);

        flatten(&mut state, &justifications);

        assert_eq!(
            state.justification_roots.as_ref(),
            [H256::repeat_byte(0x01), H256::repeat_byte(0x02)],
        );

        // Row 0 is the lexicographically smaller root.
        assert!(!state.justification_validators.get_bit(0));
        assert!(state.justification_validators.get_bit(1));
        assert!(!state.justification_validators.get_bit(2));
        assert!(state.justification_validators.get_bit(3));
        assert!(!state.justification_validators.get_bit(4));
        assert!(state.justification_validators.get_bit(5));

        assert_eq!(expand(&state), justifications);
    }

    #[test]
    fn empty_map_flattens_to_empty_lists() {
        let (mut state, _) = genesis::generate(1_000_000_000, 3);

        flatten(&mut state, &BTreeMap::new());

        assert!(state.justification_roots.is_empty());
        assert!(state.justification_validators.is_empty());
        assert!(expand(&state).is_empty());
    }
}
