use std::collections::HashMap;

use anyhow::Result;
use helper_functions::predicates;
use log::debug;
use ssz::SszHash as _;
use types::{
    consts::{INTERVALS_PER_SLOT, JUSTIFICATION_LOOKBACK_SLOTS, SECONDS_PER_INTERVAL},
    containers::{Attestation, Block, Checkpoint, Config, SignedAttestation},
    primitives::{Slot, UnixSeconds, H256},
    state::State,
};

use crate::{error::Error, lmd_ghost};

/// The state transition is injected as two plain functions to keep this crate
/// independent of its implementation. Fork choice needs nothing else from it.
pub type ProcessSlotsFn = fn(&State, Slot) -> Result<State>;
pub type ProcessBlockFn = fn(&State, &Block) -> Result<State>;

pub struct Store {
    // Absolute interval counter since genesis, advanced one tick at a time.
    time: u64,
    config: Config,
    head: H256,
    safe_target: H256,
    latest_justified: Checkpoint,
    latest_finalized: Checkpoint,
    // Both maps are keyed by the block's own hash tree root. Entries are never
    // mutated after insertion.
    blocks: HashMap<H256, Block>,
    states: HashMap<H256, State>,
    // Indexed by validator. The zero checkpoint marks an empty slot in either
    // bucket. Known votes come from blocks, new votes from gossip; new votes
    // are promoted at the accept phases of the interval clock.
    latest_known_votes: Vec<Checkpoint>,
    latest_new_votes: Vec<Checkpoint>,
    process_slots_fn: ProcessSlotsFn,
    process_block_fn: ProcessBlockFn,
}

impl Store {
    pub fn new(
        state: State,
        anchor_block: Block,
        process_slots_fn: ProcessSlotsFn,
        process_block_fn: ProcessBlockFn,
    ) -> Result<Self, Error> {
        let state_root = state.hash_tree_root();

        if anchor_block.state_root != state_root {
            return Err(Error::AnchorStateRootMismatch {
                block: anchor_block.state_root,
                state: state_root,
            });
        }

        let anchor_root = anchor_block.hash_tree_root();
        let validator_count = state.validators.len();

        let latest_justified = state.latest_justified;
        let latest_finalized = state.latest_finalized;

        Ok(Self {
            time: anchor_block.slot * INTERVALS_PER_SLOT,
            config: state.config,
            head: anchor_root,
            safe_target: anchor_root,
            latest_justified,
            latest_finalized,
            blocks: HashMap::from([(anchor_root, anchor_block)]),
            states: HashMap::from([(anchor_root, state)]),
            latest_known_votes: vec![Checkpoint::default(); validator_count],
            latest_new_votes: vec![Checkpoint::default(); validator_count],
            process_slots_fn,
            process_block_fn,
        })
    }

    // Read-only queries.

    #[must_use]
    pub fn head(&self) -> H256 {
        self.head
    }

    #[must_use]
    pub fn safe_target(&self) -> H256 {
        self.safe_target
    }

    #[must_use]
    pub fn latest_justified(&self) -> Checkpoint {
        self.latest_justified
    }

    #[must_use]
    pub fn latest_finalized(&self) -> Checkpoint {
        self.latest_finalized
    }

    #[must_use]
    pub fn config(&self) -> Config {
        self.config
    }

    #[must_use]
    pub fn has_block(&self, root: H256) -> bool {
        self.blocks.contains_key(&root)
    }

    #[must_use]
    pub fn block(&self, root: H256) -> Option<&Block> {
        self.blocks.get(&root)
    }

    #[must_use]
    pub fn state(&self, root: H256) -> Option<&State> {
        self.states.get(&root)
    }

    #[must_use]
    pub fn current_slot(&self) -> Slot {
        self.time / INTERVALS_PER_SLOT
    }

    #[must_use]
    pub fn current_interval(&self) -> u64 {
        self.time % INTERVALS_PER_SLOT
    }

    #[must_use]
    pub fn validator_count(&self) -> u64 {
        self.latest_known_votes.len() as u64
    }

    #[must_use]
    pub fn known_votes(&self) -> &[Checkpoint] {
        &self.latest_known_votes
    }

    #[must_use]
    pub fn new_votes(&self) -> &[Checkpoint] {
        &self.latest_new_votes
    }

    // Producers build candidate blocks against tentative states and need the
    // same transition functions the store was constructed with.

    pub fn run_process_slots(&self, state: &State, slot: Slot) -> Result<State> {
        (self.process_slots_fn)(state, slot)
    }

    pub fn run_process_block(&self, state: &State, block: &Block) -> Result<State> {
        (self.process_block_fn)(state, block)
    }

    /// Imports a block, deriving its post-state through the injected
    /// transition functions.
    ///
    /// Known blocks are accepted idempotently. Body attestations are folded
    /// into the known-vote bucket with on-chain semantics; ones that fail
    /// validation are dropped without failing the block, since stale votes in
    /// a body are not the importing node's error.
    pub fn process_block(&mut self, block: Block) -> Result<(), Error> {
        let block_root = block.hash_tree_root();

        if self.blocks.contains_key(&block_root) {
            return Ok(());
        }

        let parent_state =
            self.states
                .get(&block.parent_root)
                .ok_or(Error::ParentNotFound {
                    block_root,
                    parent_root: block.parent_root,
                })?;

        let state = (self.process_slots_fn)(parent_state, block.slot).map_err(Error::Transition)?;
        let state = (self.process_block_fn)(&state, &block).map_err(Error::Transition)?;

        let computed = state.hash_tree_root();

        if computed != block.state_root {
            return Err(Error::StateRootMismatch {
                block_root,
                in_block: block.state_root,
                computed,
            });
        }

        let attestations = block.body.attestations.to_vec();

        self.blocks.insert(block_root, block);
        self.states.insert(block_root, state);

        for attestation in &attestations {
            if let Err(error) = self.validate_attestation(attestation) {
                debug!("ignoring attestation carried in block {block_root:?}: {error}");
                continue;
            }

            self.register_vote(attestation, true);
        }

        self.update_head();

        Ok(())
    }

    /// Imports a gossiped attestation into the pending vote bucket.
    pub fn process_attestation(&mut self, attestation: &SignedAttestation) -> Result<(), Error> {
        let attestation = &attestation.message;

        self.validate_attestation(attestation)?;

        // Gossip is held to a stricter bound than block-borne votes: the
        // attested slot must have started.
        let current_slot = self.current_slot();

        if attestation.data.slot > current_slot {
            return Err(Error::FutureVote {
                slot: attestation.data.slot,
                current: current_slot,
            });
        }

        self.register_vote(attestation, false);

        Ok(())
    }

    pub fn validate_attestation(&self, attestation: &Attestation) -> Result<(), Error> {
        let data = attestation.data;
        let validator_count = self.latest_known_votes.len();

        if attestation.validator_id as usize >= validator_count {
            return Err(Error::ValidatorOutOfRange {
                validator_id: attestation.validator_id,
                validator_count,
            });
        }

        let target_block = self
            .blocks
            .get(&data.target.root)
            .ok_or(Error::TargetNotFound {
                root: data.target.root,
            })?;

        if !self.blocks.contains_key(&data.head.root) {
            return Err(Error::HeadNotFound {
                root: data.head.root,
            });
        }

        // The zero root with slot 0 is the genesis anchor checkpoint and has
        // no block of its own.
        let source_slot = if data.source.root.is_zero() {
            if data.source.slot != 0 {
                return Err(Error::SlotMismatch {
                    expected: 0,
                    actual: data.source.slot,
                });
            }

            0
        } else {
            let source_block =
                self.blocks
                    .get(&data.source.root)
                    .ok_or(Error::SourceNotFound {
                        root: data.source.root,
                    })?;

            if source_block.slot != data.source.slot {
                return Err(Error::SlotMismatch {
                    expected: source_block.slot,
                    actual: data.source.slot,
                });
            }

            source_block.slot
        };

        if source_slot > target_block.slot {
            return Err(Error::SlotMismatch {
                expected: target_block.slot,
                actual: source_slot,
            });
        }

        if data.source.slot > data.target.slot {
            return Err(Error::SlotMismatch {
                expected: data.target.slot,
                actual: data.source.slot,
            });
        }

        if target_block.slot != data.target.slot {
            return Err(Error::SlotMismatch {
                expected: target_block.slot,
                actual: data.target.slot,
            });
        }

        let current_slot = self.current_slot();

        if data.slot > current_slot + 1 {
            return Err(Error::FutureVote {
                slot: data.slot,
                current: current_slot,
            });
        }

        Ok(())
    }

    fn register_vote(&mut self, attestation: &Attestation, from_block: bool) {
        let validator = attestation.validator_id as usize;
        let data = attestation.data;

        if from_block {
            let known = self.latest_known_votes[validator];

            if known.root.is_zero() || known.slot < data.slot {
                self.latest_known_votes[validator] = data.target;
            }

            // A pending vote that the block already covers is dropped.
            let new = self.latest_new_votes[validator];

            if !new.root.is_zero() && new.slot <= data.target.slot {
                self.latest_new_votes[validator] = Checkpoint::default();
            }
        } else {
            let new = self.latest_new_votes[validator];

            if new.root.is_zero() || new.slot < data.target.slot {
                self.latest_new_votes[validator] = data.target;
            }
        }
    }

    /// Ticks the interval clock forward to `wall_time`.
    ///
    /// `has_proposal` only applies to the final tick of the advance: a local
    /// proposer promotes pending votes at the start of its slot so its block
    /// counts everything seen so far.
    pub fn advance_time(&mut self, wall_time: UnixSeconds, has_proposal: bool) {
        if wall_time < self.config.genesis_time {
            return;
        }

        let target = (wall_time - self.config.genesis_time) / SECONDS_PER_INTERVAL;

        while self.time < target {
            let is_final_tick = self.time + 1 == target;
            self.tick_interval(has_proposal && is_final_tick);
        }
    }

    /// Ticks up to the start of `slot` and promotes pending votes, as block
    /// and attestation producers require.
    pub fn advance_to_slot(&mut self, slot: Slot) {
        let target = slot * INTERVALS_PER_SLOT;

        while self.time < target {
            let is_final_tick = self.time + 1 == target;
            self.tick_interval(is_final_tick);
        }

        self.accept_new_votes();
    }

    fn tick_interval(&mut self, has_proposal: bool) {
        self.time += 1;

        match self.time % INTERVALS_PER_SLOT {
            0 => {
                if has_proposal {
                    self.accept_new_votes();
                }
            }
            // The validator voting window.
            1 => {}
            2 => self.update_safe_target(),
            _ => self.accept_new_votes(),
        }
    }

    fn accept_new_votes(&mut self) {
        for validator in 0..self.latest_new_votes.len() {
            let vote = self.latest_new_votes[validator];

            if !vote.root.is_zero() {
                self.latest_known_votes[validator] = vote;
                self.latest_new_votes[validator] = Checkpoint::default();
            }
        }

        self.update_head();
    }

    fn update_head(&mut self) {
        // Adopt the best justified checkpoint seen in any stored state, as
        // long as its block is known.
        if let Some(latest) = lmd_ghost::latest_justified_checkpoint(&self.states) {
            if self.blocks.contains_key(&latest.root) {
                self.latest_justified = latest;
            }
        }

        self.head = lmd_ghost::get_head(
            &self.blocks,
            self.latest_justified.root,
            &self.latest_known_votes,
            0,
        );

        if let Some(state) = self.states.get(&self.head) {
            if self.blocks.contains_key(&state.latest_finalized.root) {
                self.latest_finalized = state.latest_finalized;
            }
        }
    }

    fn update_safe_target(&mut self) {
        let validator_count = self.latest_new_votes.len();
        let min_score = (validator_count * 2).div_ceil(3);

        self.safe_target = lmd_ghost::get_head(
            &self.blocks,
            self.latest_justified.root,
            &self.latest_new_votes,
            min_score,
        );
    }

    /// Inserts a locally produced block whose post-state is already known.
    pub fn insert_produced_block(&mut self, block: Block, post_state: State) {
        let block_root = block.hash_tree_root();

        self.blocks.insert(block_root, block);
        self.states.insert(block_root, post_state);

        self.update_head();
    }

    /// The checkpoint a fresh attestation should use as its target.
    ///
    /// Walks back from the head: first up to a few steps toward the safe
    /// target, then further until the slot is a viable justification
    /// candidate.
    #[must_use]
    pub fn vote_target(&self) -> Checkpoint {
        let mut target_root = self.head;

        for _ in 0..JUSTIFICATION_LOOKBACK_SLOTS {
            if self.blocks[&target_root].slot > self.blocks[&self.safe_target].slot {
                target_root = self.blocks[&target_root].parent_root;
            }
        }

        while !predicates::is_justifiable_after(
            self.blocks[&target_root].slot,
            self.latest_finalized.slot,
        ) {
            target_root = self.blocks[&target_root].parent_root;
        }

        Checkpoint {
            root: target_root,
            slot: self.blocks[&target_root].slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use ssz::SszHash as _;
    use types::{
        containers::{AttestationData, BlockBody, SignedAttestation},
        primitives::SignatureBytes,
    };

    use super::*;

    const GENESIS_TIME: UnixSeconds = 1_000_000_000;

    fn process_slots_adapter(state: &State, slot: Slot) -> Result<State> {
        transition_functions::process_slots(state, slot).map_err(Into::into)
    }

    fn process_block_adapter(state: &State, block: &Block) -> Result<State> {
        transition_functions::process_block(state, block).map_err(Into::into)
    }

    fn new_store(validator_count: u64) -> Store {
        let (state, anchor) = genesis::generate(GENESIS_TIME, validator_count);

        Store::new(state, anchor, process_slots_adapter, process_block_adapter)
            .expect("anchor block carries the genesis state root")
    }

    /// Builds a valid empty block on the current head.
    fn block_on_head(store: &Store, slot: Slot) -> Block {
        let head_state = store.state(store.head()).expect("head state is stored");

        let advanced = transition_functions::process_slots(head_state, slot)
            .expect("slot is in the future");

        let mut block = Block {
            slot,
            proposer_index: slot % store.validator_count(),
            parent_root: store.head(),
            state_root: H256::zero(),
            body: BlockBody::default(),
        };

        let post = transition_functions::process_block(&advanced, &block)
            .expect("block is valid");

        block.state_root = post.hash_tree_root();
        block
    }

    fn vote_for_head(store: &Store, validator_id: u64, slot: Slot) -> SignedAttestation {
        let head_root = store.head();
        let head_slot = store.block(head_root).expect("head block is stored").slot;

        let checkpoint = Checkpoint {
            root: head_root,
            slot: head_slot,
        };

        Attestation {
            validator_id,
            data: AttestationData {
                slot,
                head: checkpoint,
                target: checkpoint,
                source: Checkpoint::default(),
            },
        }
        .with_signature(SignatureBytes::default())
    }

    #[test]
    fn mismatched_anchor_is_rejected() {
        let (state, mut anchor) = genesis::generate(GENESIS_TIME, 4);

        anchor.state_root = H256::repeat_byte(0xbd);

        assert!(matches!(
            Store::new(state, anchor, process_slots_adapter, process_block_adapter),
            Err(Error::AnchorStateRootMismatch { .. }),
        ));
    }

    #[test]
    fn processing_a_block_twice_is_idempotent() {
        let mut store = new_store(4);
        let block = block_on_head(&store, 1);
        let block_root = block.hash_tree_root();

        store.process_block(block.clone()).expect("block is valid");

        assert_eq!(store.head(), block_root);
        assert!(store.has_block(block_root));

        store.process_block(block).expect("known blocks are accepted");

        assert_eq!(store.head(), block_root);
    }

    #[test]
    fn unknown_parents_are_rejected() {
        let mut store = new_store(4);
        let mut block = block_on_head(&store, 1);

        block.parent_root = H256::repeat_byte(0x55);

        assert!(matches!(
            store.process_block(block),
            Err(Error::ParentNotFound { .. }),
        ));
    }

    #[test]
    fn wrong_state_roots_are_rejected() {
        let mut store = new_store(4);
        let mut block = block_on_head(&store, 1);

        block.state_root = H256::repeat_byte(0x66);

        assert!(matches!(
            store.process_block(block),
            Err(Error::StateRootMismatch { .. }),
        ));
    }

    #[test]
    fn gossip_votes_wait_in_the_pending_bucket() {
        let mut store = new_store(4);

        store
            .process_block(block_on_head(&store, 1))
            .expect("block is valid");

        store.advance_time(GENESIS_TIME + 4, false);

        let attestation = vote_for_head(&store, 0, 1);
        let target = attestation.message.data.target;

        store
            .process_attestation(&attestation)
            .expect("attestation is valid");

        assert_eq!(store.new_votes()[0], target);
        assert_eq!(store.known_votes()[0], Checkpoint::default());

        // The accept phase at the third interval promotes the vote.
        store.advance_time(GENESIS_TIME + 8, false);

        assert_eq!(store.new_votes()[0], Checkpoint::default());
        assert_eq!(store.known_votes()[0], target);
    }

    #[test]
    fn gossip_votes_for_future_slots_are_rejected() {
        let mut store = new_store(4);

        store
            .process_block(block_on_head(&store, 1))
            .expect("block is valid");

        // The store clock still points at slot 0.
        let attestation = vote_for_head(&store, 0, 1);

        assert!(matches!(
            store.process_attestation(&attestation),
            Err(Error::FutureVote { .. }),
        ));
    }

    #[test]
    fn votes_from_unknown_validators_are_rejected() {
        let mut store = new_store(4);

        store
            .process_block(block_on_head(&store, 1))
            .expect("block is valid");

        store.advance_time(GENESIS_TIME + 4, false);

        let attestation = vote_for_head(&store, 40, 1);

        assert!(matches!(
            store.process_attestation(&attestation),
            Err(Error::ValidatorOutOfRange { .. }),
        ));
    }

    #[test]
    fn repeated_gossip_votes_do_not_accumulate() {
        let mut store = new_store(4);

        store
            .process_block(block_on_head(&store, 1))
            .expect("block is valid");

        store.advance_time(GENESIS_TIME + 4, false);

        let attestation = vote_for_head(&store, 0, 1);

        for _ in 0..3 {
            store
                .process_attestation(&attestation)
                .expect("attestation is valid");
        }

        let occupied = store
            .new_votes()
            .iter()
            .filter(|vote| !vote.root.is_zero())
            .count();

        assert_eq!(occupied, 1);
    }

    #[test]
    fn the_clock_reports_slots_and_intervals() {
        let mut store = new_store(4);

        assert_eq!(store.current_slot(), 0);
        assert_eq!(store.current_interval(), 0);

        store.advance_time(GENESIS_TIME + 9, false);

        assert_eq!(store.current_slot(), 2);
        assert_eq!(store.current_interval(), 1);

        // Time before genesis does not move the clock backwards.
        store.advance_time(GENESIS_TIME - 1, false);

        assert_eq!(store.current_slot(), 2);
    }

    #[test]
    fn head_follows_the_chain_tip() {
        let mut store = new_store(4);

        store
            .process_block(block_on_head(&store, 1))
            .expect("block is valid");

        let tip = block_on_head(&store, 2);
        let tip_root = tip.hash_tree_root();

        store.process_block(tip).expect("block is valid");

        assert_eq!(store.head(), tip_root);

        // A promoted vote for the tip keeps the head there.
        store.advance_time(GENESIS_TIME + 8, false);

        let attestation = vote_for_head(&store, 1, 2);

        store
            .process_attestation(&attestation)
            .expect("attestation is valid");

        store.advance_time(GENESIS_TIME + 12, false);

        assert_eq!(store.head(), tip_root);
        assert_eq!(store.known_votes()[1].root, tip_root);
    }
}

