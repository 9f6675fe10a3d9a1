use anyhow::Result;
use clock::Tick;
use log::{debug, info, warn};
use parking_lot::RwLock;
use thiserror::Error as ThisError;

use fork_choice_store::Store;
use types::{
    containers::{
        AttestationData, Block, BlockWithAttestation, Checkpoint, SignedAttestation,
        SignedBlockWithAttestation,
    },
    primitives::{Slot, UnixSeconds, ValidatorIndex, H256},
    state::State,
};

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("envelope carries {signatures} signatures for {attestations} body attestations")]
    SignatureCountMismatch {
        signatures: usize,
        attestations: usize,
    },
    #[error(transparent)]
    Store(#[from] fork_choice_store::Error),
    #[error(transparent)]
    Producer(#[from] block_producer::Error),
}

pub struct Controller {
    store: RwLock<Store>,
}

impl Controller {
    pub fn new(anchor_state: State, anchor_block: Block) -> Result<Self, Error> {
        let store = Store::new(
            anchor_state,
            anchor_block,
            process_slots_adapter,
            process_block_adapter,
        )?;

        Ok(Self {
            store: RwLock::new(store),
        })
    }

    /// Imports a bare block, as during backfill or after local production on
    /// another node.
    pub fn process_block(&self, block: Block) -> Result<(), Error> {
        let slot = block.slot;

        self.store.write().process_block(block)?;

        debug!("imported block for slot {slot}");

        Ok(())
    }

    /// Imports a gossiped block envelope.
    ///
    /// The proposer attestation rides along in the envelope but is a
    /// gossip-stage vote: it is applied only after the block has been
    /// processed and the head updated. Feeding it through the on-chain path
    /// would let the proposer's own vote inflate its block's weight.
    pub fn process_block_with_attestation(
        &self,
        envelope: SignedBlockWithAttestation,
    ) -> Result<(), Error> {
        let SignedBlockWithAttestation {
            message,
            signatures,
        } = envelope;

        let BlockWithAttestation {
            block,
            proposer_attestation,
        } = message;

        // Decoded envelopes have already passed this check; envelopes built
        // in process have not.
        if signatures.len() != block.body.attestations.len() + 1 {
            return Err(Error::SignatureCountMismatch {
                signatures: signatures.len(),
                attestations: block.body.attestations.len(),
            });
        }

        let proposer_signature = signatures
            .last()
            .cloned()
            .expect("the signature list holds at least the proposer signature");

        let slot = block.slot;

        let mut store = self.store.write();

        store.process_block(block)?;

        info!("imported signed block for slot {slot}");

        let signed = proposer_attestation.with_signature(proposer_signature);

        if let Err(error) = store.process_attestation(&signed) {
            warn!("proposer attestation for slot {slot} was not applied: {error}");
        }

        Ok(())
    }

    /// Imports a gossiped attestation into the pending vote bucket.
    pub fn process_attestation(&self, attestation: SignedAttestation) -> Result<(), Error> {
        self.store.write().process_attestation(&attestation)?;

        debug!(
            "accepted attestation from validator {} for slot {}",
            attestation.message.validator_id, attestation.message.data.slot,
        );

        Ok(())
    }

    /// Ticks the store's interval clock up to `wall_time`.
    ///
    /// `has_proposal` marks that this node proposes in the slot being entered,
    /// which promotes pending votes at the propose phase.
    pub fn advance_time(&self, wall_time: UnixSeconds, has_proposal: bool) {
        self.store.write().advance_time(wall_time, has_proposal);
    }

    /// Applies a tick from the interval timer stream.
    pub fn on_tick(&self, tick: Tick, has_proposal: bool) {
        let mut store = self.store.write();
        let wall_time = tick.start_time(store.config().genesis_time);
        store.advance_time(wall_time, has_proposal);
    }

    pub fn produce_block(
        &self,
        slot: Slot,
        validator_index: ValidatorIndex,
    ) -> Result<Block, Error> {
        let block = block_producer::produce_block(&mut self.store.write(), slot, validator_index)?;

        info!(
            "produced block for slot {slot} with {} attestations",
            block.body.attestations.len(),
        );

        Ok(block)
    }

    pub fn produce_attestation_data(&self, slot: Slot) -> AttestationData {
        block_producer::produce_attestation_data(&mut self.store.write(), slot)
    }

    // Read-only queries. The clones keep lock critical sections short;
    // nothing in the store is ever mutated after insertion.

    #[must_use]
    pub fn head(&self) -> H256 {
        self.store.read().head()
    }

    #[must_use]
    pub fn safe_target(&self) -> H256 {
        self.store.read().safe_target()
    }

    #[must_use]
    pub fn latest_justified(&self) -> Checkpoint {
        self.store.read().latest_justified()
    }

    #[must_use]
    pub fn latest_finalized(&self) -> Checkpoint {
        self.store.read().latest_finalized()
    }

    #[must_use]
    pub fn has_block(&self, root: H256) -> bool {
        self.store.read().has_block(root)
    }

    #[must_use]
    pub fn block(&self, root: H256) -> Option<Block> {
        self.store.read().block(root).cloned()
    }

    #[must_use]
    pub fn current_slot(&self) -> Slot {
        self.store.read().current_slot()
    }

    #[must_use]
    pub fn current_interval(&self) -> u64 {
        self.store.read().current_interval()
    }

    #[must_use]
    pub fn validator_count(&self) -> u64 {
        self.store.read().validator_count()
    }
}

fn process_slots_adapter(state: &State, slot: Slot) -> Result<State> {
    transition_functions::process_slots(state, slot).map_err(Into::into)
}

fn process_block_adapter(state: &State, block: &Block) -> Result<State> {
    transition_functions::process_block(state, block).map_err(Into::into)
}
