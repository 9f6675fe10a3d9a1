//! End-to-end tests driving two nodes through the full pipeline:
//! production on one, envelope and gossip import on the other.

use ssz::SszHash as _;
use types::{
    collections::AttestationSignatures,
    containers::{
        Attestation, Block, BlockWithAttestation, SignedAttestation, SignedBlockWithAttestation,
    },
    primitives::{SignatureBytes, UnixSeconds},
};

use crate::{Controller, Error};

const GENESIS_TIME: UnixSeconds = 1_000_000_000;
const VALIDATOR_COUNT: u64 = 4;

fn new_node() -> Controller {
    let (state, anchor) = genesis::generate(GENESIS_TIME, VALIDATOR_COUNT);
    Controller::new(state, anchor).expect("anchor block carries the genesis state root")
}

fn envelope(block: Block, proposer_attestation: Attestation) -> SignedBlockWithAttestation {
    let signatures = AttestationSignatures::try_from(vec![
        SignatureBytes::default();
        block.body.attestations.len() + 1
    ])
    .expect("one signature per attestation plus the proposer fits the limit");

    SignedBlockWithAttestation {
        message: BlockWithAttestation {
            block,
            proposer_attestation,
        },
        signatures,
    }
}

#[test]
fn two_nodes_converge_and_finalize_through_envelopes_and_gossip() {
    let producer = new_node();
    let receiver = new_node();

    for slot in 1..=6 {
        let proposer = slot % VALIDATOR_COUNT;

        let block = producer
            .produce_block(slot, proposer)
            .expect("the rotating proposer is always correct");

        // Every validator attests to what it sees, the proposer's vote
        // traveling in the block envelope instead of gossip.
        let data = producer.produce_attestation_data(slot);

        let proposer_attestation = Attestation {
            validator_id: proposer,
            data,
        };

        receiver.advance_time(GENESIS_TIME + slot * 4, false);
        receiver
            .process_block_with_attestation(envelope(block, proposer_attestation))
            .expect("produced blocks are valid on other nodes");

        for validator_id in (0..VALIDATOR_COUNT).filter(|validator_id| *validator_id != proposer) {
            let attestation = SignedAttestation {
                message: Attestation { validator_id, data },
                signature: SignatureBytes::default(),
            };

            producer
                .process_attestation(attestation.clone())
                .expect("locally produced attestations are valid");
            receiver
                .process_attestation(attestation)
                .expect("gossiped attestations are valid");
        }

        // The producer hears its own proposer attestation over gossip too.
        producer
            .process_attestation(SignedAttestation {
                message: Attestation {
                    validator_id: proposer,
                    data,
                },
                signature: SignatureBytes::default(),
            })
            .expect("the proposer attestation is valid");
    }

    assert_eq!(producer.current_slot(), 6);
    assert_eq!(producer.head(), receiver.head());

    // Six slots of honest voting justify the block at slot 2 and finalize its
    // ancestor at slot 1 on both nodes.
    assert_eq!(producer.latest_justified().slot, 2);
    assert_eq!(producer.latest_finalized().slot, 1);
    assert_eq!(producer.latest_justified(), receiver.latest_justified());
    assert_eq!(producer.latest_finalized(), receiver.latest_finalized());
}

#[test]
fn envelopes_with_short_signature_lists_are_rejected() {
    let producer = new_node();
    let receiver = new_node();

    let block = producer
        .produce_block(1, 1)
        .expect("validator 1 proposes slot 1");

    let data = producer.produce_attestation_data(1);

    let mut envelope = envelope(
        block,
        Attestation {
            validator_id: 1,
            data,
        },
    );

    envelope.signatures = AttestationSignatures::default();

    receiver.advance_time(GENESIS_TIME + 4, false);

    assert!(matches!(
        receiver.process_block_with_attestation(envelope),
        Err(Error::SignatureCountMismatch {
            signatures: 0,
            attestations: 0,
        }),
    ));
}

#[test]
fn blocks_with_unknown_parents_are_rejected() {
    let producer = new_node();
    let receiver = new_node();

    producer
        .produce_block(1, 1)
        .expect("validator 1 proposes slot 1");

    let orphan = producer
        .produce_block(2, 2)
        .expect("validator 2 proposes slot 2");

    receiver.advance_time(GENESIS_TIME + 8, false);

    // The receiver never saw the block at slot 1.
    assert!(matches!(
        receiver.process_block(orphan),
        Err(Error::Store(fork_choice_store::Error::ParentNotFound { .. })),
    ));
}

#[test]
fn ticks_from_the_interval_timer_drive_the_clock() {
    let node = new_node();

    node.on_tick(
        clock::Tick {
            slot: 2,
            kind: clock::TickKind::Vote,
        },
        false,
    );

    assert_eq!(node.current_slot(), 2);
    assert_eq!(node.current_interval(), 1);
}

#[test]
fn queries_reflect_the_store() {
    let node = new_node();

    assert_eq!(node.validator_count(), VALIDATOR_COUNT);
    assert_eq!(node.current_slot(), 0);
    assert_eq!(node.current_interval(), 0);

    let block = node.produce_block(1, 1).expect("validator 1 proposes slot 1");
    let block_root = block.hash_tree_root();

    assert!(node.has_block(block_root));
    assert_eq!(node.block(block_root), Some(block));
    assert_eq!(node.head(), block_root);
    assert_eq!(node.current_slot(), 1);

    node.advance_time(GENESIS_TIME + 9, false);

    assert_eq!(node.current_slot(), 2);
    assert_eq!(node.current_interval(), 1);
}
