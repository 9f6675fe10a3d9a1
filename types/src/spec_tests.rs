use ssz::{ReadError, SszHash as _, SszRead as _, SszWrite as _};

use crate::{
    collections::{Attestations, AttestationSignatures},
    containers::{
        Attestation, AttestationData, Block, BlockBody, BlockHeader, BlockWithAttestation,
        Checkpoint, Config, SignedAttestation, SignedBlockWithAttestation, Validator,
    },
    primitives::{PublicKeyBytes, SignatureBytes, H256},
    state::State,
};

fn sample_checkpoint() -> Checkpoint {
    Checkpoint {
        root: H256::repeat_byte(0xab),
        slot: 9,
    }
}

fn sample_attestation() -> Attestation {
    Attestation {
        validator_id: 3,
        data: AttestationData {
            slot: 9,
            head: sample_checkpoint(),
            target: sample_checkpoint(),
            source: Checkpoint {
                root: H256::repeat_byte(0x01),
                slot: 4,
            },
        },
    }
}

fn sample_block(attestations: Attestations) -> Block {
    Block {
        slot: 9,
        proposer_index: 1,
        parent_root: H256::repeat_byte(0x0b),
        state_root: H256::repeat_byte(0x0c),
        body: BlockBody { attestations },
    }
}

#[test]
fn checkpoint_encodes_to_40_bytes() {
    let bytes = sample_checkpoint().to_ssz().expect("fixed-size value");

    assert_eq!(bytes.len(), 40);
    assert_eq!(&bytes[0..32], H256::repeat_byte(0xab).as_bytes());
    assert_eq!(&bytes[32..40], 9_u64.to_le_bytes());
}

#[test]
fn config_encodes_to_8_bytes() {
    let config = Config {
        genesis_time: 1_000_000_000,
    };

    let bytes = config.to_ssz().expect("fixed-size value");

    assert_eq!(bytes.len(), 8);
    assert_eq!(Config::from_ssz(bytes), Ok(config));
}

#[test]
fn attestation_data_encodes_to_128_bytes() {
    let bytes = sample_attestation().data.to_ssz().expect("fixed-size value");

    assert_eq!(bytes.len(), 128);
}

#[test]
fn attestation_encodes_to_136_bytes() {
    let attestation = sample_attestation();
    let bytes = attestation.to_ssz().expect("fixed-size value");

    assert_eq!(bytes.len(), 136);
    assert_eq!(Attestation::from_ssz(bytes), Ok(attestation));
}

#[test]
fn signed_attestation_encodes_to_3248_bytes() {
    let signed = sample_attestation().with_signature(SignatureBytes::from([0xcd; 3112]));
    let bytes = signed.to_ssz().expect("fixed-size value");

    assert_eq!(bytes.len(), 3248);
    assert_eq!(SignedAttestation::from_ssz(bytes), Ok(signed));
}

#[test]
fn validator_encodes_to_60_bytes() {
    let validator = Validator {
        pubkey: PublicKeyBytes::from([0x11; 52]),
        index: 7,
    };

    let bytes = validator.to_ssz().expect("fixed-size value");

    assert_eq!(bytes.len(), 60);
    assert_eq!(Validator::from_ssz(bytes), Ok(validator));
}

#[test]
fn block_header_encodes_to_112_bytes() {
    let bytes = BlockHeader::default().to_ssz().expect("fixed-size value");

    assert_eq!(bytes.len(), 112);
}

#[test]
fn fixed_size_decoding_rejects_short_input() {
    assert_eq!(
        Checkpoint::from_ssz([0; 39]),
        Err(ReadError::FixedSizeMismatch {
            expected: 40,
            actual: 39,
        }),
    );
}

#[test]
fn fixed_size_decoding_rejects_trailing_bytes() {
    assert_eq!(
        Checkpoint::from_ssz([0; 41]),
        Err(ReadError::FixedSizeMismatch {
            expected: 40,
            actual: 41,
        }),
    );
}

#[test]
fn empty_block_body_round_trips() {
    let body = BlockBody::default();
    let bytes = body.to_ssz().expect("offsets fit in u32");

    // A single offset pointing just past itself.
    assert_eq!(bytes, vec![4, 0, 0, 0]);
    assert_eq!(BlockBody::from_ssz(bytes), Ok(body));
}

#[test]
fn block_with_attestations_round_trips() {
    let attestations = Attestations::try_from(vec![sample_attestation(); 3])
        .expect("length is below maximum");
    let block = sample_block(attestations);

    let bytes = block.to_ssz().expect("offsets fit in u32");

    assert_eq!(bytes.len(), 84 + 4 + 3 * 136);
    assert_eq!(Block::from_ssz(bytes), Ok(block));
}

#[test]
fn block_body_decoding_rejects_bad_first_offset() {
    assert_eq!(
        BlockBody::from_ssz([5, 0, 0, 0]),
        Err(ReadError::ContainerFirstOffsetMismatch {
            expected: 4,
            actual: 5,
        }),
    );
}

#[test]
fn block_decoding_rejects_offset_past_the_end() {
    let mut bytes = sample_block(Attestations::default())
        .to_ssz()
        .expect("offsets fit in u32");

    // Point the body offset past the end of the buffer.
    bytes[80..84].copy_from_slice(&200_u32.to_le_bytes());

    assert_eq!(
        Block::from_ssz(bytes),
        Err(ReadError::ContainerFirstOffsetMismatch {
            expected: 84,
            actual: 200,
        }),
    );
}

#[test]
fn signed_block_envelope_round_trips() {
    let attestations =
        Attestations::try_from(vec![sample_attestation(); 2]).expect("length is below maximum");

    let envelope = SignedBlockWithAttestation {
        message: BlockWithAttestation {
            block: sample_block(attestations),
            proposer_attestation: sample_attestation(),
        },
        signatures: AttestationSignatures::try_from(vec![SignatureBytes::default(); 3])
            .expect("length is below maximum"),
    };

    let bytes = envelope.to_ssz().expect("offsets fit in u32");

    assert_eq!(SignedBlockWithAttestation::from_ssz(bytes), Ok(envelope));
}

#[test]
fn signed_block_envelope_decoding_rejects_mismatched_signature_count() {
    let attestations =
        Attestations::try_from(vec![sample_attestation(); 2]).expect("length is below maximum");

    let envelope = SignedBlockWithAttestation {
        message: BlockWithAttestation {
            block: sample_block(attestations),
            proposer_attestation: sample_attestation(),
        },
        // Two body attestations require three signatures, not two.
        signatures: AttestationSignatures::try_from(vec![SignatureBytes::default(); 2])
            .expect("length is below maximum"),
    };

    let bytes = envelope.to_ssz().expect("offsets fit in u32");

    SignedBlockWithAttestation::from_ssz(bytes)
        .expect_err("decoder must reject a short signature list");
}

#[test]
fn state_round_trips() {
    let state = State::default();
    let bytes = state.to_ssz().expect("offsets fit in u32");

    // Fixed part, then two empty bit lists of one delimiter byte each.
    assert_eq!(bytes.len(), 228 + 2);
    assert_eq!(State::from_ssz(bytes), Ok(state));
}

#[test]
fn state_decoding_rejects_out_of_order_offsets() {
    let mut bytes = State::default().to_ssz().expect("offsets fit in u32");

    // Make the second variable-field offset point before the first.
    bytes[212..216].copy_from_slice(&100_u32.to_le_bytes());

    assert!(matches!(
        State::from_ssz(bytes),
        Err(ReadError::OffsetsNotValidSubsliceBounds { .. }),
    ));
}

#[test]
fn block_root_equals_header_root() {
    let attestations =
        Attestations::try_from(vec![sample_attestation()]).expect("length is below maximum");
    let block = sample_block(attestations);

    let header = BlockHeader {
        slot: block.slot,
        proposer_index: block.proposer_index,
        parent_root: block.parent_root,
        state_root: block.state_root,
        body_root: block.body.hash_tree_root(),
    };

    assert_eq!(block.hash_tree_root(), header.hash_tree_root());
}

#[test]
fn roots_are_deterministic_and_distinct() {
    let checkpoint = sample_checkpoint();

    assert_eq!(checkpoint.hash_tree_root(), checkpoint.hash_tree_root());

    let other = Checkpoint {
        slot: checkpoint.slot + 1,
        ..checkpoint
    };

    assert_ne!(checkpoint.hash_tree_root(), other.hash_tree_root());
}
