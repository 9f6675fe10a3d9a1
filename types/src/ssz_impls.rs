//! Hand-written SSZ impls for the consensus containers.
//!
//! The container set is small and closed, so the impls are spelled out
//! instead of generated. Offsets below are byte positions within each
//! container's fixed-length part and follow field declaration order.

use ssz::{
    depth_for_chunks, read_offset, subslice, write_offset, MerkleTree, ReadError, Size, SszHash,
    SszRead, SszSize, SszWrite, WriteError, H256,
};

use crate::{
    collections::{
        AttestationSignatures, Attestations, HistoricalRoots, JustificationRoots,
        JustificationValidators, JustifiedSlots, Validators,
    },
    containers::{
        Attestation, AttestationData, Block, BlockBody, BlockHeader, BlockWithAttestation,
        Checkpoint, Config, SignedAttestation, SignedBlockWithAttestation, Validator,
    },
    primitives::{PublicKeyBytes, SignatureBytes, Slot, ValidatorIndex},
    state::State,
};

const CHECKPOINT_SIZE: usize = 40;
const CONFIG_SIZE: usize = 8;
const VALIDATOR_SIZE: usize = 60;
const ATTESTATION_DATA_SIZE: usize = 128;
const ATTESTATION_SIZE: usize = 136;
const SIGNED_ATTESTATION_SIZE: usize = 3248;
const BLOCK_HEADER_SIZE: usize = 112;

const BLOCK_BODY_FIXED_PART: usize = 4;
const BLOCK_FIXED_PART: usize = 84;
const BLOCK_WITH_ATTESTATION_FIXED_PART: usize = 140;
const SIGNED_BLOCK_FIXED_PART: usize = 8;
const STATE_FIXED_PART: usize = 228;

impl SszSize for Checkpoint {
    const SIZE: Size = Size::Fixed {
        size: CHECKPOINT_SIZE,
    };
}

impl SszRead for Checkpoint {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let root = H256::from_ssz_unchecked(&bytes[0..32])?;
        let slot = Slot::from_ssz_unchecked(&bytes[32..40])?;

        Ok(Self { root, slot })
    }
}

impl SszWrite for Checkpoint {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.root.write_fixed(&mut bytes[0..32]);
        self.slot.write_fixed(&mut bytes[32..40]);
    }
}

impl SszHash for Checkpoint {
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256 {
        MerkleTree::merkleize_chunks(
            [self.root.hash_tree_root(), self.slot.hash_tree_root()],
            depth_for_chunks(2),
        )
    }
}

impl SszSize for Config {
    const SIZE: Size = Size::Fixed { size: CONFIG_SIZE };
}

impl SszRead for Config {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let genesis_time = u64::from_ssz_unchecked(&bytes[0..8])?;

        Ok(Self { genesis_time })
    }
}

impl SszWrite for Config {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.genesis_time.write_fixed(&mut bytes[0..8]);
    }
}

impl SszHash for Config {
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256 {
        MerkleTree::merkleize_chunks([self.genesis_time.hash_tree_root()], depth_for_chunks(1))
    }
}

impl SszSize for Validator {
    const SIZE: Size = Size::Fixed {
        size: VALIDATOR_SIZE,
    };
}

impl SszRead for Validator {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let pubkey = PublicKeyBytes::from_ssz_unchecked(&bytes[0..52])?;
        let index = ValidatorIndex::from_ssz_unchecked(&bytes[52..60])?;

        Ok(Self { pubkey, index })
    }
}

impl SszWrite for Validator {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.pubkey.write_fixed(&mut bytes[0..52]);
        self.index.write_fixed(&mut bytes[52..60]);
    }
}

impl SszHash for Validator {
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256 {
        MerkleTree::merkleize_chunks(
            [self.pubkey.hash_tree_root(), self.index.hash_tree_root()],
            depth_for_chunks(2),
        )
    }
}

impl SszSize for AttestationData {
    const SIZE: Size = Size::Fixed {
        size: ATTESTATION_DATA_SIZE,
    };
}

impl SszRead for AttestationData {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let slot = Slot::from_ssz_unchecked(&bytes[0..8])?;
        let head = Checkpoint::from_ssz_unchecked(&bytes[8..48])?;
        let target = Checkpoint::from_ssz_unchecked(&bytes[48..88])?;
        let source = Checkpoint::from_ssz_unchecked(&bytes[88..128])?;

        Ok(Self {
            slot,
            head,
            target,
            source,
        })
    }
}

impl SszWrite for AttestationData {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.slot.write_fixed(&mut bytes[0..8]);
        self.head.write_fixed(&mut bytes[8..48]);
        self.target.write_fixed(&mut bytes[48..88]);
        self.source.write_fixed(&mut bytes[88..128]);
    }
}

impl SszHash for AttestationData {
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256 {
        MerkleTree::merkleize_chunks(
            [
                self.slot.hash_tree_root(),
                self.head.hash_tree_root(),
                self.target.hash_tree_root(),
                self.source.hash_tree_root(),
            ],
            depth_for_chunks(4),
        )
    }
}

impl SszSize for Attestation {
    const SIZE: Size = Size::Fixed {
        size: ATTESTATION_SIZE,
    };
}

impl SszRead for Attestation {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let validator_id = u64::from_ssz_unchecked(&bytes[0..8])?;
        let data = AttestationData::from_ssz_unchecked(&bytes[8..136])?;

        Ok(Self { validator_id, data })
    }
}

impl SszWrite for Attestation {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.validator_id.write_fixed(&mut bytes[0..8]);
        self.data.write_fixed(&mut bytes[8..136]);
    }
}

impl SszHash for Attestation {
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256 {
        MerkleTree::merkleize_chunks(
            [
                self.validator_id.hash_tree_root(),
                self.data.hash_tree_root(),
            ],
            depth_for_chunks(2),
        )
    }
}

impl SszSize for SignedAttestation {
    const SIZE: Size = Size::Fixed {
        size: SIGNED_ATTESTATION_SIZE,
    };
}

impl SszRead for SignedAttestation {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let message = Attestation::from_ssz_unchecked(&bytes[0..136])?;
        let signature = SignatureBytes::from_ssz_unchecked(&bytes[136..3248])?;

        Ok(Self { message, signature })
    }
}

impl SszWrite for SignedAttestation {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.message.write_fixed(&mut bytes[0..136]);
        self.signature.write_fixed(&mut bytes[136..3248]);
    }
}

impl SszHash for SignedAttestation {
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256 {
        MerkleTree::merkleize_chunks(
            [
                self.message.hash_tree_root(),
                self.signature.hash_tree_root(),
            ],
            depth_for_chunks(2),
        )
    }
}

impl SszSize for BlockHeader {
    const SIZE: Size = Size::Fixed {
        size: BLOCK_HEADER_SIZE,
    };
}

impl SszRead for BlockHeader {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let slot = Slot::from_ssz_unchecked(&bytes[0..8])?;
        let proposer_index = ValidatorIndex::from_ssz_unchecked(&bytes[8..16])?;
        let parent_root = H256::from_ssz_unchecked(&bytes[16..48])?;
        let state_root = H256::from_ssz_unchecked(&bytes[48..80])?;
        let body_root = H256::from_ssz_unchecked(&bytes[80..112])?;

        Ok(Self {
            slot,
            proposer_index,
            parent_root,
            state_root,
            body_root,
        })
    }
}

impl SszWrite for BlockHeader {
    fn write_fixed(&self, bytes: &mut [u8]) {
        self.slot.write_fixed(&mut bytes[0..8]);
        self.proposer_index.write_fixed(&mut bytes[8..16]);
        self.parent_root.write_fixed(&mut bytes[16..48]);
        self.state_root.write_fixed(&mut bytes[48..80]);
        self.body_root.write_fixed(&mut bytes[80..112]);
    }
}

impl SszHash for BlockHeader {
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256 {
        MerkleTree::merkleize_chunks(
            [
                self.slot.hash_tree_root(),
                self.proposer_index.hash_tree_root(),
                self.parent_root.hash_tree_root(),
                self.state_root.hash_tree_root(),
                self.body_root.hash_tree_root(),
            ],
            depth_for_chunks(5),
        )
    }
}

impl SszSize for BlockBody {
    const SIZE: Size = Size::Variable {
        minimum_size: BLOCK_BODY_FIXED_PART,
    };
}

impl SszRead for BlockBody {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let attestations_offset = read_offset(bytes, 0)?;

        if attestations_offset != BLOCK_BODY_FIXED_PART {
            return Err(ReadError::ContainerFirstOffsetMismatch {
                expected: BLOCK_BODY_FIXED_PART,
                actual: attestations_offset,
            });
        }

        let attestations =
            Attestations::from_ssz(subslice(bytes, attestations_offset..bytes.len())?)?;

        Ok(Self { attestations })
    }
}

impl SszWrite for BlockBody {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let length_before = bytes.len();

        bytes.resize(length_before + BLOCK_BODY_FIXED_PART, 0);

        let attestations_offset = bytes.len() - length_before;
        write_offset(bytes, length_before, attestations_offset)?;
        self.attestations.write_variable(bytes)?;

        Ok(())
    }
}

impl SszHash for BlockBody {
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256 {
        MerkleTree::merkleize_chunks([self.attestations.hash_tree_root()], depth_for_chunks(1))
    }
}

impl SszSize for Block {
    const SIZE: Size = Size::Variable {
        minimum_size: BLOCK_FIXED_PART + BLOCK_BODY_FIXED_PART,
    };
}

impl SszRead for Block {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let slot = Slot::from_ssz(subslice(bytes, 0..8)?)?;
        let proposer_index = ValidatorIndex::from_ssz(subslice(bytes, 8..16)?)?;
        let parent_root = H256::from_ssz(subslice(bytes, 16..48)?)?;
        let state_root = H256::from_ssz(subslice(bytes, 48..80)?)?;

        let body_offset = read_offset(bytes, 80)?;

        if body_offset != BLOCK_FIXED_PART {
            return Err(ReadError::ContainerFirstOffsetMismatch {
                expected: BLOCK_FIXED_PART,
                actual: body_offset,
            });
        }

        let body = BlockBody::from_ssz(subslice(bytes, body_offset..bytes.len())?)?;

        Ok(Self {
            slot,
            proposer_index,
            parent_root,
            state_root,
            body,
        })
    }
}

impl SszWrite for Block {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let length_before = bytes.len();

        bytes.resize(length_before + BLOCK_FIXED_PART, 0);

        let fixed_part = &mut bytes[length_before..];
        self.slot.write_fixed(&mut fixed_part[0..8]);
        self.proposer_index.write_fixed(&mut fixed_part[8..16]);
        self.parent_root.write_fixed(&mut fixed_part[16..48]);
        self.state_root.write_fixed(&mut fixed_part[48..80]);

        let body_offset = bytes.len() - length_before;
        write_offset(bytes, length_before + 80, body_offset)?;
        self.body.write_variable(bytes)?;

        Ok(())
    }
}

impl SszHash for Block {
    const PACKING_FACTOR: usize = 1;

    // Matches the root of the corresponding `BlockHeader`. The body occupies a
    // single chunk in both, as `body_root` there and as the body's own root here.
    fn hash_tree_root(&self) -> H256 {
        MerkleTree::merkleize_chunks(
            [
                self.slot.hash_tree_root(),
                self.proposer_index.hash_tree_root(),
                self.parent_root.hash_tree_root(),
                self.state_root.hash_tree_root(),
                self.body.hash_tree_root(),
            ],
            depth_for_chunks(5),
        )
    }
}

impl SszSize for BlockWithAttestation {
    const SIZE: Size = Size::Variable {
        minimum_size: BLOCK_WITH_ATTESTATION_FIXED_PART + BLOCK_FIXED_PART + BLOCK_BODY_FIXED_PART,
    };
}

impl SszRead for BlockWithAttestation {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let block_offset = read_offset(bytes, 0)?;

        if block_offset != BLOCK_WITH_ATTESTATION_FIXED_PART {
            return Err(ReadError::ContainerFirstOffsetMismatch {
                expected: BLOCK_WITH_ATTESTATION_FIXED_PART,
                actual: block_offset,
            });
        }

        let proposer_attestation = Attestation::from_ssz(subslice(bytes, 4..140)?)?;
        let block = Block::from_ssz(subslice(bytes, block_offset..bytes.len())?)?;

        Ok(Self {
            block,
            proposer_attestation,
        })
    }
}

impl SszWrite for BlockWithAttestation {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let length_before = bytes.len();

        bytes.resize(length_before + BLOCK_WITH_ATTESTATION_FIXED_PART, 0);

        self.proposer_attestation
            .write_fixed(&mut bytes[length_before + 4..length_before + 140]);

        let block_offset = bytes.len() - length_before;
        write_offset(bytes, length_before, block_offset)?;
        self.block.write_variable(bytes)?;

        Ok(())
    }
}

impl SszHash for BlockWithAttestation {
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256 {
        MerkleTree::merkleize_chunks(
            [
                self.block.hash_tree_root(),
                self.proposer_attestation.hash_tree_root(),
            ],
            depth_for_chunks(2),
        )
    }
}

impl SszSize for SignedBlockWithAttestation {
    const SIZE: Size = Size::Variable {
        minimum_size: SIGNED_BLOCK_FIXED_PART
            + BLOCK_WITH_ATTESTATION_FIXED_PART
            + BLOCK_FIXED_PART
            + BLOCK_BODY_FIXED_PART,
    };
}

impl SszRead for SignedBlockWithAttestation {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let message_offset = read_offset(bytes, 0)?;

        if message_offset != SIGNED_BLOCK_FIXED_PART {
            return Err(ReadError::ContainerFirstOffsetMismatch {
                expected: SIGNED_BLOCK_FIXED_PART,
                actual: message_offset,
            });
        }

        let signatures_offset = read_offset(bytes, 4)?;

        let message =
            BlockWithAttestation::from_ssz(subslice(bytes, message_offset..signatures_offset)?)?;
        let signatures =
            AttestationSignatures::from_ssz(subslice(bytes, signatures_offset..bytes.len())?)?;

        // The proposer signature is always last, after one signature per body
        // attestation. A mismatched count is invalid on the wire.
        if signatures.len() != message.block.body.attestations.len() + 1 {
            return Err(ReadError::Custom {
                message: "signature count does not match body attestation count plus proposer",
            });
        }

        Ok(Self {
            message,
            signatures,
        })
    }
}

impl SszWrite for SignedBlockWithAttestation {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let length_before = bytes.len();

        bytes.resize(length_before + SIGNED_BLOCK_FIXED_PART, 0);

        let message_offset = bytes.len() - length_before;
        write_offset(bytes, length_before, message_offset)?;
        self.message.write_variable(bytes)?;

        let signatures_offset = bytes.len() - length_before;
        write_offset(bytes, length_before + 4, signatures_offset)?;
        self.signatures.write_variable(bytes)?;

        Ok(())
    }
}

impl SszHash for SignedBlockWithAttestation {
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256 {
        MerkleTree::merkleize_chunks(
            [
                self.message.hash_tree_root(),
                self.signatures.hash_tree_root(),
            ],
            depth_for_chunks(2),
        )
    }
}

impl SszSize for State {
    const SIZE: Size = Size::Variable {
        // Two of the variable fields are bit lists, which take at least one
        // byte each even when empty.
        minimum_size: STATE_FIXED_PART + 2,
    };
}

impl SszRead for State {
    fn from_ssz_unchecked(bytes: &[u8]) -> Result<Self, ReadError> {
        let config = Config::from_ssz(subslice(bytes, 0..8)?)?;
        let slot = Slot::from_ssz(subslice(bytes, 8..16)?)?;
        let latest_block_header = BlockHeader::from_ssz(subslice(bytes, 16..128)?)?;
        let latest_justified = Checkpoint::from_ssz(subslice(bytes, 128..168)?)?;
        let latest_finalized = Checkpoint::from_ssz(subslice(bytes, 168..208)?)?;

        let historical_block_hashes_offset = read_offset(bytes, 208)?;
        let justified_slots_offset = read_offset(bytes, 212)?;
        let validators_offset = read_offset(bytes, 216)?;
        let justification_roots_offset = read_offset(bytes, 220)?;
        let justification_validators_offset = read_offset(bytes, 224)?;

        if historical_block_hashes_offset != STATE_FIXED_PART {
            return Err(ReadError::ContainerFirstOffsetMismatch {
                expected: STATE_FIXED_PART,
                actual: historical_block_hashes_offset,
            });
        }

        let historical_block_hashes = HistoricalRoots::from_ssz(subslice(
            bytes,
            historical_block_hashes_offset..justified_slots_offset,
        )?)?;

        let justified_slots =
            JustifiedSlots::from_ssz(subslice(bytes, justified_slots_offset..validators_offset)?)?;

        let validators =
            Validators::from_ssz(subslice(bytes, validators_offset..justification_roots_offset)?)?;

        let justification_roots = JustificationRoots::from_ssz(subslice(
            bytes,
            justification_roots_offset..justification_validators_offset,
        )?)?;

        let justification_validators = JustificationValidators::from_ssz(subslice(
            bytes,
            justification_validators_offset..bytes.len(),
        )?)?;

        Ok(Self {
            config,
            slot,
            latest_block_header,
            latest_justified,
            latest_finalized,
            historical_block_hashes,
            justified_slots,
            validators,
            justification_roots,
            justification_validators,
        })
    }
}

impl SszWrite for State {
    fn write_variable(&self, bytes: &mut Vec<u8>) -> Result<(), WriteError> {
        let length_before = bytes.len();

        bytes.resize(length_before + STATE_FIXED_PART, 0);

        let fixed_part = &mut bytes[length_before..];
        self.config.write_fixed(&mut fixed_part[0..8]);
        self.slot.write_fixed(&mut fixed_part[8..16]);
        self.latest_block_header.write_fixed(&mut fixed_part[16..128]);
        self.latest_justified.write_fixed(&mut fixed_part[128..168]);
        self.latest_finalized.write_fixed(&mut fixed_part[168..208]);

        let mut offset = bytes.len() - length_before;
        write_offset(bytes, length_before + 208, offset)?;
        self.historical_block_hashes.write_variable(bytes)?;

        offset = bytes.len() - length_before;
        write_offset(bytes, length_before + 212, offset)?;
        self.justified_slots.write_variable(bytes)?;

        offset = bytes.len() - length_before;
        write_offset(bytes, length_before + 216, offset)?;
        self.validators.write_variable(bytes)?;

        offset = bytes.len() - length_before;
        write_offset(bytes, length_before + 220, offset)?;
        self.justification_roots.write_variable(bytes)?;

        offset = bytes.len() - length_before;
        write_offset(bytes, length_before + 224, offset)?;
        self.justification_validators.write_variable(bytes)?;

        Ok(())
    }
}

impl SszHash for State {
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256 {
        MerkleTree::merkleize_chunks(
            [
                self.config.hash_tree_root(),
                self.slot.hash_tree_root(),
                self.latest_block_header.hash_tree_root(),
                self.latest_justified.hash_tree_root(),
                self.latest_finalized.hash_tree_root(),
                self.historical_block_hashes.hash_tree_root(),
                self.justified_slots.hash_tree_root(),
                self.validators.hash_tree_root(),
                self.justification_roots.hash_tree_root(),
                self.justification_validators.hash_tree_root(),
            ],
            depth_for_chunks(10),
        )
    }
}
