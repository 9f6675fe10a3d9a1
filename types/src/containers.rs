use serde::{Deserialize, Serialize};

use crate::{
    collections::{Attestations, AttestationSignatures},
    primitives::{PublicKeyBytes, SignatureBytes, Slot, ValidatorIndex, H256},
};

// Field order is load-bearing in every container below.
// It determines both the canonical encoding and the Merkle root.

/// A block at a slot, as referenced by justification and finalization votes.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug, Deserialize, Serialize,
)]
#[serde(deny_unknown_fields)]
pub struct Checkpoint {
    pub root: H256,
    pub slot: Slot,
}

/// Immutable chain configuration.
///
/// The validator count is deliberately not part of this. It is derived from
/// the length of the validator registry in the state.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub genesis_time: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Validator {
    pub pubkey: PublicKeyBytes,
    pub index: ValidatorIndex,
}

/// A validator's view of the chain: the head it follows and the
/// source → target justification link it votes for.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AttestationData {
    pub slot: Slot,
    pub head: Checkpoint,
    pub target: Checkpoint,
    pub source: Checkpoint,
}

/// Attestation data bound to the attesting validator.
///
/// Kept separate from [`AttestationData`] so that several validators can
/// attest to identical data.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Attestation {
    pub validator_id: u64,
    pub data: AttestationData,
}

/// The gossip envelope for a single attestation.
#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SignedAttestation {
    pub message: Attestation,
    pub signature: SignatureBytes,
}

/// The fixed-size summary of a block used for parent linking.
///
/// `state_root` is zero right after header processing and is filled in by the
/// next slot advance, so blocks can reference their parent's post-state root
/// without a forward dependency.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlockHeader {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub state_root: H256,
    pub body_root: H256,
}

/// The variable-length block contents. Attestations here are unsigned; their
/// signatures travel in the [`SignedBlockWithAttestation`] envelope.
#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlockBody {
    pub attestations: Attestations,
}

#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub state_root: H256,
    pub body: BlockBody,
}

/// A block bundled with the proposer's own attestation.
///
/// The proposer attestation stays outside the body because it is processed
/// with gossip semantics rather than on-chain semantics. The producer does
/// not count it against its own block.
#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlockWithAttestation {
    pub block: Block,
    pub proposer_attestation: Attestation,
}

/// The top-level block envelope on the network.
///
/// `signatures` contains one entry per body attestation followed by the
/// proposer's signature, so its length is `len(body.attestations) + 1`.
/// Decoding rejects envelopes that break this.
#[derive(Clone, PartialEq, Eq, Default, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SignedBlockWithAttestation {
    pub message: BlockWithAttestation,
    pub signatures: AttestationSignatures,
}

impl Attestation {
    /// Wraps the attestation in its gossip envelope.
    #[inline]
    #[must_use]
    pub const fn with_signature(self, signature: SignatureBytes) -> SignedAttestation {
        SignedAttestation {
            message: self,
            signature,
        }
    }
}
