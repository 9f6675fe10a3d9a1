use ssz::{BitList, ContiguousList};

use crate::{
    consts::{HistoricalRootsLimit, JustificationBitsLimit, ValidatorRegistryLimit},
    containers::{Attestation, Validator},
    primitives::{SignatureBytes, H256},
};

pub type HistoricalRoots = ContiguousList<H256, HistoricalRootsLimit>;
pub type JustifiedSlots = BitList<HistoricalRootsLimit>;
pub type Validators = ContiguousList<Validator, ValidatorRegistryLimit>;
pub type JustificationRoots = ContiguousList<H256, HistoricalRootsLimit>;
pub type JustificationValidators = BitList<JustificationBitsLimit>;

pub type Attestations = ContiguousList<Attestation, ValidatorRegistryLimit>;
pub type AttestationSignatures = ContiguousList<SignatureBytes, ValidatorRegistryLimit>;
