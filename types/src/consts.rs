use typenum::{U1073741824, U262144, U4096};

use crate::primitives::Slot;

pub const GENESIS_SLOT: Slot = 0;

/// 4-second block times.
pub const SECONDS_PER_SLOT: u64 = 4;
/// Propose, vote, safe-target and accept phases within a slot.
pub const INTERVALS_PER_SLOT: u64 = 4;
pub const SECONDS_PER_INTERVAL: u64 = SECONDS_PER_SLOT / INTERVALS_PER_SLOT;
/// Used by gossip layers to size their deduplication windows.
pub const JUSTIFICATION_LOOKBACK_SLOTS: u64 = 3;

// 2^18
pub type HistoricalRootsLimit = U262144;
// 2^12
pub type ValidatorRegistryLimit = U4096;
// 2^30, the flattened justification bit matrix:
// `HistoricalRootsLimit` rows of `ValidatorRegistryLimit` columns.
pub type JustificationBitsLimit = U1073741824;
