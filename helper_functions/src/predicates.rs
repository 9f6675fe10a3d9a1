use types::primitives::Slot;

/// Whether `candidate` may become a justification target once `finalized` is
/// the latest finalized slot.
///
/// A candidate qualifies when its distance from the finalized slot is at most
/// 5, a perfect square, or pronic (`x·(x+1)`). Slots that fail the predicate
/// funnel votes onto a sparser ladder of candidates so the chain can heal
/// toward finalization after long gaps.
#[must_use]
pub fn is_justifiable_after(candidate: Slot, finalized: Slot) -> bool {
    if candidate < finalized {
        return false;
    }

    let delta = candidate - finalized;

    if delta <= 5 {
        return true;
    }

    let root = delta.isqrt();

    root * root == delta || root * (root + 1) == delta
}
