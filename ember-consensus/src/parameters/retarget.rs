//! Difficulty retargeting (spec.md §4.8), grounded on the overall shape of
//! `original_source/include/intcoin/consensus.h`'s `DifficultyCalculator`
//! (interval, clamped actual-timespan ratio, PoW-limit clamp), reworked
//! into the `CompactDifficulty`/`ExpandedDifficulty` types this codec uses.

use ember_chain::parameters::{RETARGET_INTERVAL, TARGET_SPACING};
use ember_chain::work::difficulty::{CompactDifficulty, ExpandedDifficulty, MAX_POW_TARGET};
use primitive_types::{U256, U512};

/// The expected `bits` for the block at `height`, given its parent's
/// `bits` and (only consulted at retarget boundaries) the timestamps of
/// the first and last blocks of the interval that just closed.
///
/// Non-retarget blocks MUST carry the same `bits` as their parent
/// (spec.md §4.8); `first_timestamp`/`last_timestamp` being absent (e.g.
/// before enough history exists) also falls back to the parent's `bits`.
pub fn next_work_required(
    height: u32,
    prev_bits: CompactDifficulty,
    first_timestamp: Option<u64>,
    last_timestamp: Option<u64>,
) -> CompactDifficulty {
    if height % RETARGET_INTERVAL != 0 {
        return prev_bits;
    }
    let (Some(first), Some(last)) = (first_timestamp, last_timestamp) else {
        return prev_bits;
    };

    let target_timespan = RETARGET_INTERVAL as u64 * TARGET_SPACING;
    let actual_timespan = last.saturating_sub(first).clamp(target_timespan / 4, target_timespan * 4);

    let old_target = prev_bits.to_expanded().map(|t| t.0).unwrap_or_else(U256::zero);
    // `old_target * actual_timespan` can exceed 256 bits when old_target sits
    // near MAX_POW_TARGET, so the product is carried in U512 and only
    // truncated back to U256 after the division shrinks it.
    let product = old_target.full_mul(U256::from(actual_timespan));
    let new_target = product / U512::from(target_timespan);
    let new_target = U256::try_from(new_target).unwrap_or(U256::MAX);

    let max_target = MAX_POW_TARGET.to_expanded().expect("MAX_POW_TARGET is well-formed").0;
    ExpandedDifficulty(new_target.min(max_target)).to_compact()
}
