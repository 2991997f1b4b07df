use std::cmp::Ordering;

use ember_chain::hash::Hash256;
use ember_chain::transaction::Transaction;

/// A transaction held in the mempool, plus the metadata computed once at
/// admission time (spec.md §4.6).
#[derive(Debug, Clone)]
pub struct Entry {
    pub tx: Transaction,
    pub txid: Hash256,
    pub fee: u64,
    pub size: usize,
    pub time_added: u64,
}

impl Entry {
    /// `fee_sats / size_bytes`, truncating. Used only for display/reporting;
    /// ordering decisions go through [`FeeRateKey`], which compares the
    /// untruncated fraction.
    pub fn fee_rate(&self) -> u64 {
        if self.size == 0 {
            return u64::MAX;
        }
        self.fee / self.size as u64
    }
}

/// Orders entries by fee rate (`fee / size`) ascending, breaking ties by
/// `time_added` ascending and then `txid` (spec.md §4.6: "ordered multiset
/// of Entry keyed descending by fee_rate, breaking ties by time_added
/// ascending"). The low end of a `BTreeSet<FeeRateKey>` is the eviction
/// candidate; the high end, iterated in reverse, is mining-template order.
///
/// Comparison cross-multiplies (`fee_a * size_b` vs `fee_b * size_a`)
/// instead of truncating each side to a `u64` ratio first — the original
/// implementation this is grounded on used two different truncated
/// formulas in its admission and eviction paths, which spec.md §9 calls
/// out as a bug this design does not carry forward.
#[derive(Debug, Clone, Copy)]
pub struct FeeRateKey {
    pub fee: u64,
    pub size: usize,
    pub time_added: u64,
    pub txid: Hash256,
}

impl FeeRateKey {
    pub fn of(entry: &Entry) -> Self {
        FeeRateKey {
            fee: entry.fee,
            size: entry.size,
            time_added: entry.time_added,
            txid: entry.txid,
        }
    }

    /// `self.fee_rate() < other.fee_rate()`, without truncating either side.
    pub fn rate_less_than(&self, other: &FeeRateKey) -> bool {
        (self.fee as u128) * (other.size as u128) < (other.fee as u128) * (self.size as u128)
    }

    fn rate_cmp(&self, other: &FeeRateKey) -> Ordering {
        let lhs = (self.fee as u128) * (other.size as u128);
        let rhs = (other.fee as u128) * (self.size as u128);
        lhs.cmp(&rhs)
    }
}

impl PartialEq for FeeRateKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for FeeRateKey {}

impl PartialOrd for FeeRateKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FeeRateKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rate_cmp(other)
            .then_with(|| self.time_added.cmp(&other.time_added))
            .then_with(|| self.txid.cmp(&other.txid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_multiplication_avoids_truncation_ties() {
        // 999/1000 and 1/1 both truncate to 0 under naive integer division,
        // but 999/1000 < 1/1 is the correct ordering.
        let low = FeeRateKey {
            fee: 999,
            size: 1000,
            time_added: 0,
            txid: Hash256::zero(),
        };
        let high = FeeRateKey {
            fee: 1,
            size: 1,
            time_added: 0,
            txid: Hash256::of(b"b"),
        };
        assert!(low.rate_less_than(&high));
        assert!(low < high);
    }

    #[test]
    fn ties_break_on_time_added_then_txid() {
        let a = FeeRateKey {
            fee: 10,
            size: 10,
            time_added: 5,
            txid: Hash256::of(b"a"),
        };
        let b = FeeRateKey {
            fee: 20,
            size: 20,
            time_added: 1,
            txid: Hash256::of(b"b"),
        };
        assert!(b < a);
    }
}
