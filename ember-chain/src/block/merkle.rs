//! The Bitcoin-style transaction Merkle root (spec.md §3: "odd-count levels
//! duplicate the last hash").

use crate::hash::Hash256;

/// Compute the double-hashed binary Merkle root over `leaves`. An empty
/// leaf set roots to the zero hash; this only ever happens transiently
/// during block construction, never for a validated block (spec.md §3
/// requires a block to be non-empty).
pub fn root(leaves: &[Hash256]) -> Hash256 {
    if leaves.is_empty() {
        return Hash256::zero();
    }
    let mut level: Vec<Hash256> = leaves.to_vec();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            let last = *level.last().unwrap();
            level.push(last);
        }
        level = level
            .chunks_exact(2)
            .map(|pair| {
                let mut buf = [0u8; 64];
                buf[..32].copy_from_slice(pair[0].as_bytes());
                buf[32..].copy_from_slice(pair[1].as_bytes());
                Hash256::of(&buf)
            })
            .collect();
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_leaf_roots_to_itself() {
        let leaf = Hash256::of(b"only transaction");
        assert_eq!(root(&[leaf]), leaf);
    }

    #[test]
    fn odd_count_duplicates_last_leaf() {
        let a = Hash256::of(b"a");
        let b = Hash256::of(b"b");
        let c = Hash256::of(b"c");
        let three = root(&[a, b, c]);
        let four = root(&[a, b, c, c]);
        assert_eq!(three, four);
    }

    #[test]
    fn order_matters() {
        let a = Hash256::of(b"a");
        let b = Hash256::of(b"b");
        assert_ne!(root(&[a, b]), root(&[b, a]));
    }
}
