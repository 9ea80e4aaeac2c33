//! Binary Merkle tree over [`Digest`] leaves.
//!
//! Adjacent nodes are paired level by level. An unpaired trailing node is
//! paired with itself. The root of a single leaf is that leaf; the root of
//! no leaves is [`empty_root`].
//!
//! Proofs record a sibling only at levels where one exists. A verifier that
//! knows the leaf count can tell which levels those are, so
//! [`verify_merkle_proof`] takes `leaf_count` and duplicates the running node
//! at the levels where it was the unpaired trailing node.

use serde::{Deserialize, Serialize};

use crate::crypto::Digest;

/// Domain separation prefix for interior nodes.
pub const NODE_DOMAIN: &[u8] = b"ede/merkle-node/v1";

/// Seed of the empty-tree sentinel root.
pub const EMPTY_SEED: &[u8] = b"ede/merkle-empty/v1";

/// Root of a tree with no leaves.
pub fn empty_root() -> Digest {
    Digest::hash(EMPTY_SEED)
}

/// Hash two child nodes.
pub fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(NODE_DOMAIN);
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    Digest(*hasher.finalize().as_bytes())
}

/// A fully materialized Merkle tree, leaves first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    /// The root hash.
    pub fn root(&self) -> Digest {
        match self.levels.last().and_then(|level| level.first()) {
            Some(root) => *root,
            None => empty_root(),
        }
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// All levels, leaves first, root last.
    pub fn levels(&self) -> &[Vec<Digest>] {
        &self.levels
    }
}

/// Build a tree from `leaves`.
pub fn build_merkle_tree(leaves: &[Digest]) -> MerkleTree {
    if leaves.is_empty() {
        return MerkleTree { levels: Vec::new() };
    }

    let mut levels = vec![leaves.to_vec()];
    while let Some(level) = levels.last() {
        if level.len() <= 1 {
            break;
        }
        let next = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                hash_pair(left, pair.get(1).unwrap_or(left))
            })
            .collect();
        levels.push(next);
    }

    MerkleTree { levels }
}

/// Root of the tree over `leaves`.
pub fn merkle_root(leaves: &[Digest]) -> Digest {
    build_merkle_tree(leaves).root()
}

/// An inclusion proof for one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub root: Digest,
    /// Sibling hashes from leaf to root, present levels only.
    pub path: Vec<Digest>,
    pub index: u64,
    pub leaf: Digest,
    pub leaf_count: u64,
}

impl MerkleProof {
    /// Recompute the root from this proof.
    pub fn verify(&self) -> bool {
        verify_merkle_proof(&self.root, &self.leaf, &self.path, self.index, self.leaf_count)
    }
}

/// Root and sibling path for the leaf at `index`. `None` if out of range.
pub fn generate_merkle_proof(leaves: &[Digest], index: usize) -> Option<MerkleProof> {
    let leaf = *leaves.get(index)?;
    let tree = build_merkle_tree(leaves);

    let mut path = Vec::new();
    let mut idx = index;
    for level in tree.levels.iter().take(tree.levels.len().saturating_sub(1)) {
        if let Some(sibling) = level.get(idx ^ 1) {
            path.push(*sibling);
        }
        idx /= 2;
    }

    Some(MerkleProof {
        root: tree.root(),
        path,
        index: index as u64,
        leaf,
        leaf_count: leaves.len() as u64,
    })
}

/// Check that `leaf` sits at `index` of a `leaf_count`-leaf tree with `root`.
///
/// Never panics; any malformed input is `false`.
pub fn verify_merkle_proof(
    root: &Digest,
    leaf: &Digest,
    path: &[Digest],
    index: u64,
    leaf_count: u64,
) -> bool {
    if index >= leaf_count {
        return false;
    }

    let mut node = *leaf;
    let mut idx = index;
    let mut width = leaf_count;
    let mut siblings = path.iter();

    while width > 1 {
        node = if idx % 2 == 1 {
            match siblings.next() {
                Some(sibling) => hash_pair(sibling, &node),
                None => return false,
            }
        } else if idx + 1 < width {
            match siblings.next() {
                Some(sibling) => hash_pair(&node, sibling),
                None => return false,
            }
        } else {
            hash_pair(&node, &node)
        };
        idx /= 2;
        width = width.div_ceil(2);
    }

    siblings.next().is_none() && node == *root
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn leaves(n: usize) -> Vec<Digest> {
        (0..n).map(|i| Digest::hash(&(i as u64).to_be_bytes())).collect()
    }

    #[test]
    fn test_empty_and_single_roots() {
        assert_eq!(merkle_root(&[]), empty_root());
        let one = leaves(1);
        assert_eq!(merkle_root(&one), one[0]);
    }

    #[test]
    fn test_odd_level_duplicates_last_leaf() {
        let l = leaves(3);
        let expected = hash_pair(&hash_pair(&l[0], &l[1]), &hash_pair(&l[2], &l[2]));
        assert_eq!(merkle_root(&l), expected);
    }

    #[test]
    fn test_every_proof_verifies() {
        for n in 1..=9 {
            let l = leaves(n);
            for i in 0..n {
                let proof = generate_merkle_proof(&l, i).unwrap();
                assert!(proof.verify(), "n={n} i={i}");
            }
        }
    }

    #[test]
    fn test_unpaired_leaf_omits_sibling() {
        let l = leaves(5);
        let proof = generate_merkle_proof(&l, 4).unwrap();
        // Levels: 5 -> 3 -> 2 -> 1. Leaf 4 is unpaired at the first two.
        assert_eq!(proof.path.len(), 1);
        assert!(proof.verify());
    }

    #[test]
    fn test_wrong_leaf_or_index_fails() {
        let l = leaves(6);
        let proof = generate_merkle_proof(&l, 2).unwrap();

        assert!(!verify_merkle_proof(&proof.root, &l[3], &proof.path, 2, 6));
        assert!(!verify_merkle_proof(&proof.root, &l[2], &proof.path, 3, 6));
        assert!(!verify_merkle_proof(&proof.root, &l[2], &proof.path, 6, 6));
        assert!(!verify_merkle_proof(&proof.root, &l[2], &proof.path[1..], 2, 6));
    }

    #[test]
    fn test_out_of_range_index() {
        assert!(generate_merkle_proof(&leaves(3), 3).is_none());
        assert!(generate_merkle_proof(&[], 0).is_none());
    }

    proptest! {
        #[test]
        fn test_generated_proofs_verify(n in 1usize..64, pick in any::<prop::sample::Index>()) {
            let l = leaves(n);
            let i = pick.index(n);
            let proof = generate_merkle_proof(&l, i).unwrap();
            prop_assert!(proof.verify());
            prop_assert_eq!(proof.root, merkle_root(&l));
        }
    }
}
