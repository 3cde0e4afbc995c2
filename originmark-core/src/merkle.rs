//! Merkle tree over content fingerprints.
//!
//! # Convention
//!
//! - Leaf hash: `SHA-256(0x00 || fingerprint)`
//! - Interior hash: `SHA-256(0x01 || left || right)`
//! - A level with an odd number of nodes pairs its last node with itself
//!   ("duplicate last node").
//!
//! A [`MerkleProof`] lists sibling hashes from the leaf level upward plus a
//! direction bitmap: bit `i` set means the running node is the *right* child
//! at level `i`, so the sibling is hashed on the left. Verification needs only
//! the proof, the leaf fingerprint and the root; the rest of the batch is not
//! required.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::hash::ContentFingerprint;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Deepest proof accepted; one bit of `path_bits` per level.
pub const MAX_PROOF_DEPTH: usize = 64;

/// A 32-byte node or root hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MerkleHash([u8; 32]);

impl MerkleHash {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Debug for MerkleHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MerkleHash({})", self.to_hex())
    }
}

impl fmt::Display for MerkleHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for MerkleHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for MerkleHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).ok_or_else(|| serde::de::Error::custom("expected 64 hex characters"))
    }
}

pub fn leaf_hash(fingerprint: &ContentFingerprint) -> MerkleHash {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(fingerprint.as_bytes());
    MerkleHash(hasher.finalize().into())
}

pub fn node_hash(left: &MerkleHash, right: &MerkleHash) -> MerkleHash {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left.0);
    hasher.update(right.0);
    MerkleHash(hasher.finalize().into())
}

/// Inclusion proof for one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Position of the leaf in the batch.
    pub leaf_index: u64,
    /// Number of leaves in the tree the proof was cut from.
    pub leaf_count: u64,
    /// Direction bitmap, bit `i` set = running node is the right child at level `i`.
    pub path_bits: u64,
    /// Sibling hashes, leaf level first.
    pub siblings: Vec<MerkleHash>,
}

/// Fully materialized tree. `levels[0]` holds leaf hashes, the last level the root.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<MerkleHash>>,
}

impl MerkleTree {
    /// Build a tree over `leaves` in order. Returns `None` for no leaves.
    pub fn build(leaves: &[ContentFingerprint]) -> Option<Self> {
        if leaves.is_empty() {
            return None;
        }

        let mut levels = vec![leaves.iter().map(leaf_hash).collect::<Vec<_>>()];
        while let Some(level) = levels.last().filter(|level| level.len() > 1) {
            let next = level
                .chunks(2)
                .map(|pair| node_hash(&pair[0], pair.get(1).unwrap_or(&pair[0])))
                .collect();
            levels.push(next);
        }
        Some(Self { levels })
    }

    pub fn root(&self) -> MerkleHash {
        // `build` never produces an empty tree.
        self.levels[self.levels.len() - 1][0]
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Sibling path for the leaf at `index`, or `None` if out of range.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaf_count() {
            return None;
        }

        let mut siblings = Vec::with_capacity(self.depth());
        let mut path_bits = 0u64;
        let mut idx = index;
        for (level_no, level) in self.levels[..self.depth()].iter().enumerate() {
            let sibling = if idx % 2 == 1 {
                path_bits |= 1 << level_no;
                level[idx - 1]
            } else {
                *level.get(idx + 1).unwrap_or(&level[idx])
            };
            siblings.push(sibling);
            idx /= 2;
        }

        Some(MerkleProof {
            leaf_index: index as u64,
            leaf_count: self.leaf_count() as u64,
            path_bits,
            siblings,
        })
    }
}

/// Depth of a tree over `leaf_count` leaves: the smallest `d` with `2^d >= leaf_count`.
fn tree_depth(leaf_count: u64) -> usize {
    (u64::BITS - leaf_count.saturating_sub(1).leading_zeros()) as usize
}

/// Recompute the root from `leaf` and `proof` and compare with `root`.
///
/// The proof's claimed position must be consistent with its path: the
/// index lies inside the tree, the direction bits spell out that index and
/// the sibling count equals the depth of a tree with `leaf_count` leaves.
/// `leaf_count` itself is taken from the proof; use
/// [`verify_anchored_inclusion`] when the anchored entry count is known.
pub fn verify_inclusion(leaf: &ContentFingerprint, proof: &MerkleProof, root: &MerkleHash) -> bool {
    let depth = proof.siblings.len();
    if depth > MAX_PROOF_DEPTH {
        return false;
    }
    if proof.leaf_count == 0 || proof.leaf_index >= proof.leaf_count {
        return false;
    }
    if depth != tree_depth(proof.leaf_count) {
        return false;
    }
    // Index < leaf_count <= 2^depth, so it already fits in `depth` bits.
    if proof.path_bits != proof.leaf_index {
        return false;
    }

    let computed = proof
        .siblings
        .iter()
        .enumerate()
        .fold(leaf_hash(leaf), |current, (level, sibling)| {
            if proof.path_bits & (1 << level) != 0 {
                node_hash(sibling, &current)
            } else {
                node_hash(&current, sibling)
            }
        });
    computed == *root
}

/// [`verify_inclusion`] against a root whose entry count was anchored
/// alongside it. A proof cut for a differently sized tree is rejected, so
/// the proven index names the same entry the anchor's registry holds.
pub fn verify_anchored_inclusion(
    leaf: &ContentFingerprint,
    proof: &MerkleProof,
    root: &MerkleHash,
    entry_count: u64,
) -> bool {
    proof.leaf_count == entry_count && verify_inclusion(leaf, proof, root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::fingerprint;

    fn leaves(n: usize) -> Vec<ContentFingerprint> {
        (0..n)
            .map(|i| fingerprint(format!("leaf-{i}").as_bytes()))
            .collect()
    }

    #[test]
    fn test_empty_tree_is_none() {
        assert!(MerkleTree::build(&[]).is_none());
    }

    #[test]
    fn test_single_leaf_root_is_leaf_hash() {
        let l = leaves(1);
        let tree = MerkleTree::build(&l).unwrap();
        assert_eq!(tree.root(), leaf_hash(&l[0]));
        let proof = tree.proof(0).unwrap();
        assert!(proof.siblings.is_empty());
        assert!(verify_inclusion(&l[0], &proof, &tree.root()));
    }

    #[test]
    fn test_two_leaf_root() {
        let l = leaves(2);
        let tree = MerkleTree::build(&l).unwrap();
        assert_eq!(
            tree.root(),
            node_hash(&leaf_hash(&l[0]), &leaf_hash(&l[1]))
        );
    }

    #[test]
    fn test_three_leaf_root_duplicates_last() {
        let l = leaves(3);
        let tree = MerkleTree::build(&l).unwrap();
        let (a, b, c) = (leaf_hash(&l[0]), leaf_hash(&l[1]), leaf_hash(&l[2]));
        let expected = node_hash(&node_hash(&a, &b), &node_hash(&c, &c));
        assert_eq!(tree.root(), expected);

        let proof = tree.proof(2).unwrap();
        assert_eq!(proof.siblings[0], c);
        assert_eq!(proof.path_bits, 0b10);
    }

    #[test]
    fn test_all_proofs_verify() {
        for n in [1usize, 2, 3, 4, 5, 7, 8, 17, 33] {
            let l = leaves(n);
            let tree = MerkleTree::build(&l).unwrap();
            for (i, leaf) in l.iter().enumerate() {
                let proof = tree.proof(i).unwrap();
                assert!(verify_inclusion(leaf, &proof, &tree.root()), "n={n} i={i}");
            }
            assert!(tree.proof(n).is_none());
        }
    }

    #[test]
    fn test_leaf_and_node_hashes_are_domain_separated() {
        let fp = fingerprint(b"x");
        let as_leaf = leaf_hash(&fp);
        let as_node = node_hash(&MerkleHash(*fp.as_bytes()), &MerkleHash(*fp.as_bytes()));
        assert_ne!(as_leaf, as_node);
    }

    #[test]
    fn test_proof_for_wrong_leaf_fails() {
        let l = leaves(8);
        let tree = MerkleTree::build(&l).unwrap();
        let proof = tree.proof(3).unwrap();
        assert!(!verify_inclusion(&l[4], &proof, &tree.root()));
    }

    #[test]
    fn test_tampered_proof_fails() {
        let l = leaves(5);
        let tree = MerkleTree::build(&l).unwrap();
        let mut proof = tree.proof(1).unwrap();
        proof.path_bits ^= 1;
        assert!(!verify_inclusion(&l[1], &proof, &tree.root()));

        let mut proof = tree.proof(1).unwrap();
        proof.siblings[1].0[0] ^= 0xFF;
        assert!(!verify_inclusion(&l[1], &proof, &tree.root()));

        let mut proof = tree.proof(1).unwrap();
        proof.path_bits |= 1 << 40;
        assert!(!verify_inclusion(&l[1], &proof, &tree.root()));
    }

    #[test]
    fn test_tree_depth() {
        let cases = [(1u64, 0usize), (2, 1), (3, 2), (4, 2), (5, 3), (17, 5), (1 << 63, 63), (u64::MAX, 64)];
        for (count, depth) in cases {
            assert_eq!(tree_depth(count), depth, "count={count}");
        }
        for n in [1usize, 2, 3, 5, 17, 33] {
            assert_eq!(MerkleTree::build(&leaves(n)).unwrap().depth(), tree_depth(n as u64));
        }
    }

    #[test]
    fn test_relabelled_index_rejected() {
        let l = leaves(3);
        let tree = MerkleTree::build(&l).unwrap();

        let mut proof = tree.proof(1).unwrap();
        proof.leaf_index = 2;
        assert!(!verify_inclusion(&l[1], &proof, &tree.root()));

        let mut proof = tree.proof(0).unwrap();
        proof.leaf_index = 1;
        assert!(!verify_inclusion(&l[0], &proof, &tree.root()));
    }

    #[test]
    fn test_duplicated_position_past_end_rejected() {
        let l = leaves(3);
        let tree = MerkleTree::build(&l).unwrap();

        // Leaf 2 is paired with itself, so index 3 reaches the same root.
        let mut proof = tree.proof(2).unwrap();
        proof.path_bits |= 1;
        proof.leaf_index = 3;
        assert!(!verify_inclusion(&l[2], &proof, &tree.root()));

        // Claiming a four-leaf tree makes the proof self-consistent; only
        // the anchored count rules it out.
        proof.leaf_count = 4;
        assert!(verify_inclusion(&l[2], &proof, &tree.root()));
        assert!(!verify_anchored_inclusion(&l[2], &proof, &tree.root(), 3));
    }

    #[test]
    fn test_anchored_inclusion() {
        let l = leaves(5);
        let tree = MerkleTree::build(&l).unwrap();
        for (i, leaf) in l.iter().enumerate() {
            let proof = tree.proof(i).unwrap();
            assert!(verify_anchored_inclusion(leaf, &proof, &tree.root(), 5));
            assert!(!verify_anchored_inclusion(leaf, &proof, &tree.root(), 6));
        }
    }

    #[test]
    fn test_sibling_count_must_match_leaf_count() {
        let l = leaves(4);
        let tree = MerkleTree::build(&l).unwrap();
        let mut proof = tree.proof(0).unwrap();
        proof.siblings.push(tree.root());
        assert!(!verify_inclusion(&l[0], &proof, &tree.root()));

        let mut proof = tree.proof(0).unwrap();
        proof.leaf_count = 0;
        proof.leaf_index = 0;
        assert!(!verify_inclusion(&l[0], &proof, &tree.root()));
    }

    #[test]
    fn test_oversized_proof_rejected() {
        let l = leaves(1);
        let proof = MerkleProof {
            leaf_index: 0,
            leaf_count: 1,
            path_bits: 0,
            siblings: vec![leaf_hash(&l[0]); MAX_PROOF_DEPTH + 1],
        };
        assert!(!verify_inclusion(&l[0], &proof, &leaf_hash(&l[0])));
    }

    #[test]
    fn test_proof_json_roundtrip() {
        let l = leaves(6);
        let tree = MerkleTree::build(&l).unwrap();
        let proof = tree.proof(5).unwrap();
        let json = serde_json::to_string(&proof).unwrap();
        let restored: MerkleProof = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, proof);
        assert!(verify_inclusion(&l[5], &restored, &tree.root()));
    }
}
