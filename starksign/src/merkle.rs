//! Pedersen Merkle trees, backing the `merkletree` field type.
//!
//! Nodes hash their children sorted (`H(min, max)`) and odd levels are
//! padded with a zero sibling, so the root is independent of sibling
//! orientation.

use thiserror::Error;

use starksign_crypto::{pedersen_hash, Felt};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MerkleTreeError {
    #[error("cannot build a merkle tree from empty leaves")]
    EmptyLeaves,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    pub root_hash: Felt,
    pub leaves: Vec<Felt>,
}

impl MerkleTree {
    pub fn new(leaves: Vec<Felt>) -> Result<Self, MerkleTreeError> {
        if leaves.is_empty() {
            return Err(MerkleTreeError::EmptyLeaves);
        }
        let root_hash = build_root(&leaves);
        Ok(Self { root_hash, leaves })
    }
}

fn build_root(leaves: &[Felt]) -> Felt {
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let a = pair[0];
                let b = pair.get(1).copied().unwrap_or(Felt::ZERO);
                hash_sorted_pair(a, b)
            })
            .collect();
    }
    level[0]
}

/// The smaller element always hashes first.
fn hash_sorted_pair(a: Felt, b: Felt) -> Felt {
    if a <= b {
        pedersen_hash(&a, &b)
    } else {
        pedersen_hash(&b, &a)
    }
}
