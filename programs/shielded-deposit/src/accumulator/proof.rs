//! Membership proofs

use anchor_lang::prelude::*;

use crate::crypto::poseidon::hash_children;
use crate::error::DepositError;

/// One level of an authentication path.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PathLevel {
    /// Position of the path node among its `arity` siblings (0 = leftmost)
    pub position: u8,
    /// The other `arity - 1` children, left to right
    pub siblings: Vec<[u8; 32]>,
}

impl PathLevel {
    /// Parent hash with `node` placed at `position`.
    pub fn hash_with(&self, node: [u8; 32]) -> Result<[u8; 32]> {
        let position = self.position as usize;
        require!(position <= self.siblings.len(), DepositError::OutOfRange);

        let mut children = Vec::with_capacity(self.siblings.len() + 1);
        children.extend_from_slice(&self.siblings[..position]);
        children.push(node);
        children.extend_from_slice(&self.siblings[position..]);
        hash_children(&children)
    }
}

/// Fold `node` up a path, leaf side first.
pub fn fold_path(node: [u8; 32], path: &[PathLevel]) -> Result<[u8; 32]> {
    path.iter().try_fold(node, |current, level| level.hash_with(current))
}

/// Index spelled by the positions of an `arity`-ary path, leaf side first.
///
/// `None` if any level has the wrong sibling count or an out-of-range
/// position.
pub fn path_index(path: &[PathLevel], arity: u8) -> Option<u64> {
    path.iter().rev().try_fold(0u64, |index, level| {
        if level.siblings.len() + 1 != arity as usize || level.position >= arity {
            return None;
        }
        index
            .checked_mul(arity as u64)?
            .checked_add(level.position as u64)
    })
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct MembershipProof {
    pub leaf: [u8; 32],
    pub index: u64,
    /// Leaf to root
    pub path: Vec<PathLevel>,
    /// Root the proof was generated against
    pub root: [u8; 32],
}

impl MembershipProof {
    pub fn compute_root(&self) -> Result<[u8; 32]> {
        fold_path(self.leaf, &self.path)
    }

    /// The path must lead to `index` and hash up to `root`.
    pub fn verify(&self, root: &[u8; 32]) -> bool {
        self.path_index() == Some(self.index)
            && self
                .compute_root()
                .map(|computed| computed == *root)
                .unwrap_or(false)
    }

    /// Leaf index implied by the path positions.
    pub fn path_index(&self) -> Option<u64> {
        let arity = self.path.first()?.siblings.len() + 1;
        path_index(&self.path, u8::try_from(arity).ok()?)
    }
}
