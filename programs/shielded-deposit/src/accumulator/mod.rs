//! Commitment Accumulator
//!
//! Fixed-arity, fixed-depth, append-only Merkle tree over note commitments.
//! This is the full (off-chain) form of the tree: every populated node is kept
//! in a flat per-level array so clients and the proving pipeline can build
//! membership proofs and batch subtree-update proofs. The on-chain
//! `CommitmentTree` account keeps only the frontier and must agree with this
//! tree's root for any leaf sequence.
//!
//! # Layout
//! `levels[0]` holds the leaves, `levels[depth]` the root. Each level stores
//! only the populated prefix; a missing node is the root of an empty subtree
//! at that level (`zeros[level]`).

pub mod batch;
pub mod proof;

use anchor_lang::prelude::*;

use crate::crypto::poseidon::{hash_children, is_field_element, zero_values, MAX_POSEIDON_INPUTS};
use crate::error::DepositError;

pub use batch::BatchProof;
pub use proof::{MembershipProof, PathLevel};

/// Minimum supported branching factor
pub const MIN_TREE_ARITY: u8 = 2;

/// Maximum supported branching factor (Poseidon width limit)
pub const MAX_TREE_ARITY: u8 = MAX_POSEIDON_INPUTS as u8;

/// Minimum supported tree depth
pub const MIN_TREE_DEPTH: u8 = 1;

/// Maximum supported tree depth
pub const MAX_TREE_DEPTH: u8 = 32;

/// Validate a tree shape and return its capacity (`arity^depth`).
pub fn tree_capacity(arity: u8, depth: u8) -> Result<u64> {
    require!(
        (MIN_TREE_ARITY..=MAX_TREE_ARITY).contains(&arity),
        DepositError::InvalidTreeArity
    );
    require!(
        (MIN_TREE_DEPTH..=MAX_TREE_DEPTH).contains(&depth),
        DepositError::InvalidTreeDepth
    );
    (arity as u64)
        .checked_pow(depth as u32)
        .ok_or(error!(DepositError::InvalidTreeDepth))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitmentAccumulator {
    arity: u8,
    depth: u8,
    capacity: u64,
    zeros: Vec<[u8; 32]>,
    levels: Vec<Vec<[u8; 32]>>,
}

impl CommitmentAccumulator {
    pub fn new(arity: u8, depth: u8) -> Result<Self> {
        let capacity = tree_capacity(arity, depth)?;
        Ok(Self {
            arity,
            depth,
            capacity,
            zeros: zero_values(arity, depth)?,
            levels: vec![Vec::new(); depth as usize + 1],
        })
    }

    /// Build a tree holding `leaves` in order.
    pub fn from_leaves(arity: u8, depth: u8, leaves: &[[u8; 32]]) -> Result<Self> {
        let mut tree = Self::new(arity, depth)?;
        for leaf in leaves {
            tree.append(*leaf)?;
        }
        Ok(tree)
    }

    pub fn arity(&self) -> u8 {
        self.arity
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Number of appended leaves (the next leaf index).
    pub fn len(&self) -> u64 {
        self.levels[0].len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn root(&self) -> [u8; 32] {
        self.node(self.depth as usize, 0)
    }

    pub fn leaves(&self) -> &[[u8; 32]] {
        &self.levels[0]
    }

    pub fn leaf(&self, index: u64) -> Option<[u8; 32]> {
        self.levels[0].get(index as usize).copied()
    }

    /// Empty-subtree roots, `zeros[0]` being the zero leaf.
    pub fn zero_values(&self) -> &[[u8; 32]] {
        &self.zeros
    }

    /// Node at `level`, `index`; unpopulated nodes are empty-subtree roots.
    pub fn node(&self, level: usize, index: u64) -> [u8; 32] {
        self.levels[level]
            .get(index as usize)
            .copied()
            .unwrap_or(self.zeros[level])
    }

    /// Append a leaf and return its index.
    ///
    /// Only the `depth` ancestors of the new leaf are rehashed. They are
    /// computed into a scratch path before anything is written.
    pub fn append(&mut self, leaf: [u8; 32]) -> Result<u64> {
        require!(!self.is_full(), DepositError::Full);
        require!(is_field_element(&leaf), DepositError::InvalidLeaf);

        let arity = self.arity as u64;
        let index = self.len();
        let mut ancestors = Vec::with_capacity(self.depth as usize);
        let mut current = leaf;
        let mut position = index;

        for level in 0..self.depth as usize {
            let first = position - position % arity;
            let children: Vec<[u8; 32]> = (first..first + arity)
                .map(|i| if i == position { current } else { self.node(level, i) })
                .collect();
            current = hash_children(&children)?;
            position /= arity;
            ancestors.push(current);
        }

        self.levels[0].push(leaf);
        let mut position = index;
        for (level, hash) in ancestors.into_iter().enumerate() {
            position /= arity;
            let nodes = &mut self.levels[level + 1];
            if (position as usize) < nodes.len() {
                nodes[position as usize] = hash;
            } else {
                nodes.push(hash);
            }
        }

        Ok(index)
    }

    /// Membership proof for the leaf at `index` against the current root.
    pub fn proof(&self, index: u64) -> Result<MembershipProof> {
        require!(index < self.len(), DepositError::OutOfRange);
        Ok(MembershipProof {
            leaf: self.levels[0][index as usize],
            index,
            path: self.path_from(0, index),
            root: self.root(),
        })
    }

    /// Siblings from the node at (`level`, `index`) up to the root.
    pub(crate) fn path_from(&self, level: usize, index: u64) -> Vec<PathLevel> {
        let arity = self.arity as u64;
        let mut position = index;
        let mut path = Vec::with_capacity(self.depth as usize - level);

        for level in level..self.depth as usize {
            let offset = position % arity;
            let first = position - offset;
            let siblings = (first..first + arity)
                .filter(|&i| i != position)
                .map(|i| self.node(level, i))
                .collect();
            path.push(PathLevel {
                position: offset as u8,
                siblings,
            });
            position /= arity;
        }

        path
    }

    /// The tree as it was after the first `len` leaves.
    pub fn snapshot(&self, len: u64) -> Result<Self> {
        require!(len <= self.len(), DepositError::OutOfRange);
        Self::from_leaves(self.arity, self.depth, &self.levels[0][..len as usize])
    }

    /// Level whose nodes cover exactly `batch_size` leaves.
    pub fn subtree_level(&self, batch_size: u64) -> Option<usize> {
        let mut covered = 1u64;
        for level in 0..=self.depth as usize {
            if covered == batch_size {
                return Some(level);
            }
            covered = covered.checked_mul(self.arity as u64)?;
        }
        None
    }

    /// Transition proof for the batch `[start, start + batch_size)`.
    pub fn batch_proof(&self, start: u64, batch_size: u64) -> Result<BatchProof> {
        require!(
            self.subtree_level(batch_size).is_some() && start % batch_size == 0,
            DepositError::InvalidBatch
        );
        let end = start
            .checked_add(batch_size)
            .ok_or(error!(DepositError::OutOfRange))?;
        require!(end <= self.len(), DepositError::OutOfRange);

        let before = self.snapshot(start)?;
        let after = self.snapshot(end)?;
        BatchProof::between(&before, &after, start, batch_size)
    }
}
