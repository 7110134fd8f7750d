//! Batch subtree-update proofs
//!
//! The proving pipeline inserts leaves in aligned batches of `arity^k` and
//! proves that the empty subtree at the batch position was replaced by the
//! subtree of the new leaves. A `BatchProof` carries the public data of
//! that statement:
//!
//! ```text
//! old_root = fold(old_subtree_root, path)     old_subtree_root = zeros[k]
//! new_root = fold(new_subtree_root, path)     new_subtree_root = root(leaves)
//! accumulator_hash      = SHA-256(leaf_0 || ... || leaf_n) with top 3 bits cleared
//! encoded_path_and_hash = subtree_index + top_3_bits * arity^(depth - k)
//! ```
//!
//! Proofs are pure functions of two tree snapshots and carry no
//! verification key material; checking the SNARK happens elsewhere.

use anchor_lang::prelude::*;
use solana_program::hash::hashv;

use super::proof::{fold_path, path_index, PathLevel};
use super::{tree_capacity, CommitmentAccumulator};
use crate::crypto::poseidon::{hash_children, to_field_element, zero_values};
use crate::error::DepositError;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct BatchProof {
    pub arity: u8,
    pub depth: u8,
    pub start_index: u64,
    pub batch_size: u64,
    /// Level of the replaced subtree (batch_size = arity^subtree_level)
    pub subtree_level: u8,
    pub old_subtree_root: [u8; 32],
    pub new_subtree_root: [u8; 32],
    /// Subtree to root
    pub path: Vec<PathLevel>,
    pub old_root: [u8; 32],
    pub new_root: [u8; 32],
    pub leaves: Vec<[u8; 32]>,
    pub accumulator_hash: [u8; 32],
    pub encoded_path_and_hash: u128,
}

impl BatchProof {
    /// Describe the transition from `before` to `after`.
    ///
    /// `after` must be `before` plus exactly the leaves of the batch.
    pub fn between(
        before: &CommitmentAccumulator,
        after: &CommitmentAccumulator,
        start: u64,
        batch_size: u64,
    ) -> Result<Self> {
        require!(
            before.arity() == after.arity() && before.depth() == after.depth(),
            DepositError::InvalidBatch
        );
        let level = after
            .subtree_level(batch_size)
            .ok_or(error!(DepositError::InvalidBatch))?;
        require!(start % batch_size == 0, DepositError::InvalidBatch);

        let end = start
            .checked_add(batch_size)
            .ok_or(error!(DepositError::OutOfRange))?;
        require!(
            before.len() == start && after.len() == end,
            DepositError::OutOfRange
        );
        require!(
            after.leaves()[..start as usize] == *before.leaves(),
            DepositError::InvalidBatch
        );

        let subtree_index = start / batch_size;
        let leaves = after.leaves()[start as usize..end as usize].to_vec();
        let (accumulator_hash, high_bits) = accumulator_hash(&leaves);
        let subtree_count = after.capacity() / batch_size;

        Ok(Self {
            arity: after.arity(),
            depth: after.depth(),
            start_index: start,
            batch_size,
            subtree_level: level as u8,
            old_subtree_root: before.node(level, subtree_index),
            new_subtree_root: after.node(level, subtree_index),
            path: after.path_from(level, subtree_index),
            old_root: before.root(),
            new_root: after.root(),
            leaves,
            accumulator_hash,
            encoded_path_and_hash: subtree_index as u128
                + high_bits as u128 * subtree_count as u128,
        })
    }

    /// Recompute every public value from the leaves and the path.
    ///
    /// Returns `Ok(false)` for a proof that is well-typed but does not
    /// describe an aligned batch insertion, and an error for a tree shape
    /// that cannot exist.
    pub fn verify_transition(&self) -> Result<bool> {
        let capacity = tree_capacity(self.arity, self.depth)?;
        require!(self.subtree_level <= self.depth, DepositError::InvalidBatch);

        // arity^level divides capacity, so this cannot overflow
        let batch_size = (self.arity as u64).pow(self.subtree_level as u32);
        let in_range = self
            .start_index
            .checked_add(batch_size)
            .map_or(false, |end| end <= capacity);
        if self.batch_size != batch_size
            || self.leaves.len() as u64 != batch_size
            || self.start_index % batch_size != 0
            || !in_range
            || self.path.len() != (self.depth - self.subtree_level) as usize
        {
            return Ok(false);
        }

        let subtree_index = self.start_index / batch_size;
        if path_index(&self.path, self.arity) != Some(subtree_index) {
            return Ok(false);
        }

        let (hash, high_bits) = accumulator_hash(&self.leaves);
        let encoded = subtree_index as u128 + high_bits as u128 * (capacity / batch_size) as u128;
        if hash != self.accumulator_hash || encoded != self.encoded_path_and_hash {
            return Ok(false);
        }

        let empty_subtree = zero_values(self.arity, self.subtree_level)?[self.subtree_level as usize];
        let subtree = subtree_root(self.arity, &self.leaves)?;

        Ok(self.old_subtree_root == empty_subtree
            && self.new_subtree_root == subtree
            && fold_path(self.old_subtree_root, &self.path)? == self.old_root
            && fold_path(self.new_subtree_root, &self.path)? == self.new_root)
    }

    /// Index of the replaced subtree among subtrees of its level.
    pub fn subtree_index(&self) -> u64 {
        self.start_index / self.batch_size
    }
}

/// SHA-256 over the big-endian leaves; returns the 253-bit field value and
/// the three high bits that were cleared.
pub fn accumulator_hash(leaves: &[[u8; 32]]) -> ([u8; 32], u8) {
    let preimage: Vec<&[u8]> = leaves.iter().map(|leaf| leaf.as_slice()).collect();
    let digest = hashv(&preimage).to_bytes();
    (to_field_element(digest), digest[0] >> 5)
}

/// Root of a complete subtree whose leaf count is a power of `arity`.
fn subtree_root(arity: u8, leaves: &[[u8; 32]]) -> Result<[u8; 32]> {
    require!(arity >= 2, DepositError::InvalidTreeArity);
    let mut nodes = leaves.to_vec();
    while nodes.len() > 1 {
        nodes = nodes
            .chunks(arity as usize)
            .map(hash_children)
            .collect::<Result<Vec<_>>>()?;
    }
    nodes
        .first()
        .copied()
        .ok_or(error!(DepositError::InvalidBatch))
}
