//! Incremental commitment tree account
//!
//! On-chain form of the accumulator. Keeps only what an append needs:
//! the zero value of every level and, per level, the hashes of the
//! already-filled left siblings in the group the next leaf falls into.
//! Roots always equal those of `CommitmentAccumulator` for the same leaves.
//!
//! # Frontier layout
//! `frontier[level * (arity - 1) + offset]` is the latest hash of the child
//! at `offset` in the current group at `level`. Offsets `arity - 1` are
//! never read back, so they are not stored.

use anchor_lang::prelude::*;
use solana_program::entrypoint::MAX_PERMITTED_DATA_INCREASE;

use crate::accumulator::tree_capacity;
use crate::crypto::poseidon::{hash_children, is_field_element, zero_values};
use crate::error::DepositError;

/// Minimum root history size
pub const MIN_ROOT_HISTORY_SIZE: u16 = 30;

/// Commitment tree state account.
///
/// PDA Seeds: `[b"commitment_tree", state.key().as_ref()]`
#[account]
pub struct CommitmentTree {
    /// Registry this tree belongs to
    pub state: Pubkey,

    /// Branching factor (immutable after init)
    pub arity: u8,

    /// Tree depth (immutable after init)
    pub depth: u8,

    /// Next leaf index to be filled (also = total leaves inserted)
    pub next_index: u64,

    /// Current root hash
    pub current_root: [u8; 32],

    /// Recent roots for the proving pipeline (circular buffer)
    pub root_history: Vec<[u8; 32]>,

    /// Current position in circular root history buffer
    pub root_history_index: u16,

    /// Maximum root history size (set at init)
    pub root_history_size: u16,

    /// Empty-subtree roots, length = depth + 1
    pub zeros: Vec<[u8; 32]>,

    /// Filled left siblings, length = depth * (arity - 1)
    pub frontier: Vec<[u8; 32]>,

    /// PDA bump seed
    pub bump: u8,
}

impl CommitmentTree {
    pub const SEED_PREFIX: &'static [u8] = b"commitment_tree";

    /// Calculate space needed for the tree account.
    pub fn space(arity: u8, depth: u8, root_history_size: u16) -> usize {
        let depth_usize = depth as usize;
        let siblings = (arity as usize).saturating_sub(1);

        8                                               // discriminator
            + 32                                        // state
            + 1                                         // arity
            + 1                                         // depth
            + 8                                         // next_index
            + 32                                        // current_root
            + 4 + (32 * root_history_size as usize)     // root_history (vec)
            + 2                                         // root_history_index
            + 2                                         // root_history_size
            + 4 + (32 * (depth_usize + 1))              // zeros (vec)
            + 4 + (32 * depth_usize * siblings)         // frontier (vec)
            + 1                                         // bump
    }

    /// Validate deployment parameters before any account is created.
    pub fn validate_params(arity: u8, depth: u8, root_history_size: u16) -> Result<u64> {
        let capacity = tree_capacity(arity, depth)?;
        require!(
            root_history_size >= MIN_ROOT_HISTORY_SIZE,
            DepositError::InvalidRootHistorySize
        );
        require!(
            Self::space(arity, depth, root_history_size) <= MAX_PERMITTED_DATA_INCREASE,
            DepositError::TreeTooLarge
        );
        Ok(capacity)
    }

    /// Initialize the tree with empty state.
    pub fn initialize(
        &mut self,
        state: Pubkey,
        arity: u8,
        depth: u8,
        root_history_size: u16,
        bump: u8,
    ) -> Result<()> {
        Self::validate_params(arity, depth, root_history_size)?;

        self.state = state;
        self.arity = arity;
        self.depth = depth;
        self.next_index = 0;
        self.root_history_index = 0;
        self.root_history_size = root_history_size;
        self.bump = bump;

        self.zeros = zero_values(arity, depth)?;
        self.frontier = (0..depth as usize)
            .flat_map(|level| std::iter::repeat(self.zeros[level]).take(arity as usize - 1))
            .collect();

        self.current_root = self.zeros[depth as usize];
        self.root_history = vec![[0u8; 32]; root_history_size as usize];
        self.root_history[0] = self.current_root;

        Ok(())
    }

    /// Insert a commitment leaf and return its index.
    ///
    /// # Errors
    /// * `Full` if the tree has reached capacity
    /// * `InvalidLeaf` if the leaf is not a canonical field element
    pub fn insert_leaf(&mut self, commitment: [u8; 32]) -> Result<u64> {
        require!(!self.is_full()?, DepositError::Full);
        require!(is_field_element(&commitment), DepositError::InvalidLeaf);

        let arity = self.arity as u64;
        let siblings = self.arity as usize - 1;
        let leaf_index = self.next_index;
        let mut current_hash = commitment;
        let mut position = leaf_index;
        let mut frontier_updates = Vec::with_capacity(self.depth as usize);

        // Walk up the tree; nothing is written until every hash succeeded
        for level in 0..self.depth as usize {
            let offset = (position % arity) as usize;
            let base = level * siblings;

            let mut children = Vec::with_capacity(self.arity as usize);
            children.extend_from_slice(&self.frontier[base..base + offset]);
            children.push(current_hash);
            children.resize(self.arity as usize, self.zeros[level]);

            if offset < siblings {
                frontier_updates.push((base + offset, current_hash));
            }

            current_hash = hash_children(&children)?;
            position /= arity;
        }

        for (slot, hash) in frontier_updates {
            self.frontier[slot] = hash;
        }
        self.current_root = current_hash;

        self.root_history_index = (self.root_history_index + 1) % self.root_history_size;
        self.root_history[self.root_history_index as usize] = current_hash;

        self.next_index = leaf_index
            .checked_add(1)
            .ok_or(error!(DepositError::Overflow))?;

        Ok(leaf_index)
    }

    pub fn capacity(&self) -> Result<u64> {
        tree_capacity(self.arity, self.depth)
    }

    pub fn is_full(&self) -> Result<bool> {
        Ok(self.next_index >= self.capacity()?)
    }
}
