//! Registry state account
//!
//! Root of a deployment: who administers it, which pool and tree it drives,
//! and the nonce counter for deposit requests.

use anchor_lang::prelude::*;

use crate::error::DepositError;

/// Main registry account.
///
/// PDA Seeds: `[b"state", token_mint.key().as_ref()]`
#[account]
pub struct RegistryState {
    /// Registry admin - manages screener permissions
    pub admin: Pubkey,

    /// SPL token mint accepted for deposits
    pub token_mint: Pubkey,

    /// Pool ledger account (handle only)
    pub pool: Pubkey,

    /// Commitment tree account (handle only)
    pub commitment_tree: Pubkey,

    /// Nonce assigned to the next deposit request
    pub next_nonce: u64,

    /// Requests created but not yet completed
    pub pending_count: u64,

    /// Requests completed
    pub completed_count: u64,

    /// PDA bump seed
    pub bump: u8,
}

impl RegistryState {
    pub const SEED_PREFIX: &'static [u8] = b"state";

    /// Account space calculation
    pub const LEN: usize = 8 // discriminator
        + 32 // admin
        + 32 // token_mint
        + 32 // pool
        + 32 // commitment_tree
        + 8  // next_nonce
        + 8  // pending_count
        + 8  // completed_count
        + 1; // bump

    pub fn initialize(
        &mut self,
        admin: Pubkey,
        token_mint: Pubkey,
        pool: Pubkey,
        commitment_tree: Pubkey,
        bump: u8,
    ) {
        self.admin = admin;
        self.token_mint = token_mint;
        self.pool = pool;
        self.commitment_tree = commitment_tree;
        self.next_nonce = 0;
        self.pending_count = 0;
        self.completed_count = 0;
        self.bump = bump;
    }

    /// Reserve `count` consecutive nonces, returning the first one.
    ///
    /// Either every nonce is reserved or none is.
    pub fn reserve_nonces(&mut self, count: u64) -> Result<u64> {
        let first = self.next_nonce;
        let next_nonce = first
            .checked_add(count)
            .ok_or(error!(DepositError::Overflow))?;
        let pending_count = self
            .pending_count
            .checked_add(count)
            .ok_or(error!(DepositError::Overflow))?;

        self.next_nonce = next_nonce;
        self.pending_count = pending_count;
        Ok(first)
    }

    /// Counters after one more completion, without applying them.
    pub fn counts_after_completion(&self) -> Result<(u64, u64)> {
        let pending = self
            .pending_count
            .checked_sub(1)
            .ok_or(error!(DepositError::Overflow))?;
        let completed = self
            .completed_count
            .checked_add(1)
            .ok_or(error!(DepositError::Overflow))?;
        Ok((pending, completed))
    }

    /// Hand administration to `new_admin`, returning the previous admin.
    ///
    /// The default key and the current admin are rejected with
    /// `Unauthorized`.
    pub fn transfer_admin(&mut self, new_admin: Pubkey) -> Result<Pubkey> {
        require!(new_admin != Pubkey::default(), DepositError::Unauthorized);
        require!(new_admin != self.admin, DepositError::Unauthorized);
        Ok(std::mem::replace(&mut self.admin, new_admin))
    }
}
