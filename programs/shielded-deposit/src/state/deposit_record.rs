//! Deposit request records using per-nonce PDA pattern
//!
//! Each deposit request gets its own account, keyed by nonce. The set of
//! records with status `Pending` is the pending map; those with status
//! `Completed` form the completed set. Records are never closed, so a
//! nonce can never be reissued or completed twice.

use anchor_lang::prelude::*;

use crate::codec::DepositRequest;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepositStatus {
    Pending,
    Completed,
}

/// Deposit request record.
///
/// PDA Seeds: `[b"deposit_request", state.key().as_ref(), nonce.to_le_bytes()]`
#[account]
pub struct DepositRecord {
    /// Registry the request belongs to
    pub state: Pubkey,

    /// Attested terms, immutable after creation
    pub request: DepositRequest,

    pub status: DepositStatus,

    /// Leaf index of the commitment, meaningful once completed
    pub leaf_index: u64,

    /// PDA bump seed
    pub bump: u8,
}

impl DepositRecord {
    pub const SEED_PREFIX: &'static [u8] = b"deposit_request";

    /// Account space calculation
    pub const LEN: usize = 8 // discriminator
        + 32 // state
        + DepositRequest::ENCODED_LEN // request
        + 1  // status
        + 8  // leaf_index
        + 1; // bump

    pub fn new(state: Pubkey, request: DepositRequest, bump: u8) -> Self {
        Self {
            state,
            request,
            status: DepositStatus::Pending,
            leaf_index: 0,
            bump,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == DepositStatus::Pending
    }

    pub fn mark_completed(&mut self, leaf_index: u64) {
        self.status = DepositStatus::Completed;
        self.leaf_index = leaf_index;
    }

    /// Derive the PDA address for a nonce
    pub fn find_pda(program_id: &Pubkey, state: &Pubkey, nonce: u64) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[Self::SEED_PREFIX, state.as_ref(), &nonce.to_le_bytes()],
            program_id,
        )
    }
}
