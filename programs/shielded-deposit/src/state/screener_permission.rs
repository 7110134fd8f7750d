//! Screener permissions using per-address PDA pattern
//!
//! A screener is identified by its 20-byte secp256k1 address. The account
//! is created on the first permission change and only overwritten after
//! that, so revoking keeps a record with `allowed = false`.

use anchor_lang::prelude::*;

use crate::crypto::ScreenerAddress;

/// Screener permission entry.
///
/// PDA Seeds: `[b"screener", state.key().as_ref(), screener.as_ref()]`
#[account]
pub struct ScreenerPermission {
    /// Registry the permission belongs to
    pub state: Pubkey,

    pub screener: ScreenerAddress,

    pub allowed: bool,

    /// PDA bump seed
    pub bump: u8,
}

impl ScreenerPermission {
    pub const SEED_PREFIX: &'static [u8] = b"screener";

    /// Account space calculation
    pub const LEN: usize = 8 // discriminator
        + 32 // state
        + 20 // screener
        + 1  // allowed
        + 1; // bump

    /// Overwrite the entry; identical calls leave identical state.
    pub fn set(&mut self, state: Pubkey, screener: ScreenerAddress, allowed: bool, bump: u8) {
        self.state = state;
        self.screener = screener;
        self.allowed = allowed;
        self.bump = bump;
    }

    /// Whether this entry currently permits `screener` for `state`.
    pub fn permits(&self, state: &Pubkey, screener: &ScreenerAddress) -> bool {
        self.allowed && self.state == *state && self.screener == *screener
    }

    /// Derive the PDA address for a screener
    pub fn find_pda(program_id: &Pubkey, state: &Pubkey, screener: &ScreenerAddress) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[Self::SEED_PREFIX, state.as_ref(), screener.as_ref()],
            program_id,
        )
    }
}
