//! Pool ledger account
//!
//! Book-keeping for the funds held in the token vault. Deposits are
//! `locked` until a screener attests to them; then the value moves to
//! `shielded` and the relayer fee leaves the vault.
//!
//! Only registry instructions mutate these balances.

use anchor_lang::prelude::*;

use crate::error::DepositError;

/// Pool ledger account.
///
/// PDA Seeds: `[b"pool", state.key().as_ref()]`
#[account]
pub struct Pool {
    /// Registry that owns this pool (handle only)
    pub state: Pubkey,

    /// SPL token mint held by the vault
    pub token_mint: Pubkey,

    /// Token vault PDA address (cached for convenience)
    pub vault: Pubkey,

    /// Received but not yet attested
    pub locked_balance: u64,

    /// Admitted into the privacy set
    pub shielded_balance: u64,

    /// PDA bump seed
    pub bump: u8,
}

/// Ledger balances, computed before they are applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolBalances {
    pub locked: u64,
    pub shielded: u64,
}

impl Pool {
    pub const SEED_PREFIX: &'static [u8] = b"pool";

    /// Account space calculation
    pub const LEN: usize = 8 // discriminator
        + 32 // state
        + 32 // token_mint
        + 32 // vault
        + 8  // locked_balance
        + 8  // shielded_balance
        + 1; // bump

    pub fn initialize(&mut self, state: Pubkey, token_mint: Pubkey, vault: Pubkey, bump: u8) {
        self.state = state;
        self.token_mint = token_mint;
        self.vault = vault;
        self.locked_balance = 0;
        self.shielded_balance = 0;
        self.bump = bump;
    }

    pub fn balances(&self) -> PoolBalances {
        PoolBalances {
            locked: self.locked_balance,
            shielded: self.shielded_balance,
        }
    }

    /// Balances after receiving `amount` of unattested funds.
    pub fn after_lock(&self, amount: u64) -> Result<PoolBalances> {
        Ok(PoolBalances {
            locked: self
                .locked_balance
                .checked_add(amount)
                .ok_or(error!(DepositError::Overflow))?,
            shielded: self.shielded_balance,
        })
    }

    /// Balances after admitting `value` and paying out `gas_compensation`.
    pub fn after_release(&self, value: u64, gas_compensation: u64) -> Result<PoolBalances> {
        let released = value
            .checked_add(gas_compensation)
            .ok_or(error!(DepositError::Overflow))?;
        Ok(PoolBalances {
            locked: self
                .locked_balance
                .checked_sub(released)
                .ok_or(error!(DepositError::InsufficientFunds))?,
            shielded: self
                .shielded_balance
                .checked_add(value)
                .ok_or(error!(DepositError::Overflow))?,
        })
    }

    pub fn apply(&mut self, balances: PoolBalances) {
        self.locked_balance = balances.locked;
        self.shielded_balance = balances.shielded;
    }

    /// Tokens the vault must hold to back the ledger.
    pub fn total_held(&self) -> Result<u64> {
        self.locked_balance
            .checked_add(self.shielded_balance)
            .ok_or(error!(DepositError::Overflow))
    }

    /// Require a vault balance that covers every locked and shielded token.
    pub fn ensure_backed(&self, vault_amount: u64) -> Result<()> {
        require!(
            vault_amount >= self.total_held()?,
            DepositError::InsufficientFunds
        );
        Ok(())
    }

    /// PDA signer seeds for vault transfers.
    pub fn signer_seeds<'a>(state: &'a Pubkey, bump: &'a [u8; 1]) -> [&'a [u8]; 3] {
        [Self::SEED_PREFIX, state.as_ref(), bump]
    }
}
