//! Complete Deposit Instruction
//!
//! Admits a pending deposit into the privacy set once a permitted
//! screener has signed its canonical encoding. In one transaction:
//! the commitment is appended to the tree, `value` moves from the locked
//! to the shielded balance, and `gas_compensation` is paid from the vault
//! to the submitting relayer.
//!
//! # Accounts that may not exist
//! `deposit_request` is the record PDA for `nonce`; if it was never created
//! the instruction fails with `NotFound` rather than an account error.
//! `screener_permission` is the permission PDA of the signer, which the
//! relayer derives from the screener address it expects to recover.

use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::codec::{DepositRequest, StealthAddress};
use crate::crypto::ScreenerAddress;
use crate::error::DepositError;
use crate::events::DepositCompleted;
use crate::registry::{complete_request, DepositReceipt};
use crate::state::{
    load_program_account, store_program_account, CommitmentTree, DepositRecord, Pool,
    RegistryState, ScreenerPermission,
};

#[derive(Accounts)]
#[instruction(spender: Pubkey, value: u64, stealth_address: StealthAddress, nonce: u64)]
pub struct CompleteDeposit<'info> {
    #[account(
        mut,
        seeds = [RegistryState::SEED_PREFIX, state.token_mint.as_ref()],
        bump = state.bump,
    )]
    pub state: Box<Account<'info, RegistryState>>,

    #[account(
        mut,
        seeds = [Pool::SEED_PREFIX, state.key().as_ref()],
        bump = pool.bump,
        constraint = state.pool == pool.key() @ DepositError::Unauthorized,
    )]
    pub pool: Box<Account<'info, Pool>>,

    #[account(
        mut,
        seeds = [CommitmentTree::SEED_PREFIX, state.key().as_ref()],
        bump = commitment_tree.bump,
        constraint = commitment_tree.state == state.key() @ DepositError::Unauthorized,
    )]
    pub commitment_tree: Box<Account<'info, CommitmentTree>>,

    /// CHECK: Record PDA for `nonce`; address checked against the derived
    /// PDA and contents loaded manually, since it may not exist.
    #[account(
        mut,
        seeds = [DepositRecord::SEED_PREFIX, state.key().as_ref(), nonce.to_le_bytes().as_ref()],
        bump,
    )]
    pub deposit_request: UncheckedAccount<'info>,

    /// CHECK: Permission PDA of the recovered signer; checked in the
    /// handler once the signer is known.
    pub screener_permission: UncheckedAccount<'info>,

    #[account(
        mut,
        seeds = [b"vault", pool.key().as_ref()],
        bump,
        constraint = vault.mint == state.token_mint @ DepositError::InvalidMint,
        constraint = vault.owner == pool.key() @ DepositError::Unauthorized,
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    /// Receives the gas compensation.
    #[account(
        mut,
        constraint = relayer_token_account.mint == state.token_mint @ DepositError::InvalidMint,
    )]
    pub relayer_token_account: Box<Account<'info, TokenAccount>>,

    pub relayer: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

#[allow(clippy::too_many_arguments)]
pub fn handler(
    ctx: Context<CompleteDeposit>,
    spender: Pubkey,
    value: u64,
    stealth_address: StealthAddress,
    nonce: u64,
    gas_compensation: u64,
    signature: [u8; 65],
) -> Result<DepositReceipt> {
    let program_id = ctx.program_id;
    let state_key = ctx.accounts.state.key();
    let record_info = ctx.accounts.deposit_request.to_account_info();
    let permission_info = ctx.accounts.screener_permission.to_account_info();

    let terms = DepositRequest {
        spender,
        value,
        stealth_address,
        nonce,
        gas_compensation,
    };

    let mut record: Option<DepositRecord> = load_program_account(&record_info, program_id)?;

    let is_permitted = |screener: &ScreenerAddress| {
        let (expected, _) = ScreenerPermission::find_pda(program_id, &state_key, screener);
        permission_info.key() == expected
            && matches!(
                load_program_account::<ScreenerPermission>(&permission_info, program_id),
                Ok(Some(permission)) if permission.permits(&state_key, screener)
            )
    };

    // ========== VERIFY AND ACCUMULATE ==========

    ctx.accounts.pool.ensure_backed(ctx.accounts.vault.amount)?;

    let receipt = complete_request(
        &mut ctx.accounts.state,
        &mut ctx.accounts.pool,
        &mut ctx.accounts.commitment_tree,
        record.as_mut(),
        &terms,
        &signature,
        is_permitted,
    )?;

    // ========== TOKEN TRANSFER ==========

    if receipt.gas_compensation > 0 {
        let bump = [ctx.accounts.pool.bump];
        let pool_seeds = Pool::signer_seeds(&state_key, &bump);
        let signer_seeds = &[&pool_seeds[..]];

        let cpi_accounts = Transfer {
            from: ctx.accounts.vault.to_account_info(),
            to: ctx.accounts.relayer_token_account.to_account_info(),
            authority: ctx.accounts.pool.to_account_info(),
        };
        let cpi_ctx = CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            cpi_accounts,
            signer_seeds,
        );
        token::transfer(cpi_ctx, receipt.gas_compensation)?;
    }

    // ========== RECORD UPDATE ==========

    if let Some(record) = record.as_ref() {
        store_program_account(&record_info, record)?;
    }

    emit!(DepositCompleted {
        state: state_key,
        nonce: receipt.nonce,
        leaf_index: receipt.leaf_index,
        commitment: receipt.commitment,
        root: receipt.root,
        screener: receipt.screener,
        relayer: ctx.accounts.relayer.key(),
        gas_compensation: receipt.gas_compensation,
        timestamp: Clock::get()?.unix_timestamp,
    });

    msg!("Deposit completed");
    msg!("Nonce: {}", receipt.nonce);
    msg!("Leaf index: {}", receipt.leaf_index);
    msg!("Commitment: {:?}", &receipt.commitment[..8]); // Only log first 8 bytes

    Ok(receipt)
}
