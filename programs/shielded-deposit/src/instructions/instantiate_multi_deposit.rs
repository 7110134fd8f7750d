//! Instantiate Multi Deposit Instruction
//!
//! Opens one pending deposit request per value, all under the same
//! stealth address and relayer fee. The caller transfers
//! `Σ(value + gas_compensation)` into the vault in a single token CPI.
//!
//! # Remaining accounts
//! One writable, not yet created `DepositRecord` PDA per value, in nonce
//! order: `[b"deposit_request", state, nonce.to_le_bytes()]`. The caller
//! reads `state.next_nonce` to derive them. A PDA that already received
//! lamports is still accepted as long as the system program owns it.

use anchor_lang::prelude::*;
use anchor_lang::system_program;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::codec::StealthAddress;
use crate::error::DepositError;
use crate::events::DepositInstantiated;
use crate::registry::DepositBatch;
use crate::state::{
    create_program_account, store_program_account, DepositRecord, Pool, RegistryState,
};

#[derive(Accounts)]
pub struct InstantiateMultiDeposit<'info> {
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
        seeds = [b"vault", pool.key().as_ref()],
        bump,
        constraint = vault.mint == state.token_mint @ DepositError::InvalidMint,
        constraint = vault.owner == pool.key() @ DepositError::Unauthorized,
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    /// Funds for the deposits.
    #[account(
        mut,
        constraint = spender_token_account.mint == state.token_mint @ DepositError::InvalidMint,
    )]
    pub spender_token_account: Box<Account<'info, TokenAccount>>,

    /// Owner of the funds; pays rent for the request records.
    #[account(mut)]
    pub spender: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, InstantiateMultiDeposit<'info>>,
    values: Vec<u64>,
    stealth_address: StealthAddress,
    gas_compensation: u64,
) -> Result<Vec<u64>> {
    let state_key = ctx.accounts.state.key();
    let spender = ctx.accounts.spender.key();

    // ========== VALIDATION ==========

    let batch = DepositBatch::plan(
        &ctx.accounts.state,
        &ctx.accounts.pool,
        spender,
        &values,
        stealth_address,
        gas_compensation,
    )?;

    let record_bumps = check_request_accounts(
        ctx.program_id,
        &state_key,
        &batch,
        ctx.accounts.spender_token_account.amount,
        ctx.remaining_accounts,
    )?;

    // ========== TOKEN TRANSFER ==========

    let cpi_accounts = Transfer {
        from: ctx.accounts.spender_token_account.to_account_info(),
        to: ctx.accounts.vault.to_account_info(),
        authority: ctx.accounts.spender.to_account_info(),
    };
    let cpi_ctx = CpiContext::new(ctx.accounts.token_program.to_account_info(), cpi_accounts);
    token::transfer(cpi_ctx, batch.total)?;

    // ========== STATE UPDATE ==========

    batch.commit(&mut ctx.accounts.state, &mut ctx.accounts.pool)?;

    let rent = Rent::get()?.minimum_balance(DepositRecord::LEN);
    let timestamp = Clock::get()?.unix_timestamp;

    for ((request, info), bump) in batch
        .requests
        .iter()
        .zip(ctx.remaining_accounts)
        .zip(record_bumps)
    {
        let nonce_bytes = request.nonce.to_le_bytes();
        let seeds: &[&[u8]] = &[
            DepositRecord::SEED_PREFIX,
            state_key.as_ref(),
            &nonce_bytes,
            &[bump],
        ];
        create_program_account(
            &ctx.accounts.spender.to_account_info(),
            info,
            &ctx.accounts.system_program.to_account_info(),
            rent,
            DepositRecord::LEN,
            ctx.program_id,
            seeds,
        )?;

        store_program_account(info, &DepositRecord::new(state_key, *request, bump))?;

        emit!(DepositInstantiated {
            state: state_key,
            spender,
            nonce: request.nonce,
            value: request.value,
            gas_compensation: request.gas_compensation,
            stealth_address: request.stealth_address,
            timestamp,
        });
    }

    msg!("Deposit requests opened: {}", batch.requests.len());
    msg!("Nonces: {}..{}", batch.first_nonce, ctx.accounts.state.next_nonce);
    msg!("Locked: {}", batch.total);

    Ok(batch.nonces())
}

/// Check the spender's balance and the record accounts for `batch`,
/// returning the record PDA bumps in nonce order.
///
/// # Errors
/// * `InsufficientFunds` - `balance` does not cover `batch.total`
/// * `InvalidRequestAccount` - wrong count, a wrong address, or a record
///   that is read-only or already created
pub fn check_request_accounts(
    program_id: &Pubkey,
    state_key: &Pubkey,
    batch: &DepositBatch,
    balance: u64,
    records: &[AccountInfo],
) -> Result<Vec<u8>> {
    require!(balance >= batch.total, DepositError::InsufficientFunds);
    require!(
        records.len() == batch.requests.len(),
        DepositError::InvalidRequestAccount
    );

    let mut bumps = Vec::with_capacity(records.len());
    for (request, info) in batch.requests.iter().zip(records) {
        let (expected, bump) = DepositRecord::find_pda(program_id, state_key, request.nonce);
        require_keys_eq!(info.key(), expected, DepositError::InvalidRequestAccount);
        require!(
            info.is_writable && info.data_is_empty() && info.owner == &system_program::ID,
            DepositError::InvalidRequestAccount
        );
        bumps.push(bump);
    }
    Ok(bumps)
}
