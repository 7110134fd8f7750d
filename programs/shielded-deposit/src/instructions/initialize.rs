//! Initialize Instruction
//!
//! Creates the registry state, pool ledger, token vault and commitment
//! tree for one SPL mint. Each account is created exactly once.

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::events::RegistryInitialized;
use crate::state::{CommitmentTree, Pool, RegistryState};

#[derive(Accounts)]
#[instruction(arity: u8, depth: u8, root_history_size: u16)]
pub struct Initialize<'info> {
    #[account(
        init,
        payer = admin,
        space = RegistryState::LEN,
        seeds = [RegistryState::SEED_PREFIX, token_mint.key().as_ref()],
        bump
    )]
    pub state: Box<Account<'info, RegistryState>>,

    #[account(
        init,
        payer = admin,
        space = Pool::LEN,
        seeds = [Pool::SEED_PREFIX, state.key().as_ref()],
        bump
    )]
    pub pool: Box<Account<'info, Pool>>,

    #[account(
        init,
        payer = admin,
        space = CommitmentTree::space(arity, depth, root_history_size),
        seeds = [CommitmentTree::SEED_PREFIX, state.key().as_ref()],
        bump
    )]
    pub commitment_tree: Box<Account<'info, CommitmentTree>>,

    #[account(
        init,
        payer = admin,
        token::mint = token_mint,
        token::authority = pool,
        seeds = [b"vault", pool.key().as_ref()],
        bump
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    pub token_mint: Box<Account<'info, Mint>>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

pub fn handler(
    ctx: Context<Initialize>,
    arity: u8,
    depth: u8,
    root_history_size: u16,
) -> Result<()> {
    CommitmentTree::validate_params(arity, depth, root_history_size)?;

    let state_key = ctx.accounts.state.key();
    let pool_key = ctx.accounts.pool.key();
    let tree_key = ctx.accounts.commitment_tree.key();
    let token_mint = ctx.accounts.token_mint.key();
    let admin = ctx.accounts.admin.key();

    ctx.accounts
        .state
        .initialize(admin, token_mint, pool_key, tree_key, ctx.bumps.state);
    ctx.accounts
        .pool
        .initialize(state_key, token_mint, ctx.accounts.vault.key(), ctx.bumps.pool);

    let tree = &mut ctx.accounts.commitment_tree;
    tree.initialize(
        state_key,
        arity,
        depth,
        root_history_size,
        ctx.bumps.commitment_tree,
    )?;

    emit!(RegistryInitialized {
        state: state_key,
        admin,
        token_mint,
        arity,
        depth,
        root_history_size,
        empty_root: tree.current_root,
        timestamp: Clock::get()?.unix_timestamp,
    });

    msg!("Shielded deposit registry initialized");
    msg!("Tree: arity {} depth {}", arity, depth);
    Ok(())
}
