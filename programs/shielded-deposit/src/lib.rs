//! Shielded Deposit Pool
//!
//! Callers lock funds under a one-time stealth address; an authorized
//! screener attests to the deposit off-chain; on attestation the program
//! pays the relayer, credits the shielded balance and appends the note
//! commitment to an r-ary Poseidon accumulator for the proving pipeline.

use anchor_lang::prelude::*;

pub mod accumulator;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod events;
pub mod instructions;
pub mod registry;
pub mod state;

#[cfg(test)]
mod test_runtime;

use codec::StealthAddress;
use instructions::*;
use registry::DepositReceipt;

declare_id!("4EKwCjH7re8Vh2g3jhxrGrea5jxN2Q4KJMTFJuCAU2Vw");

#[program]
pub mod shielded_deposit {
    use super::*;

    pub fn initialize(
        ctx: Context<Initialize>,
        arity: u8,
        depth: u8,
        root_history_size: u16,
    ) -> Result<()> {
        instructions::initialize::handler(ctx, arity, depth, root_history_size)
    }

    pub fn instantiate_multi_deposit<'info>(
        ctx: Context<'_, '_, 'info, 'info, InstantiateMultiDeposit<'info>>,
        values: Vec<u64>,
        stealth_address: StealthAddress,
        gas_compensation: u64,
    ) -> Result<Vec<u64>> {
        instructions::instantiate_multi_deposit::handler(
            ctx,
            values,
            stealth_address,
            gas_compensation,
        )
    }

    pub fn set_screener_permission(
        ctx: Context<SetScreenerPermission>,
        screener: [u8; 20],
        allowed: bool,
    ) -> Result<()> {
        instructions::set_screener_permission::handler(ctx, screener, allowed)
    }

    pub fn update_admin(ctx: Context<UpdateAdmin>, new_admin: Pubkey) -> Result<()> {
        instructions::admin::update_admin::handler(ctx, new_admin)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn complete_deposit(
        ctx: Context<CompleteDeposit>,
        spender: Pubkey,
        value: u64,
        stealth_address: StealthAddress,
        nonce: u64,
        gas_compensation: u64,
        signature: [u8; 65],
    ) -> Result<DepositReceipt> {
        instructions::complete_deposit::handler(
            ctx,
            spender,
            value,
            stealth_address,
            nonce,
            gas_compensation,
            signature,
        )
    }
}
