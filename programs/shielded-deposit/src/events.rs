//! Events emitted by the shielded deposit pool
//!
//! Indexers and the proving pipeline follow the accumulator through
//! `DepositCompleted`: leaves are emitted in append order.

use anchor_lang::prelude::*;

use crate::codec::StealthAddress;

#[event]
pub struct RegistryInitialized {
    pub state: Pubkey,
    pub admin: Pubkey,
    pub token_mint: Pubkey,
    pub arity: u8,
    pub depth: u8,
    pub root_history_size: u16,
    pub empty_root: [u8; 32],
    pub timestamp: i64,
}

#[event]
pub struct DepositInstantiated {
    pub state: Pubkey,
    pub spender: Pubkey,
    pub nonce: u64,
    pub value: u64,
    pub gas_compensation: u64,
    pub stealth_address: StealthAddress,
    pub timestamp: i64,
}

#[event]
pub struct ScreenerPermissionSet {
    pub state: Pubkey,
    pub screener: [u8; 20],
    pub allowed: bool,
    pub timestamp: i64,
}

#[event]
pub struct AdminUpdated {
    pub state: Pubkey,
    pub old_admin: Pubkey,
    pub new_admin: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct DepositCompleted {
    pub state: Pubkey,
    pub nonce: u64,
    pub leaf_index: u64,
    pub commitment: [u8; 32],
    pub root: [u8; 32],
    pub screener: [u8; 20],
    pub relayer: Pubkey,
    pub gas_compensation: u64,
    pub timestamp: i64,
}
