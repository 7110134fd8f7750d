//! Unified error types for the shielded deposit pool
//!
//! Error codes are stable across versions for client compatibility.

use anchor_lang::prelude::*;

#[error_code]
pub enum DepositError {
    // ========== Registry Errors ==========

    /// Caller is not the registry admin
    #[msg("Unauthorized: caller is not the registry admin")]
    Unauthorized, // 6000

    /// Deposit value must be greater than zero
    #[msg("Invalid amount: must be greater than zero")]
    InvalidAmount, // 6001

    /// Nonce counter or balance arithmetic overflowed
    #[msg("Arithmetic overflow")]
    Overflow, // 6002

    /// No deposit request exists for the nonce
    #[msg("Deposit request not found")]
    NotFound, // 6003

    /// Submitted terms differ from the stored request
    #[msg("Deposit terms do not match the pending request")]
    Mismatch, // 6004

    /// Signature is malformed or not from a permitted screener
    #[msg("Invalid screener signature")]
    InvalidSignature, // 6005

    /// Request was already completed
    #[msg("Deposit request already completed")]
    AlreadyCompleted, // 6006

    // ========== Accumulator Errors ==========

    /// Commitment tree has reached capacity
    #[msg("Commitment tree is full")]
    Full, // 6007

    /// Leaf index is beyond the appended leaves
    #[msg("Leaf index out of range")]
    OutOfRange, // 6008

    /// Batch size is not a power of the arity or start is misaligned
    #[msg("Invalid batch: size must be a power of the arity and aligned")]
    InvalidBatch, // 6009

    /// Leaf is not a canonical BN254 scalar
    #[msg("Invalid leaf: not a canonical field element")]
    InvalidLeaf, // 6010

    /// Tree arity outside the supported range
    #[msg("Tree arity must be between 2 and 12")]
    InvalidTreeArity, // 6011

    /// Tree depth outside the supported range
    #[msg("Tree depth must be between 1 and 32 and capacity must fit u64")]
    InvalidTreeDepth, // 6012

    /// Root history size too small
    #[msg("Root history size must be at least 30")]
    InvalidRootHistorySize, // 6013

    /// Tree account would exceed the allocation limit
    #[msg("Commitment tree account too large")]
    TreeTooLarge, // 6014

    /// Poseidon hashing failed
    #[msg("Hash computation failed")]
    HashFailure, // 6015

    // ========== Encoding Errors ==========

    /// Encoded bytes have the wrong length
    #[msg("Invalid canonical encoding")]
    InvalidEncoding, // 6016

    /// Stealth address coordinate is not a canonical field element
    #[msg("Invalid stealth address")]
    InvalidStealthAddress, // 6017

    // ========== Account / Token Errors ==========

    /// Deposit request account does not match the expected PDA
    #[msg("Deposit request account does not match the expected address")]
    InvalidRequestAccount, // 6018

    /// Token mint mismatch
    #[msg("Token mint does not match pool configuration")]
    InvalidMint, // 6019

    /// Caller or pool balance too small
    #[msg("Insufficient funds")]
    InsufficientFunds, // 6020
}
