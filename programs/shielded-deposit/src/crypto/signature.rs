//! Screener Signature Verification
//!
//! A screener attests to a deposit by signing the canonical encoding of the
//! request with a secp256k1 key. Signatures are recoverable:
//! ```text
//! signature = r (32) || s (32) || v (1)
//! digest    = Keccak256(encode(DepositRequest))
//! address   = Keccak256(uncompressed_pubkey[1..65])[12..32]
//! ```
//! `v` may be 0/1 or 27/28. High-`s` signatures are rejected so every
//! attestation has exactly one accepted encoding.
//!
//! Verification is FAIL-CLOSED: any malformed input is an invalid signature.

use anchor_lang::prelude::*;
use solana_program::keccak;
use solana_program::secp256k1_recover::secp256k1_recover;

use crate::error::DepositError;

/// Recoverable signature length: 64-byte scalar pair plus recovery byte.
pub const SIGNATURE_LEN: usize = 65;

/// 20-byte screener address derived from the secp256k1 public key.
pub type ScreenerAddress = [u8; 20];

/// `r || s || v`
pub type ScreenerSignature = [u8; SIGNATURE_LEN];

/// secp256k1 group order n divided by two, big-endian.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d,
    0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Signature schemes accepted for attestations.
///
/// Adding a scheme means adding a variant here.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignatureScheme {
    /// ECDSA over secp256k1 with a Keccak-256 message digest.
    #[default]
    Secp256k1Keccak,
}

impl SignatureScheme {
    /// Digest that the signature commits to.
    pub fn digest(&self, message: &[u8]) -> [u8; 32] {
        match self {
            Self::Secp256k1Keccak => keccak::hash(message).to_bytes(),
        }
    }

    /// Recover the address of the key that signed `message`.
    pub fn recover(
        &self,
        message: &[u8],
        signature: &ScreenerSignature,
    ) -> Result<ScreenerAddress> {
        match self {
            Self::Secp256k1Keccak => {
                let recovery_id = match signature[64] {
                    0 | 27 => 0,
                    1 | 28 => 1,
                    _ => return err!(DepositError::InvalidSignature),
                };
                require!(
                    signature[32..64] <= SECP256K1_HALF_ORDER[..],
                    DepositError::InvalidSignature
                );

                let digest = self.digest(message);
                let public_key = secp256k1_recover(&digest, recovery_id, &signature[..64])
                    .map_err(|_| error!(DepositError::InvalidSignature))?;

                Ok(address_from_public_key(&public_key.to_bytes()))
            }
        }
    }

    /// Check `signature` over `message` against a 64-byte uncompressed key.
    pub fn verify(
        &self,
        public_key: &[u8; 64],
        message: &[u8],
        signature: &ScreenerSignature,
    ) -> bool {
        self.recover(message, signature)
            .map(|address| address == address_from_public_key(public_key))
            .unwrap_or(false)
    }
}

/// Address of an uncompressed public key (x || y, no 0x04 prefix).
pub fn address_from_public_key(public_key: &[u8; 64]) -> ScreenerAddress {
    let hash = keccak::hash(public_key).to_bytes();
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}
