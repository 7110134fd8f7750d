//! Canonical encodings for stealth addresses, deposit requests and notes
//!
//! Every field has a fixed width and integers are little-endian, so the
//! output is byte-identical to the Borsh serialization of the same struct.
//! These bytes are what screeners sign and what the note commitment hashes.
//!
//! ```text
//! StealthAddress  = h1_x(32) || h1_y(32) || h2_x(32) || h2_y(32)            128 bytes
//! DepositRequest  = spender(32) || value(8) || StealthAddress(128)
//!                   || nonce(8) || gas_compensation(8)                        184 bytes
//! EncodedNote     = owner_h1(32) || owner_h2(32) || nonce(8) || value(8)       80 bytes
//! ```

use anchor_lang::prelude::*;
use num_bigint::BigUint;

use crate::crypto::BN254_SCALAR_MODULUS_LE;
use crate::error::DepositError;

/// One-time destination: a pair of Baby Jubjub points `(H1, H2)`.
///
/// Coordinates are 256-bit little-endian integers.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StealthAddress {
    pub h1_x: [u8; 32],
    pub h1_y: [u8; 32],
    pub h2_x: [u8; 32],
    pub h2_y: [u8; 32],
}

impl StealthAddress {
    pub const ENCODED_LEN: usize = 128;

    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[0..32].copy_from_slice(&self.h1_x);
        out[32..64].copy_from_slice(&self.h1_y);
        out[64..96].copy_from_slice(&self.h2_x);
        out[96..128].copy_from_slice(&self.h2_y);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        require!(
            bytes.len() == Self::ENCODED_LEN,
            DepositError::InvalidEncoding
        );
        let mut reader = Reader::new(bytes);
        Ok(Self {
            h1_x: reader.array32(),
            h1_y: reader.array32(),
            h2_x: reader.array32(),
            h2_y: reader.array32(),
        })
    }

    /// Reject coordinates that are not canonical BN254 scalars.
    pub fn validate(&self) -> Result<()> {
        let modulus = BigUint::from_bytes_le(&BN254_SCALAR_MODULUS_LE);
        for coordinate in [&self.h1_x, &self.h1_y, &self.h2_x, &self.h2_y] {
            require!(
                BigUint::from_bytes_le(coordinate) < modulus,
                DepositError::InvalidStealthAddress
            );
        }
        Ok(())
    }

    /// Compressed H1: x with the parity of y in bit 255.
    pub fn compressed_h1(&self) -> [u8; 32] {
        compress_point(&self.h1_x, &self.h1_y)
    }

    /// Compressed H2: x with the parity of y in bit 255.
    pub fn compressed_h2(&self) -> [u8; 32] {
        compress_point(&self.h2_x, &self.h2_y)
    }
}

/// Canonical x coordinates are below 2^254, so bit 255 is free for the sign.
fn compress_point(x: &[u8; 32], y: &[u8; 32]) -> [u8; 32] {
    let mut out = *x;
    out[31] = (out[31] & 0x7f) | ((y[0] & 1) << 7);
    out
}

/// The attested unit: what a screener signs and what a deposit record stores.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DepositRequest {
    pub spender: Pubkey,
    pub value: u64,
    pub stealth_address: StealthAddress,
    pub nonce: u64,
    pub gas_compensation: u64,
}

impl DepositRequest {
    pub const ENCODED_LEN: usize = 32 + 8 + StealthAddress::ENCODED_LEN + 8 + 8;

    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[0..32].copy_from_slice(self.spender.as_ref());
        out[32..40].copy_from_slice(&self.value.to_le_bytes());
        out[40..168].copy_from_slice(&self.stealth_address.encode());
        out[168..176].copy_from_slice(&self.nonce.to_le_bytes());
        out[176..184].copy_from_slice(&self.gas_compensation.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        require!(
            bytes.len() == Self::ENCODED_LEN,
            DepositError::InvalidEncoding
        );
        let mut reader = Reader::new(bytes);
        let spender = Pubkey::new_from_array(reader.array32());
        let value = reader.u64();
        let stealth_address = StealthAddress::decode(reader.take(StealthAddress::ENCODED_LEN))?;
        Ok(Self {
            spender,
            value,
            stealth_address,
            nonce: reader.u64(),
            gas_compensation: reader.u64(),
        })
    }

    /// Note committed into the accumulator once this request is attested.
    pub fn note(&self) -> EncodedNote {
        EncodedNote {
            owner_h1: self.stealth_address.compressed_h1(),
            owner_h2: self.stealth_address.compressed_h2(),
            nonce: self.nonce,
            value: self.value,
        }
    }

    /// Value plus relayer fee: what this request locks in the pool.
    pub fn locked_amount(&self) -> Result<u64> {
        self.value
            .checked_add(self.gas_compensation)
            .ok_or(error!(DepositError::Overflow))
    }
}

/// Canonical leaf payload; its hash is the commitment.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodedNote {
    pub owner_h1: [u8; 32],
    pub owner_h2: [u8; 32],
    pub nonce: u64,
    pub value: u64,
}

impl EncodedNote {
    pub const ENCODED_LEN: usize = 32 + 32 + 8 + 8;

    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[0..32].copy_from_slice(&self.owner_h1);
        out[32..64].copy_from_slice(&self.owner_h2);
        out[64..72].copy_from_slice(&self.nonce.to_le_bytes());
        out[72..80].copy_from_slice(&self.value.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        require!(
            bytes.len() == Self::ENCODED_LEN,
            DepositError::InvalidEncoding
        );
        let mut reader = Reader::new(bytes);
        Ok(Self {
            owner_h1: reader.array32(),
            owner_h2: reader.array32(),
            nonce: reader.u64(),
            value: reader.u64(),
        })
    }
}

/// Cursor over an input whose length was checked by the caller.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize) -> &'a [u8] {
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        slice
    }

    fn array32(&mut self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.take(32));
        out
    }

    fn u64(&mut self) -> u64 {
        let mut out = [0u8; 8];
        out.copy_from_slice(self.take(8));
        u64::from_le_bytes(out)
    }
}
