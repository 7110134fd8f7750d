//! Cryptographic primitives for the shielded deposit pool
//!
//! - `poseidon`: accumulator node hash, zero leaf, note commitments
//! - `signature`: screener attestation (secp256k1, recoverable)

pub mod poseidon;
pub mod signature;

pub use poseidon::{hash_children, note_commitment, to_field_element, zero_leaf, zero_values};
pub use signature::{ScreenerAddress, ScreenerSignature, SignatureScheme};

/// BN254 scalar field modulus (r), little-endian
/// r = 21888242871839275222246405745257275088548364400416034343698204186575808495617
pub const BN254_SCALAR_MODULUS_LE: [u8; 32] = [
    0x01, 0x00, 0x00, 0xf0, 0x93, 0xf5, 0xe1, 0x43,
    0x91, 0x70, 0xb9, 0x79, 0x48, 0xe8, 0x33, 0x28,
    0x5d, 0x58, 0x81, 0x81, 0xb6, 0x45, 0x50, 0xb8,
    0x29, 0xa0, 0x31, 0xe1, 0x72, 0x4e, 0x64, 0x30,
];

/// Same modulus, big-endian (the byte order of tree nodes).
pub const BN254_SCALAR_MODULUS_BE: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29,
    0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91,
    0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00, 0x00, 0x01,
];
