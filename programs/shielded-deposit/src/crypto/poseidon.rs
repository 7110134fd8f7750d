//! Hash Functions for the Commitment Accumulator
//!
//! # Hash Function Architecture
//!
//! ## Tree nodes
//! Internal nodes are circom-compatible Poseidon over BN254 with one input
//! per child, so an arity-4 tree hashes four children per node:
//! ```text
//! node = Poseidon(child_0, ..., child_{r-1})
//! ```
//! Inputs and outputs are 32-byte big-endian field elements. On-chain the
//! Poseidon syscall is used; native builds call `light-poseidon` directly.
//!
//! ## Leaves
//! ```text
//! commitment = field(SHA-256(encode(EncodedNote)))
//! Z          = field(SHA-256("shielded-deposit/zero-leaf/v1"))
//! ```
//! `field` clears the top three bits of the digest, leaving a 253-bit value
//! that is always below the BN254 scalar modulus. Padding and notes hash
//! disjoint preimages, so an empty slot never equals a real leaf.

use anchor_lang::prelude::*;
use solana_program::hash::hashv;

use crate::codec::EncodedNote;
use crate::crypto::BN254_SCALAR_MODULUS_BE;
use crate::error::DepositError;

/// Preimage of the zero leaf.
pub const ZERO_LEAF_DOMAIN: &[u8] = b"shielded-deposit/zero-leaf/v1";

/// Largest node width supported by the circom Poseidon parameters.
pub const MAX_POSEIDON_INPUTS: usize = 12;

/// Hash the children of one accumulator node, left to right.
pub fn hash_children(children: &[[u8; 32]]) -> Result<[u8; 32]> {
    require!(
        !children.is_empty() && children.len() <= MAX_POSEIDON_INPUTS,
        DepositError::HashFailure
    );
    let inputs: Vec<&[u8]> = children.iter().map(|child| child.as_slice()).collect();
    poseidon_be(&inputs)
}

#[cfg(target_os = "solana")]
fn poseidon_be(inputs: &[&[u8]]) -> Result<[u8; 32]> {
    use solana_program::poseidon::{hashv as poseidon_hashv, Endianness, Parameters};

    poseidon_hashv(Parameters::Bn254X5, Endianness::BigEndian, inputs)
        .map(|hash| hash.to_bytes())
        .map_err(|_| error!(DepositError::HashFailure))
}

#[cfg(not(target_os = "solana"))]
fn poseidon_be(inputs: &[&[u8]]) -> Result<[u8; 32]> {
    use ark_bn254::Fr;
    use light_poseidon::{Poseidon, PoseidonBytesHasher};

    let mut hasher =
        Poseidon::<Fr>::new_circom(inputs.len()).map_err(|_| error!(DepositError::HashFailure))?;
    hasher
        .hash_bytes_be(inputs)
        .map_err(|_| error!(DepositError::HashFailure))
}

/// Truncate a 256-bit big-endian digest to 253 bits.
#[inline]
pub fn to_field_element(mut digest: [u8; 32]) -> [u8; 32] {
    digest[0] &= 0x1f;
    digest
}

/// Check that a big-endian value is a canonical BN254 scalar.
#[inline]
pub fn is_field_element(value: &[u8; 32]) -> bool {
    *value < BN254_SCALAR_MODULUS_BE
}

/// The padding element `Z` for unfilled leaf slots.
pub fn zero_leaf() -> [u8; 32] {
    to_field_element(hashv(&[ZERO_LEAF_DOMAIN]).to_bytes())
}

/// Commitment of a note: the leaf appended to the accumulator.
pub fn note_commitment(note: &EncodedNote) -> [u8; 32] {
    to_field_element(hashv(&[&note.encode()]).to_bytes())
}

/// Roots of empty subtrees for each level.
///
/// zeros[0] = Z
/// zeros[i] = hash(zeros[i-1] repeated `arity` times)
/// Length = depth + 1
///
/// # Note
/// These MUST match the circuit's zero values exactly.
pub fn zero_values(arity: u8, depth: u8) -> Result<Vec<[u8; 32]>> {
    let mut zeros = Vec::with_capacity(depth as usize + 1);
    zeros.push(zero_leaf());

    for level in 1..=depth as usize {
        let prev = zeros[level - 1];
        zeros.push(hash_children(&vec![prev; arity as usize])?);
    }

    Ok(zeros)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_children_deterministic() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_eq!(
            hash_children(&[a, b]).unwrap(),
            hash_children(&[a, b]).unwrap()
        );
    }

    #[test]
    fn test_hash_children_order_matters() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_ne!(
            hash_children(&[a, b]).unwrap(),
            hash_children(&[b, a]).unwrap()
        );
    }

    #[test]
    fn test_hash_children_width_matters() {
        let a = [3u8; 32];
        assert_ne!(
            hash_children(&[a, a]).unwrap(),
            hash_children(&[a, a, a, a]).unwrap()
        );
    }

    #[test]
    fn test_hash_children_rejects_bad_widths() {
        assert!(hash_children(&[]).is_err());
        assert!(hash_children(&[[0u8; 32]; 13]).is_err());
    }

    #[test]
    fn test_zero_leaf_is_field_element() {
        let z = zero_leaf();
        assert!(is_field_element(&z));
        assert_ne!(z, [0u8; 32]);
        assert_eq!(z, zero_leaf());
    }

    #[test]
    fn test_zero_leaf_differs_from_empty_note() {
        assert_ne!(zero_leaf(), note_commitment(&EncodedNote::default()));
    }

    #[test]
    fn test_field_truncation() {
        let value = to_field_element([0xffu8; 32]);
        assert_eq!(value[0], 0x1f);
        assert!(is_field_element(&value));
        assert!(!is_field_element(&BN254_SCALAR_MODULUS_BE));
    }

    #[test]
    fn test_zero_values_chain() {
        let zeros = zero_values(4, 3).unwrap();
        assert_eq!(zeros.len(), 4);
        assert_eq!(zeros[0], zero_leaf());
        assert_eq!(zeros[2], hash_children(&[zeros[1]; 4]).unwrap());
    }

    #[test]
    fn test_commitment_binds_nonce() {
        let note = EncodedNote {
            owner_h1: [1u8; 32],
            owner_h2: [1u8; 32],
            nonce: 0,
            value: 1,
        };
        let other = EncodedNote { nonce: 1, ..note };
        assert_ne!(note_commitment(&note), note_commitment(&other));
        assert!(is_field_element(&note_commitment(&note)));
    }
}
