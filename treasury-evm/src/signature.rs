//! ECDSA signature parsing and signer recovery.
//!
//! Accepts the 65-byte `r || s || v` encoding and the 64-byte compact
//! [ERC-2098](https://eips.ethereum.org/EIPS/eip-2098) encoding. High-s
//! signatures are normalized to their low-s twin before recovery.

use alloy_primitives::{Address, B256, Signature};

/// Errors from parsing or recovering a signature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureFormatError {
    /// Neither 64 nor 65 bytes long.
    #[error("signature must be 64 or 65 bytes, got {0}")]
    InvalidLength(usize),
    /// The bytes do not form a valid secp256k1 signature.
    #[error("malformed signature: {0}")]
    Malformed(String),
    /// Public key recovery failed.
    #[error("signer recovery failed: {0}")]
    Recovery(String),
}

/// Parses a 65-byte or 64-byte signature.
///
/// # Errors
///
/// [`SignatureFormatError::InvalidLength`] or [`SignatureFormatError::Malformed`].
pub fn parse_signature(bytes: &[u8]) -> Result<Signature, SignatureFormatError> {
    let signature = match bytes.len() {
        65 => Signature::from_raw(bytes)
            .map_err(|e| SignatureFormatError::Malformed(e.to_string()))?,
        64 => Signature::from_erc2098(bytes),
        len => return Err(SignatureFormatError::InvalidLength(len)),
    };
    Ok(signature.normalized_s())
}

/// Recovers the address that signed `prehash`.
///
/// # Errors
///
/// Any [`SignatureFormatError`].
pub fn recover_signer(bytes: &[u8], prehash: &B256) -> Result<Address, SignatureFormatError> {
    parse_signature(bytes)?
        .recover_address_from_prehash(prehash)
        .map_err(|e| SignatureFormatError::Recovery(e.to_string()))
}
