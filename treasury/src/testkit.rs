//! Deterministic stand-in for a real signature scheme.
//!
//! A "signature" is `keccak256(signer || json(message) || json(domain))`, so
//! any change to the signer, a message field, or the domain breaks it.

use alloy_primitives::{Address, address, keccak256};

use crate::signing::{SignatureVerifier, SigningDomain, TypedMessage};

pub(crate) const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
pub(crate) const BOB: Address = address!("0x0000000000000000000000000000000000000b0b");
pub(crate) const CAROL: Address = address!("0x000000000000000000000000000000000000ca01");
pub(crate) const DAVE: Address = address!("0x000000000000000000000000000000000000da7e");
pub(crate) const CUSTODIAN: Address = address!("0x000000000000000000000000000000000000c057");
pub(crate) const USDC: Address = address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
pub(crate) const VAULT: Address = address!("0x0000000000000000000000000000000000000fa7");

pub(crate) fn domain() -> SigningDomain {
    SigningDomain {
        name: "Treasury".into(),
        version: "1".into(),
        network_id: 31_337,
        verifying_contract: VAULT,
    }
}

pub(crate) fn sign(signer: Address, message: TypedMessage<'_>, domain: &SigningDomain) -> Vec<u8> {
    let mut preimage = signer.to_vec();
    preimage.extend(serde_json::to_vec(&message).unwrap());
    preimage.extend(serde_json::to_vec(domain).unwrap());
    keccak256(preimage).to_vec()
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct HashVerifier;

impl SignatureVerifier for HashVerifier {
    fn verify(
        &self,
        signer: Address,
        message: TypedMessage<'_>,
        domain: &SigningDomain,
        signature: &[u8],
    ) -> bool {
        sign(signer, message, domain) == signature
    }
}
