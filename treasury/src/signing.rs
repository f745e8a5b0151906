//! Structured-signing domain and the signature verification seam.
//!
//! Two message kinds are signed off-core: permits (by a depositor) and intent
//! approvals (by multisig owners). Both are always verified together with a
//! [`SigningDomain`], so a signature produced for one deployment, network or
//! version is worthless in any other.
//!
//! The concrete cryptography lives behind [`SignatureVerifier`]; the EVM
//! implementation hashes messages as EIP-712 typed data.

use std::sync::Arc;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;
use crate::intent::IntentId;
use crate::permit::PermitAuthorization;

/// Deployment identity every signed message is bound to.
///
/// Changing any field invalidates all previously issued, unconsumed
/// signatures for the old domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningDomain {
    /// Human-readable deployment name.
    pub name: String,
    /// Deployment version.
    pub version: String,
    /// Network (chain) identity, e.g. `8453`.
    pub network_id: u64,
    /// Identity of the verifying contract or service.
    pub verifying_contract: Address,
}

/// Owner approval of one intent round: the canonical `(to, amount)` tuple
/// bound to the intent id and the number of executions already completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentApproval {
    /// Intent being approved.
    pub intent_id: IntentId,
    /// Payee of the intent.
    pub to: Address,
    /// Amount per execution.
    pub amount: TokenAmount,
    /// Executions completed before this round.
    pub round: u64,
}

/// A message kind together with its fields, as handed to a verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypedMessage<'a> {
    /// A single-use delegated-transfer permit.
    Permit(&'a PermitAuthorization),
    /// An owner approval of an intent.
    IntentApproval(&'a IntentApproval),
}

/// Validates that `signature` over `message` in `domain` was produced by `signer`.
///
/// Implementations are read-only and side-effect free. Malformed encodings,
/// failed recovery and signer mismatch all yield `false`; a verifier never
/// panics on attacker-controlled input.
pub trait SignatureVerifier {
    /// Returns `true` iff `signature` is a valid signature by `signer`.
    fn verify(
        &self,
        signer: Address,
        message: TypedMessage<'_>,
        domain: &SigningDomain,
        signature: &[u8],
    ) -> bool;
}

impl<T: SignatureVerifier + ?Sized> SignatureVerifier for &T {
    fn verify(
        &self,
        signer: Address,
        message: TypedMessage<'_>,
        domain: &SigningDomain,
        signature: &[u8],
    ) -> bool {
        (**self).verify(signer, message, domain, signature)
    }
}

impl<T: SignatureVerifier + ?Sized> SignatureVerifier for Arc<T> {
    fn verify(
        &self,
        signer: Address,
        message: TypedMessage<'_>,
        domain: &SigningDomain,
        signature: &[u8],
    ) -> bool {
        (**self).verify(signer, message, domain, signature)
    }
}
