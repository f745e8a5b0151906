//! Wallet-side signing of permits and intent approvals.
//!
//! The helpers here produce exactly the digests [`Eip712Verifier`] checks, so
//! a depositor or owner can build a request for the treasury without knowing
//! the EIP-712 layout.

use std::future::Future;
use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes, Signature, U256};
use alloy_signer_local::PrivateKeySigner;
use rand::RngExt;
use rand::rng;
use serde::{Deserialize, Serialize};
use treasury::{
    Intent, PermitAuthorization, SignedApproval, SigningDomain, TokenAmount, TypedMessage,
    UnixTimestamp,
};

use crate::verifier::Eip712Verifier;

/// Abstracts over owned and `Arc`-shared signers.
///
/// Alloy's `Signer` trait is not implemented for `Arc<T>`, and
/// `PrivateKeySigner` is commonly shared that way.
pub trait SignerLike: Send + Sync {
    /// Address of the signer.
    fn address(&self) -> Address;

    /// Signs a 32-byte digest.
    fn sign_hash(
        &self,
        hash: &B256,
    ) -> impl Future<Output = Result<Signature, alloy_signer::Error>> + Send;
}

impl SignerLike for PrivateKeySigner {
    fn address(&self) -> Address {
        Self::address(self)
    }

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
        alloy_signer::Signer::sign_hash(self, hash).await
    }
}

impl<T: SignerLike + Send + Sync> SignerLike for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    async fn sign_hash(&self, hash: &B256) -> Result<Signature, alloy_signer::Error> {
        (**self).sign_hash(hash).await
    }
}

/// Errors from the signing helpers.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The underlying signer failed.
    #[error("signing failed: {0}")]
    Signing(#[from] alloy_signer::Error),
}

/// What a depositor wants to authorize.
#[derive(Debug, Clone, Copy)]
pub struct PermitParams {
    /// Token to move.
    pub token: Address,
    /// Amount in the token's smallest unit.
    pub amount: TokenAmount,
    /// Account receiving custody.
    pub spender: Address,
    /// Last second the permit is redeemable.
    pub deadline: UnixTimestamp,
}

/// A permit together with its owner's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPermit {
    /// The authorization.
    pub permit: PermitAuthorization,
    /// `0x`-hex signature.
    pub signature: Bytes,
}

/// Random unordered nonce.
///
/// Collisions across 2^256 values are negligible, so wallets that do not
/// track their bitmap can use this instead of
/// [`Treasury::next_unused_nonce`](treasury::Treasury::next_unused_nonce).
#[must_use]
pub fn random_nonce() -> U256 {
    let bytes: [u8; 32] = rng().random();
    U256::from_be_bytes(bytes)
}

/// Signs a permit with a random nonce.
///
/// # Errors
///
/// [`ClientError::Signing`].
pub async fn sign_permit<S: SignerLike>(
    signer: &S,
    params: &PermitParams,
    domain: &SigningDomain,
) -> Result<SignedPermit, ClientError> {
    sign_permit_with_nonce(signer, params, random_nonce(), domain).await
}

/// Signs a permit with an explicit nonce.
///
/// # Errors
///
/// [`ClientError::Signing`].
pub async fn sign_permit_with_nonce<S: SignerLike>(
    signer: &S,
    params: &PermitParams,
    nonce: U256,
    domain: &SigningDomain,
) -> Result<SignedPermit, ClientError> {
    let permit = PermitAuthorization {
        token: params.token,
        amount: params.amount,
        spender: params.spender,
        owner: signer.address(),
        nonce: nonce.into(),
        deadline: params.deadline,
    };
    let hash = Eip712Verifier::signing_hash(TypedMessage::Permit(&permit), domain);
    let signature = signer.sign_hash(&hash).await?;
    Ok(SignedPermit {
        permit,
        signature: signature.as_bytes().into(),
    })
}

/// Signs an owner approval of the current round of `intent`.
///
/// The signature stops verifying once the intent executes and rearms.
///
/// # Errors
///
/// [`ClientError::Signing`].
pub async fn sign_intent_approval<S: SignerLike>(
    signer: &S,
    intent: &Intent,
    domain: &SigningDomain,
) -> Result<SignedApproval, ClientError> {
    let approval = intent.approval_message();
    let hash = Eip712Verifier::signing_hash(TypedMessage::IntentApproval(&approval), domain);
    let signature = signer.sign_hash(&hash).await?;
    Ok(SignedApproval {
        signer: signer.address(),
        signature: signature.as_bytes().into(),
    })
}
