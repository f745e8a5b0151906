//! EIP-712 implementation of [`SignatureVerifier`].

use alloy_primitives::{Address, B256};
use alloy_sol_types::SolStruct;
use treasury::{SignatureVerifier, SigningDomain, TypedMessage};

use crate::domain::eip712_domain;
use crate::signature::recover_signer;
use crate::types::{IntentApproval, PermitTransferFrom};

/// Verifies EOA signatures over EIP-712 typed data.
#[derive(Debug, Clone, Copy, Default)]
pub struct Eip712Verifier;

impl Eip712Verifier {
    /// The EIP-712 digest a wallet signs for `message` in `domain`.
    #[must_use]
    pub fn signing_hash(message: TypedMessage<'_>, domain: &SigningDomain) -> B256 {
        let domain = eip712_domain(domain);
        match message {
            TypedMessage::Permit(permit) => {
                PermitTransferFrom::from(permit).eip712_signing_hash(&domain)
            }
            TypedMessage::IntentApproval(approval) => {
                IntentApproval::from(approval).eip712_signing_hash(&domain)
            }
        }
    }
}

impl SignatureVerifier for Eip712Verifier {
    fn verify(
        &self,
        signer: Address,
        message: TypedMessage<'_>,
        domain: &SigningDomain,
        signature: &[u8],
    ) -> bool {
        let hash = Self::signing_hash(message, domain);
        match recover_signer(signature, &hash) {
            Ok(recovered) => recovered == signer,
            Err(error) => {
                #[cfg(feature = "telemetry")]
                tracing::debug!(%error, %signer, "signature rejected");
                #[cfg(not(feature = "telemetry"))]
                let _ = error;
                false
            }
        }
    }
}
