//! Single-use signed permits gating inbound transfers.
//!
//! A permit lets `spender` pull `amount` of `token` from `owner` once, before
//! `deadline`. Redemption checks, in order and without side effects on failure:
//!
//! 1. `now <= deadline`
//! 2. `amount > 0`
//! 3. the owner's signature over the permit in the deployment domain
//! 4. the nonce is still unused for the owner
//!
//! Only then is the nonce consumed. [`PermitRedeemer::check`] runs the four
//! checks without consuming, so a caller that must move funds first (the
//! treasury) can consume the nonce only once the transfer has succeeded.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::amount::TokenAmount;
use crate::error::TreasuryError;
use crate::nonce::NonceRegistry;
use crate::signing::{SignatureVerifier, SigningDomain, TypedMessage};
use crate::timestamp::UnixTimestamp;

/// A delegated-transfer authorization signed by `owner`.
///
/// Constructed by the owner's wallet, presented once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitAuthorization {
    /// Token being moved.
    pub token: Address,
    /// Amount in the token's smallest unit.
    pub amount: TokenAmount,
    /// Account receiving custody of the funds.
    pub spender: Address,
    /// Signer and source of the funds.
    pub owner: Address,
    /// Unordered nonce (uint256 as decimal string).
    pub nonce: TokenAmount,
    /// Last second at which the permit may be redeemed (inclusive).
    pub deadline: UnixTimestamp,
}

impl PermitAuthorization {
    /// Returns the nonce as a raw 256-bit value.
    #[must_use]
    pub const fn nonce(&self) -> U256 {
        self.nonce.0
    }
}

/// Validates and consumes permits for one signing domain.
#[derive(Debug, Clone, Copy)]
pub struct PermitRedeemer<'a, V> {
    domain: &'a SigningDomain,
    verifier: &'a V,
}

impl<'a, V: SignatureVerifier> PermitRedeemer<'a, V> {
    /// Creates a redeemer bound to `domain`.
    pub const fn new(domain: &'a SigningDomain, verifier: &'a V) -> Self {
        Self { domain, verifier }
    }

    /// Runs every redemption check without consuming the nonce.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: [`TreasuryError::DeadlineExpired`],
    /// [`TreasuryError::AmountMustBeGreaterThanZero`],
    /// [`TreasuryError::InvalidSignature`] or [`TreasuryError::NonceAlreadyUsed`].
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        owner = %permit.owner,
        nonce = %permit.nonce,
    )))]
    pub fn check(
        &self,
        nonces: &NonceRegistry,
        permit: &PermitAuthorization,
        signature: &[u8],
        now: UnixTimestamp,
    ) -> Result<(), TreasuryError> {
        if now > permit.deadline {
            return Err(TreasuryError::DeadlineExpired {
                deadline: permit.deadline,
                now,
            });
        }
        if permit.amount.is_zero() {
            return Err(TreasuryError::AmountMustBeGreaterThanZero);
        }
        let message = TypedMessage::Permit(permit);
        if !self
            .verifier
            .verify(permit.owner, message, self.domain, signature)
        {
            return Err(TreasuryError::InvalidSignature);
        }
        if nonces.is_used(permit.owner, permit.nonce()) {
            return Err(TreasuryError::NonceAlreadyUsed {
                owner: permit.owner,
                nonce: permit.nonce(),
            });
        }
        Ok(())
    }

    /// Validates the permit and consumes its nonce, returning the permitted amount.
    ///
    /// # Errors
    ///
    /// See [`PermitRedeemer::check`]. On error the registry is unchanged.
    pub fn redeem(
        &self,
        nonces: &mut NonceRegistry,
        permit: &PermitAuthorization,
        signature: &[u8],
        now: UnixTimestamp,
    ) -> Result<TokenAmount, TreasuryError> {
        self.check(nonces, permit, signature, now)?;
        nonces.consume(permit.owner, permit.nonce())?;
        Ok(permit.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{ALICE, BOB, HashVerifier, USDC, VAULT, domain, sign};

    fn permit() -> PermitAuthorization {
        PermitAuthorization {
            token: USDC,
            amount: TokenAmount::from(100u64),
            spender: VAULT,
            owner: ALICE,
            nonce: TokenAmount::from(5u64),
            deadline: UnixTimestamp::from_secs(2000),
        }
    }

    fn signed(permit: &PermitAuthorization) -> Vec<u8> {
        sign(permit.owner, TypedMessage::Permit(permit), &domain())
    }

    #[test]
    fn test_redeem_consumes_nonce_once() {
        let domain = domain();
        let redeemer = PermitRedeemer::new(&domain, &HashVerifier);
        let mut nonces = NonceRegistry::new();
        let permit = permit();
        let signature = signed(&permit);

        let amount = redeemer
            .redeem(&mut nonces, &permit, &signature, UnixTimestamp::from_secs(1500))
            .unwrap();
        assert_eq!(amount, TokenAmount::from(100u64));
        assert!(nonces.is_used(ALICE, U256::from(5)));

        let replay =
            redeemer.redeem(&mut nonces, &permit, &signature, UnixTimestamp::from_secs(1500));
        assert_eq!(
            replay,
            Err(TreasuryError::NonceAlreadyUsed {
                owner: ALICE,
                nonce: U256::from(5)
            })
        );
    }

    #[test]
    fn test_deadline_is_inclusive() {
        let domain = domain();
        let redeemer = PermitRedeemer::new(&domain, &HashVerifier);
        let mut nonces = NonceRegistry::new();
        let permit = permit();
        let signature = signed(&permit);
        redeemer
            .redeem(&mut nonces, &permit, &signature, UnixTimestamp::from_secs(2000))
            .unwrap();
    }

    #[test]
    fn test_expired_permit_rejected_even_with_valid_signature() {
        let domain = domain();
        let redeemer = PermitRedeemer::new(&domain, &HashVerifier);
        let mut nonces = NonceRegistry::new();
        let permit = permit();
        let signature = signed(&permit);
        let err = redeemer
            .redeem(&mut nonces, &permit, &signature, UnixTimestamp::from_secs(2001))
            .unwrap_err();
        assert_eq!(err.reason(), crate::ErrorReason::DeadlineExpired);
        assert!(!nonces.is_used(ALICE, U256::from(5)));
    }

    #[test]
    fn test_expiry_is_checked_before_signature() {
        let domain = domain();
        let redeemer = PermitRedeemer::new(&domain, &HashVerifier);
        let nonces = NonceRegistry::new();
        let err = redeemer
            .check(&nonces, &permit(), b"garbage", UnixTimestamp::from_secs(3000))
            .unwrap_err();
        assert!(matches!(err, TreasuryError::DeadlineExpired { .. }));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let domain = domain();
        let redeemer = PermitRedeemer::new(&domain, &HashVerifier);
        let nonces = NonceRegistry::new();
        let mut permit = permit();
        permit.amount = TokenAmount::ZERO;
        let signature = signed(&permit);
        assert_eq!(
            redeemer.check(&nonces, &permit, &signature, UnixTimestamp::from_secs(1)),
            Err(TreasuryError::AmountMustBeGreaterThanZero)
        );
    }

    #[test]
    fn test_tampered_permit_fails_signature_and_keeps_nonce() {
        let domain = domain();
        let redeemer = PermitRedeemer::new(&domain, &HashVerifier);
        let mut nonces = NonceRegistry::new();
        let original = permit();
        let signature = signed(&original);

        let mut inflated = original;
        inflated.amount = TokenAmount::from(1_000_000u64);
        assert_eq!(
            redeemer.redeem(&mut nonces, &inflated, &signature, UnixTimestamp::from_secs(1)),
            Err(TreasuryError::InvalidSignature)
        );

        let mut redirected = original;
        redirected.spender = BOB;
        assert_eq!(
            redeemer.redeem(&mut nonces, &redirected, &signature, UnixTimestamp::from_secs(1)),
            Err(TreasuryError::InvalidSignature)
        );
        assert!(!nonces.is_used(ALICE, U256::from(5)));
    }

    #[test]
    fn test_signature_from_other_domain_rejected() {
        let mut foreign = domain();
        foreign.network_id = 1;
        let permit = permit();
        let signature = sign(permit.owner, TypedMessage::Permit(&permit), &foreign);

        let domain = domain();
        let redeemer = PermitRedeemer::new(&domain, &HashVerifier);
        let nonces = NonceRegistry::new();
        assert_eq!(
            redeemer.check(&nonces, &permit, &signature, UnixTimestamp::from_secs(1)),
            Err(TreasuryError::InvalidSignature)
        );
    }
}
