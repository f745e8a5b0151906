//! The treasury facade: one owner of all authorization state.
//!
//! [`Treasury`] ties the nonce registry, multisig policy and intent scheduler
//! to a signing domain, a verifier and a ledger. Every mutating operation
//! takes `&mut self`, so a host that shares a treasury across tasks must
//! serialize access (the server uses a single mutex). Each operation either
//! applies all of its state changes or none.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::amount::TokenAmount;
use crate::config::TreasuryConfig;
use crate::error::TreasuryError;
use crate::intent::{
    ApprovalReceipt, Approver, ExecutionReceipt, Intent, IntentId, IntentScheduler, SignedApproval,
};
use crate::ledger::{self, Ledger};
use crate::nonce::NonceRegistry;
use crate::permit::{PermitAuthorization, PermitRedeemer};
use crate::policy::{MultiSigPolicy, PolicyChange};
use crate::signing::{SignatureVerifier, SigningDomain};
use crate::timestamp::UnixTimestamp;

/// Outcome of a successful deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositReceipt {
    /// Token moved.
    pub token: Address,
    /// Debited account.
    pub owner: Address,
    /// Credited account.
    pub spender: Address,
    /// Amount moved.
    pub amount: TokenAmount,
    /// Nonce consumed by the deposit.
    pub nonce: TokenAmount,
}

/// Outcome of intent creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentCreated {
    /// Assigned id.
    pub intent_id: IntentId,
    /// Creator.
    pub user: Address,
    /// Payee.
    pub to: Address,
    /// Amount per execution.
    pub amount: TokenAmount,
    /// First due time.
    pub next_execution_time: UnixTimestamp,
    /// Seconds between executions; `0` for one-shot.
    pub recurring_interval: u64,
}

impl From<&Intent> for IntentCreated {
    fn from(intent: &Intent) -> Self {
        Self {
            intent_id: intent.id,
            user: intent.user,
            to: intent.to,
            amount: intent.amount,
            next_execution_time: intent.next_execution_time,
            recurring_interval: intent.recurring_interval,
        }
    }
}

/// Outcome of a nonce invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoncesInvalidated {
    /// Owner whose nonces were burned.
    pub owner: Address,
    /// Word index.
    pub word: U256,
    /// Bits requested.
    pub mask: U256,
    /// Resulting bitmap word.
    pub bitmap: U256,
}

/// A custodial treasury for one asset.
#[derive(Debug)]
pub struct Treasury<V, L> {
    domain: SigningDomain,
    asset: Address,
    custody: Address,
    verifier: V,
    ledger: L,
    nonces: NonceRegistry,
    policy: MultiSigPolicy,
    intents: IntentScheduler,
}

impl<V: SignatureVerifier, L: Ledger> Treasury<V, L> {
    /// Builds a treasury from its deployment configuration.
    ///
    /// # Errors
    ///
    /// [`TreasuryError::InvalidConfig`] or [`TreasuryError::InvalidThreshold`]
    /// when the multisig settings are inconsistent.
    pub fn new(config: TreasuryConfig, verifier: V, ledger: L) -> Result<Self, TreasuryError> {
        let policy = MultiSigPolicy::new(config.multisig)?;
        Ok(Self {
            domain: config.domain,
            asset: config.asset,
            custody: config.custody,
            verifier,
            ledger,
            nonces: NonceRegistry::new(),
            policy,
            intents: IntentScheduler::new(config.first_execution),
        })
    }

    /// Redeems a permit and moves the permitted amount from its owner to its spender.
    ///
    /// The nonce is consumed only after the ledger accepted the transfer, so a
    /// rejected transfer leaves the permit redeemable.
    ///
    /// # Errors
    ///
    /// Any permit check failure (see [`PermitRedeemer::check`]),
    /// [`TreasuryError::AssetMismatch`], or a ledger failure such as
    /// [`TreasuryError::InsufficientBalance`].
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        owner = %permit.owner,
        spender = %permit.spender,
        amount = %permit.amount,
    )))]
    pub fn deposit(
        &mut self,
        permit: &PermitAuthorization,
        signature: &[u8],
        now: UnixTimestamp,
    ) -> Result<DepositReceipt, TreasuryError> {
        PermitRedeemer::new(&self.domain, &self.verifier).check(
            &self.nonces,
            permit,
            signature,
            now,
        )?;
        if permit.token != self.asset {
            return Err(TreasuryError::AssetMismatch {
                expected: self.asset,
                actual: permit.token,
            });
        }
        ledger::transfer(&mut self.ledger, permit.owner, permit.spender, permit.amount)?;
        self.nonces.consume(permit.owner, permit.nonce())?;

        #[cfg(feature = "telemetry")]
        tracing::info!(nonce = %permit.nonce, "permit redeemed");

        Ok(DepositReceipt {
            token: permit.token,
            owner: permit.owner,
            spender: permit.spender,
            amount: permit.amount,
            nonce: permit.nonce,
        })
    }

    /// Creates an intent due according to the configured first-execution policy.
    ///
    /// # Errors
    ///
    /// See [`IntentScheduler::create_intent`].
    pub fn create_intent(
        &mut self,
        user: Address,
        to: Address,
        amount: TokenAmount,
        recurring_interval: u64,
        now: UnixTimestamp,
    ) -> Result<IntentCreated, TreasuryError> {
        let intent = self
            .intents
            .create_intent(user, to, amount, recurring_interval, now)?;
        Ok(IntentCreated::from(&intent))
    }

    /// Creates an intent first due at `start`.
    ///
    /// # Errors
    ///
    /// See [`IntentScheduler::create_intent_at`].
    pub fn create_intent_at(
        &mut self,
        user: Address,
        to: Address,
        amount: TokenAmount,
        recurring_interval: u64,
        start: UnixTimestamp,
        now: UnixTimestamp,
    ) -> Result<IntentCreated, TreasuryError> {
        let intent = self
            .intents
            .create_intent_at(user, to, amount, recurring_interval, start, now)?;
        Ok(IntentCreated::from(&intent))
    }

    /// Records an owner approval.
    ///
    /// # Errors
    ///
    /// See [`IntentScheduler::approve`].
    pub fn approve_intent(
        &mut self,
        id: IntentId,
        signer: Address,
        signature: &[u8],
    ) -> Result<ApprovalReceipt, TreasuryError> {
        let approver = Approver {
            policy: &self.policy,
            verifier: &self.verifier,
            domain: &self.domain,
        };
        self.intents.approve(id, signer, signature, &approver)
    }

    /// Records several owner approvals, all or none.
    ///
    /// # Errors
    ///
    /// See [`IntentScheduler::approve_batch`].
    pub fn approve_intent_batch(
        &mut self,
        id: IntentId,
        approvals: &[SignedApproval],
    ) -> Result<ApprovalReceipt, TreasuryError> {
        let approver = Approver {
            policy: &self.policy,
            verifier: &self.verifier,
            domain: &self.domain,
        };
        self.intents.approve_batch(id, approvals, &approver)
    }

    /// Pays a due, approved intent out of the custody account.
    ///
    /// # Errors
    ///
    /// See [`IntentScheduler::execute`].
    pub fn execute_intent(
        &mut self,
        id: IntentId,
        now: UnixTimestamp,
    ) -> Result<ExecutionReceipt, TreasuryError> {
        self.intents
            .execute(id, now, &self.policy, &mut self.ledger, self.custody)
    }

    /// Adds an owner. Custodian only.
    ///
    /// # Errors
    ///
    /// See [`MultiSigPolicy::add_owner`].
    pub fn add_owner(
        &mut self,
        caller: Address,
        owner: Address,
    ) -> Result<PolicyChange, TreasuryError> {
        self.policy.add_owner(caller, owner)
    }

    /// Removes an owner and discards the approvals it gave to active intents.
    /// Custodian only.
    ///
    /// # Errors
    ///
    /// See [`MultiSigPolicy::remove_owner`].
    pub fn remove_owner(
        &mut self,
        caller: Address,
        owner: Address,
    ) -> Result<PolicyChange, TreasuryError> {
        let change = self.policy.remove_owner(caller, owner)?;
        self.intents.revoke_approvals(owner);
        Ok(change)
    }

    /// Changes the quorum. Custodian only.
    ///
    /// # Errors
    ///
    /// See [`MultiSigPolicy::change_required_signatures`].
    pub fn change_required_signatures(
        &mut self,
        caller: Address,
        required: usize,
    ) -> Result<PolicyChange, TreasuryError> {
        self.policy.change_required_signatures(caller, required)
    }

    /// Changes the single-approval value threshold. Custodian only.
    ///
    /// # Errors
    ///
    /// See [`MultiSigPolicy::change_value_threshold`].
    pub fn change_value_threshold(
        &mut self,
        caller: Address,
        threshold: TokenAmount,
    ) -> Result<PolicyChange, TreasuryError> {
        self.policy.change_value_threshold(caller, threshold)
    }

    /// Burns the nonces selected by `mask` in one of `owner`'s bitmap words.
    pub fn invalidate_nonces(&mut self, owner: Address, word: U256, mask: U256) -> NoncesInvalidated {
        let bitmap = self.nonces.invalidate(owner, word, mask);
        NoncesInvalidated {
            owner,
            word,
            mask,
            bitmap,
        }
    }

    /// Lowest unused nonce in `owner`'s bitmap word. Advisory only.
    ///
    /// # Errors
    ///
    /// [`TreasuryError::NoAvailableNonce`] when the word is full.
    pub fn next_unused_nonce(&self, owner: Address, word: U256) -> Result<U256, TreasuryError> {
        self.nonces.next_unused_nonce(owner, word)
    }

    /// Ledger balance of `account`.
    #[must_use]
    pub fn balance_of(&self, account: Address) -> TokenAmount {
        self.ledger.balance_of(account)
    }

    /// The signing domain.
    #[must_use]
    pub const fn domain(&self) -> &SigningDomain {
        &self.domain
    }

    /// The accepted asset.
    #[must_use]
    pub const fn asset(&self) -> Address {
        self.asset
    }

    /// The custody account.
    #[must_use]
    pub const fn custody(&self) -> Address {
        self.custody
    }

    /// Current multisig policy.
    #[must_use]
    pub const fn policy(&self) -> &MultiSigPolicy {
        &self.policy
    }

    /// Active intents.
    #[must_use]
    pub const fn intents(&self) -> &IntentScheduler {
        &self.intents
    }

    /// Nonce bitmaps.
    #[must_use]
    pub const fn nonces(&self) -> &NonceRegistry {
        &self.nonces
    }

    /// The underlying ledger.
    #[must_use]
    pub const fn ledger(&self) -> &L {
        &self.ledger
    }
}
