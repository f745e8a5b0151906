//! Recurring and one-shot payment intents.
//!
//! Lifecycle:
//!
//! ```text
//! create ──► Approving ──(approvals >= required)──► Executable ──execute──┐
//!               ▲                                                         │
//!               └──────────── rearm (interval > 0, approvals cleared) ◄───┤
//!                                                                         └─► Executed (interval == 0, removed)
//! ```
//!
//! The required approval count is never stored: it is recomputed from the
//! current [`MultiSigPolicy`] at approval time and again at execution time,
//! so a later quorum or threshold change alters how many more approvals are
//! needed without discarding the ones already recorded. Only approvals from
//! accounts that are still owners count toward the quorum.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use alloy_primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};
#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::amount::TokenAmount;
use crate::error::TreasuryError;
use crate::ledger::{self, Ledger};
use crate::policy::MultiSigPolicy;
use crate::signing::{IntentApproval, SignatureVerifier, SigningDomain, TypedMessage};
use crate::timestamp::UnixTimestamp;

/// Monotonically assigned intent identifier. The first intent gets id `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentId(pub u64);

impl Display for IntentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an intent sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Collecting owner approvals.
    Approving,
    /// Enough approvals for the current policy; waiting for execution.
    Executable,
    /// One-shot intent executed and removed.
    Executed,
}

/// When a freshly created intent first becomes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstExecution {
    /// Due at creation time.
    #[default]
    Immediate,
    /// Due one interval after creation.
    AfterInterval,
}

/// A payment instruction owned by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    /// Identifier.
    pub id: IntentId,
    /// Account that created the intent.
    pub user: Address,
    /// Payee.
    pub to: Address,
    /// Amount paid per execution.
    pub amount: TokenAmount,
    /// Earliest time of the next execution.
    pub next_execution_time: UnixTimestamp,
    /// Seconds between executions; `0` means one-shot.
    pub recurring_interval: u64,
    /// Completed executions.
    pub execution_count: u64,
    /// Owners that approved the current round.
    pub approvals: BTreeSet<Address>,
}

impl Intent {
    /// Returns `true` for intents that rearm after execution.
    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        self.recurring_interval > 0
    }

    /// The message owners sign to approve the current round of this intent.
    #[must_use]
    pub const fn approval_message(&self) -> IntentApproval {
        IntentApproval {
            intent_id: self.id,
            to: self.to,
            amount: self.amount,
            round: self.execution_count,
        }
    }

    /// Recorded approvals that belong to current owners.
    #[must_use]
    pub fn counted_approvals(&self, policy: &MultiSigPolicy) -> usize {
        self.approvals
            .iter()
            .filter(|signer| policy.is_owner(**signer))
            .count()
    }

    /// Status under `policy`.
    #[must_use]
    pub fn status(&self, policy: &MultiSigPolicy) -> IntentStatus {
        if self.counted_approvals(policy) >= policy.required_approvals(self.amount) {
            IntentStatus::Executable
        } else {
            IntentStatus::Approving
        }
    }
}

/// One owner's signature over an intent approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedApproval {
    /// Claimed signer.
    pub signer: Address,
    /// Signature bytes.
    pub signature: Bytes,
}

/// Outcome of an approval call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalReceipt {
    /// Approved intent.
    pub intent_id: IntentId,
    /// Signers recorded by this call.
    pub signers: Vec<Address>,
    /// Approvals from current owners after this call.
    pub approvals: usize,
    /// Approvals the intent needs under the current policy.
    pub required: usize,
    /// Status after this call.
    pub status: IntentStatus,
}

/// Outcome of a successful execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReceipt {
    /// Executed intent.
    pub intent_id: IntentId,
    /// Account debited.
    pub from: Address,
    /// Payee credited.
    pub to: Address,
    /// Amount moved.
    pub amount: TokenAmount,
    /// Executions completed, including this one.
    pub execution_count: u64,
    /// Next due time for rearmed intents; `None` once finalized.
    pub next_execution_time: Option<UnixTimestamp>,
    /// [`IntentStatus::Approving`] when rearmed, [`IntentStatus::Executed`] when finalized.
    pub status: IntentStatus,
}

/// What an approval is checked against: the owner set and the signing domain.
#[derive(Debug, Clone, Copy)]
pub struct Approver<'a, V> {
    /// Current multisig policy.
    pub policy: &'a MultiSigPolicy,
    /// Signature verifier.
    pub verifier: &'a V,
    /// Signing domain approvals are bound to.
    pub domain: &'a SigningDomain,
}

impl<V: SignatureVerifier> Approver<'_, V> {
    fn check(
        &self,
        intent: &Intent,
        signer: Address,
        signature: &[u8],
    ) -> Result<(), TreasuryError> {
        if !self.policy.is_owner(signer) {
            return Err(TreasuryError::UnauthorizedSigner(signer));
        }
        let message = intent.approval_message();
        if !self.verifier.verify(
            signer,
            TypedMessage::IntentApproval(&message),
            self.domain,
            signature,
        ) {
            return Err(TreasuryError::InvalidSignature);
        }
        if intent.approvals.contains(&signer) {
            return Err(TreasuryError::AlreadySigned(signer));
        }
        Ok(())
    }
}

/// Owns every active intent.
#[derive(Debug, Clone)]
pub struct IntentScheduler {
    intents: BTreeMap<IntentId, Intent>,
    next_id: u64,
    first_execution: FirstExecution,
}

impl Default for IntentScheduler {
    fn default() -> Self {
        Self::new(FirstExecution::default())
    }
}

impl IntentScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub const fn new(first_execution: FirstExecution) -> Self {
        Self {
            intents: BTreeMap::new(),
            next_id: 1,
            first_execution,
        }
    }

    /// Creates an intent whose first due time follows the scheduler's
    /// [`FirstExecution`] policy.
    ///
    /// # Errors
    ///
    /// [`TreasuryError::AmountMustBeGreaterThanZero`] or
    /// [`TreasuryError::AmountOverflow`] if the first due time overflows.
    pub fn create_intent(
        &mut self,
        user: Address,
        to: Address,
        amount: TokenAmount,
        recurring_interval: u64,
        now: UnixTimestamp,
    ) -> Result<Intent, TreasuryError> {
        let start = match self.first_execution {
            FirstExecution::Immediate => now,
            FirstExecution::AfterInterval => now
                .checked_add(recurring_interval)
                .ok_or(TreasuryError::AmountOverflow)?,
        };
        self.create_intent_at(user, to, amount, recurring_interval, start, now)
    }

    /// Creates an intent first due at `start`.
    ///
    /// # Errors
    ///
    /// [`TreasuryError::AmountMustBeGreaterThanZero`], or
    /// [`TreasuryError::ExecutionTimeNotReached`] when `start` is in the past.
    pub fn create_intent_at(
        &mut self,
        user: Address,
        to: Address,
        amount: TokenAmount,
        recurring_interval: u64,
        start: UnixTimestamp,
        now: UnixTimestamp,
    ) -> Result<Intent, TreasuryError> {
        if amount.is_zero() {
            return Err(TreasuryError::AmountMustBeGreaterThanZero);
        }
        if start < now {
            return Err(TreasuryError::ExecutionTimeNotReached {
                next_execution_time: start,
                now,
            });
        }
        let id = IntentId(self.next_id);
        self.next_id += 1;
        let intent = Intent {
            id,
            user,
            to,
            amount,
            next_execution_time: start,
            recurring_interval,
            execution_count: 0,
            approvals: BTreeSet::new(),
        };
        self.intents.insert(id, intent.clone());
        Ok(intent)
    }

    /// Returns an active intent.
    #[must_use]
    pub fn intent(&self, id: IntentId) -> Option<&Intent> {
        self.intents.get(&id)
    }

    /// Iterates over active intents in id order.
    pub fn active_intents(&self) -> impl Iterator<Item = &Intent> {
        self.intents.values()
    }

    /// Status of an active intent under `policy`.
    ///
    /// # Errors
    ///
    /// [`TreasuryError::IntentNotFound`].
    pub fn status(
        &self,
        id: IntentId,
        policy: &MultiSigPolicy,
    ) -> Result<IntentStatus, TreasuryError> {
        Ok(self.get(id)?.status(policy))
    }

    /// Approvals still missing before the intent becomes executable.
    ///
    /// # Errors
    ///
    /// [`TreasuryError::IntentNotFound`].
    pub fn approvals_needed(
        &self,
        id: IntentId,
        policy: &MultiSigPolicy,
    ) -> Result<usize, TreasuryError> {
        let intent = self.get(id)?;
        Ok(policy
            .required_approvals(intent.amount)
            .saturating_sub(intent.counted_approvals(policy)))
    }

    /// Records one owner approval.
    ///
    /// # Errors
    ///
    /// [`TreasuryError::IntentNotFound`], [`TreasuryError::UnauthorizedSigner`],
    /// [`TreasuryError::InvalidSignature`] or [`TreasuryError::AlreadySigned`].
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(intent = %id, signer = %signer)))]
    pub fn approve<V: SignatureVerifier>(
        &mut self,
        id: IntentId,
        signer: Address,
        signature: &[u8],
        approver: &Approver<'_, V>,
    ) -> Result<ApprovalReceipt, TreasuryError> {
        let intent = self.get(id)?;
        approver.check(intent, signer, signature)?;
        self.record(id, vec![signer], approver.policy)
    }

    /// Records several owner approvals at once.
    ///
    /// Every entry is validated before any is recorded, so the call either
    /// records all of them or none. A signer appearing twice in the batch is
    /// rejected with [`TreasuryError::AlreadySigned`].
    ///
    /// # Errors
    ///
    /// The first failing entry's error, as for [`IntentScheduler::approve`].
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(intent = %id, count = approvals.len())))]
    pub fn approve_batch<V: SignatureVerifier>(
        &mut self,
        id: IntentId,
        approvals: &[SignedApproval],
        approver: &Approver<'_, V>,
    ) -> Result<ApprovalReceipt, TreasuryError> {
        let intent = self.get(id)?;
        let mut signers = Vec::with_capacity(approvals.len());
        for approval in approvals {
            approver.check(intent, approval.signer, &approval.signature)?;
            if signers.contains(&approval.signer) {
                return Err(TreasuryError::AlreadySigned(approval.signer));
            }
            signers.push(approval.signer);
        }
        self.record(id, signers, approver.policy)
    }

    /// Executes a due, sufficiently approved intent by moving `amount` from
    /// `source` to the payee.
    ///
    /// Recurring intents are rearmed (`next_execution_time += interval`,
    /// approvals cleared); one-shot intents are removed.
    ///
    /// # Errors
    ///
    /// [`TreasuryError::IntentNotFound`], [`TreasuryError::ExecutionTimeNotReached`],
    /// [`TreasuryError::InsufficientApprovals`], or the ledger's
    /// [`TreasuryError::InsufficientBalance`]. The intent is untouched on error.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(intent = %id, now = %now)))]
    pub fn execute<L: Ledger + ?Sized>(
        &mut self,
        id: IntentId,
        now: UnixTimestamp,
        policy: &MultiSigPolicy,
        ledger: &mut L,
        source: Address,
    ) -> Result<ExecutionReceipt, TreasuryError> {
        let intent = self.get(id)?;
        if now < intent.next_execution_time {
            return Err(TreasuryError::ExecutionTimeNotReached {
                next_execution_time: intent.next_execution_time,
                now,
            });
        }
        let need = policy.required_approvals(intent.amount);
        let have = intent.counted_approvals(policy);
        if have < need {
            return Err(TreasuryError::InsufficientApprovals { have, need });
        }
        let execution_count = intent
            .execution_count
            .checked_add(1)
            .ok_or(TreasuryError::AmountOverflow)?;
        let next_execution_time = if intent.is_recurring() {
            Some(
                intent
                    .next_execution_time
                    .checked_add(intent.recurring_interval)
                    .ok_or(TreasuryError::AmountOverflow)?,
            )
        } else {
            None
        };
        let (to, amount) = (intent.to, intent.amount);

        ledger::transfer(ledger, source, to, amount)?;

        let status = if let Some(next) = next_execution_time {
            let intent = self
                .intents
                .get_mut(&id)
                .ok_or(TreasuryError::IntentNotFound(id))?;
            intent.execution_count = execution_count;
            intent.next_execution_time = next;
            intent.approvals.clear();
            IntentStatus::Approving
        } else {
            self.intents.remove(&id);
            IntentStatus::Executed
        };

        Ok(ExecutionReceipt {
            intent_id: id,
            from: source,
            to,
            amount,
            execution_count,
            next_execution_time,
            status,
        })
    }

    /// Drops `owner`'s approvals from every active intent.
    pub fn revoke_approvals(&mut self, owner: Address) {
        for intent in self.intents.values_mut() {
            intent.approvals.remove(&owner);
        }
    }

    fn get(&self, id: IntentId) -> Result<&Intent, TreasuryError> {
        self.intents
            .get(&id)
            .ok_or(TreasuryError::IntentNotFound(id))
    }

    fn record(
        &mut self,
        id: IntentId,
        signers: Vec<Address>,
        policy: &MultiSigPolicy,
    ) -> Result<ApprovalReceipt, TreasuryError> {
        let intent = self
            .intents
            .get_mut(&id)
            .ok_or(TreasuryError::IntentNotFound(id))?;
        intent.approvals.extend(signers.iter().copied());
        Ok(ApprovalReceipt {
            intent_id: id,
            signers,
            approvals: intent.counted_approvals(policy),
            required: policy.required_approvals(intent.amount),
            status: intent.status(policy),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::policy::MultiSigConfig;
    use crate::testkit::{
        ALICE, BOB, CAROL, CUSTODIAN, DAVE, HashVerifier, VAULT, domain, sign,
    };

    const PAYEE: Address = alloy_primitives::address!("0x00000000000000000000000000000000000000ee");

    fn policy() -> MultiSigPolicy {
        MultiSigPolicy::new(MultiSigConfig {
            owners: vec![ALICE, BOB, CAROL],
            required_signatures: 2,
            custodian: CUSTODIAN,
            value_threshold: TokenAmount::from(1000u64),
        })
        .unwrap()
    }

    fn approval_sig(intent: &Intent, signer: Address) -> Vec<u8> {
        let message = intent.approval_message();
        sign(signer, TypedMessage::IntentApproval(&message), &domain())
    }

    fn funded() -> MemoryLedger {
        MemoryLedger::with_balances([(VAULT, TokenAmount::from(1_000_000u64))])
    }

    #[test]
    fn test_create_rejects_zero_amount() {
        let mut scheduler = IntentScheduler::default();
        assert_eq!(
            scheduler.create_intent(DAVE, PAYEE, TokenAmount::ZERO, 0, UnixTimestamp::from_secs(1)),
            Err(TreasuryError::AmountMustBeGreaterThanZero)
        );
    }

    #[test]
    fn test_ids_are_monotonic_from_one() {
        let mut scheduler = IntentScheduler::default();
        let now = UnixTimestamp::from_secs(10);
        let a = scheduler.create_intent(DAVE, PAYEE, 1u64.into(), 0, now).unwrap();
        let b = scheduler.create_intent(DAVE, PAYEE, 1u64.into(), 0, now).unwrap();
        assert_eq!(a.id, IntentId(1));
        assert_eq!(b.id, IntentId(2));
        assert_eq!(a.next_execution_time, now);
        assert!(a.approvals.is_empty());
    }

    #[test]
    fn test_after_interval_policy_delays_first_execution() {
        let mut scheduler = IntentScheduler::new(FirstExecution::AfterInterval);
        let intent = scheduler
            .create_intent(DAVE, PAYEE, 1u64.into(), 3600, UnixTimestamp::from_secs(100))
            .unwrap();
        assert_eq!(intent.next_execution_time, UnixTimestamp::from_secs(3700));
    }

    #[test]
    fn test_create_at_rejects_past_start() {
        let mut scheduler = IntentScheduler::default();
        let err = scheduler
            .create_intent_at(
                DAVE,
                PAYEE,
                1000u64.into(),
                0,
                UnixTimestamp::from_secs(100),
                UnixTimestamp::from_secs(3700),
            )
            .unwrap_err();
        assert!(matches!(err, TreasuryError::ExecutionTimeNotReached { .. }));
        assert_eq!(scheduler.active_intents().count(), 0);
    }

    #[test]
    fn test_small_intent_executable_after_one_approval() {
        let policy = policy();
        let domain = domain();
        let approver = Approver {
            policy: &policy,
            verifier: &HashVerifier,
            domain: &domain,
        };
        let mut scheduler = IntentScheduler::default();
        let intent = scheduler
            .create_intent(DAVE, PAYEE, 500u64.into(), 0, UnixTimestamp::from_secs(1))
            .unwrap();
        assert_eq!(scheduler.status(intent.id, &policy), Ok(IntentStatus::Approving));

        let receipt = scheduler
            .approve(intent.id, ALICE, &approval_sig(&intent, ALICE), &approver)
            .unwrap();
        assert_eq!(receipt.status, IntentStatus::Executable);
        assert_eq!(receipt.required, 1);
    }

    #[test]
    fn test_large_intent_needs_two_distinct_owners() {
        let policy = policy();
        let domain = domain();
        let approver = Approver {
            policy: &policy,
            verifier: &HashVerifier,
            domain: &domain,
        };
        let mut scheduler = IntentScheduler::default();
        let intent = scheduler
            .create_intent(DAVE, PAYEE, 5000u64.into(), 0, UnixTimestamp::from_secs(1))
            .unwrap();

        let receipt = scheduler
            .approve(intent.id, ALICE, &approval_sig(&intent, ALICE), &approver)
            .unwrap();
        assert_eq!(receipt.status, IntentStatus::Approving);
        assert_eq!(scheduler.approvals_needed(intent.id, &policy), Ok(1));

        assert_eq!(
            scheduler.approve(intent.id, ALICE, &approval_sig(&intent, ALICE), &approver),
            Err(TreasuryError::AlreadySigned(ALICE))
        );
        assert_eq!(scheduler.status(intent.id, &policy), Ok(IntentStatus::Approving));

        let receipt = scheduler
            .approve(intent.id, BOB, &approval_sig(&intent, BOB), &approver)
            .unwrap();
        assert_eq!(receipt.approvals, 2);
        assert_eq!(receipt.status, IntentStatus::Executable);
    }

    #[test]
    fn test_status_queries_do_not_mutate() {
        let policy = policy();
        let domain = domain();
        let approver = Approver {
            policy: &policy,
            verifier: &HashVerifier,
            domain: &domain,
        };
        let mut scheduler = IntentScheduler::default();
        let intent = scheduler
            .create_intent(DAVE, PAYEE, 5000u64.into(), 0, UnixTimestamp::from_secs(1))
            .unwrap();
        scheduler
            .approve(intent.id, ALICE, &approval_sig(&intent, ALICE), &approver)
            .unwrap();
        let before = scheduler.intent(intent.id).cloned();
        for _ in 0..3 {
            assert_eq!(policy.required_approvals(intent.amount), 2);
            assert_eq!(scheduler.approvals_needed(intent.id, &policy), Ok(1));
            assert_eq!(scheduler.status(intent.id, &policy), Ok(IntentStatus::Approving));
        }
        assert_eq!(scheduler.intent(intent.id).cloned(), before);
    }

    #[test]
    fn test_approve_rejects_non_owner_and_bad_signature() {
        let policy = policy();
        let domain = domain();
        let approver = Approver {
            policy: &policy,
            verifier: &HashVerifier,
            domain: &domain,
        };
        let mut scheduler = IntentScheduler::default();
        let intent = scheduler
            .create_intent(DAVE, PAYEE, 5000u64.into(), 0, UnixTimestamp::from_secs(1))
            .unwrap();

        assert_eq!(
            scheduler.approve(intent.id, DAVE, &approval_sig(&intent, DAVE), &approver),
            Err(TreasuryError::UnauthorizedSigner(DAVE))
        );
        assert_eq!(
            scheduler.approve(intent.id, ALICE, &approval_sig(&intent, BOB), &approver),
            Err(TreasuryError::InvalidSignature)
        );
        assert_eq!(
            scheduler.approve(IntentId(99), ALICE, &[], &approver),
            Err(TreasuryError::IntentNotFound(IntentId(99)))
        );
        assert!(scheduler.intent(intent.id).unwrap().approvals.is_empty());
    }

    #[test]
    fn test_approval_signature_is_bound_to_intent_id() {
        let policy = policy();
        let domain = domain();
        let approver = Approver {
            policy: &policy,
            verifier: &HashVerifier,
            domain: &domain,
        };
        let mut scheduler = IntentScheduler::default();
        let now = UnixTimestamp::from_secs(1);
        let first = scheduler.create_intent(DAVE, PAYEE, 10u64.into(), 0, now).unwrap();
        let second = scheduler.create_intent(DAVE, PAYEE, 10u64.into(), 0, now).unwrap();
        assert_eq!(
            scheduler.approve(second.id, ALICE, &approval_sig(&first, ALICE), &approver),
            Err(TreasuryError::InvalidSignature)
        );
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let policy = policy();
        let domain = domain();
        let approver = Approver {
            policy: &policy,
            verifier: &HashVerifier,
            domain: &domain,
        };
        let mut scheduler = IntentScheduler::default();
        let intent = scheduler
            .create_intent(DAVE, PAYEE, 5000u64.into(), 0, UnixTimestamp::from_secs(1))
            .unwrap();
        let good = |signer| SignedApproval {
            signer,
            signature: approval_sig(&intent, signer).into(),
        };

        let with_stranger = [good(ALICE), good(DAVE)];
        assert_eq!(
            scheduler.approve_batch(intent.id, &with_stranger, &approver),
            Err(TreasuryError::UnauthorizedSigner(DAVE))
        );
        let duplicated = [good(ALICE), good(ALICE)];
        assert_eq!(
            scheduler.approve_batch(intent.id, &duplicated, &approver),
            Err(TreasuryError::AlreadySigned(ALICE))
        );
        assert!(scheduler.intent(intent.id).unwrap().approvals.is_empty());

        let receipt = scheduler
            .approve_batch(intent.id, &[good(ALICE), good(CAROL)], &approver)
            .unwrap();
        assert_eq!(receipt.signers, vec![ALICE, CAROL]);
        assert_eq!(receipt.status, IntentStatus::Executable);
    }

    #[test]
    fn test_execute_one_shot_removes_intent() {
        let policy = policy();
        let domain = domain();
        let approver = Approver {
            policy: &policy,
            verifier: &HashVerifier,
            domain: &domain,
        };
        let mut ledger = funded();
        let mut scheduler = IntentScheduler::default();
        let intent = scheduler
            .create_intent(DAVE, PAYEE, 500u64.into(), 0, UnixTimestamp::from_secs(1))
            .unwrap();

        assert_eq!(
            scheduler.execute(intent.id, UnixTimestamp::from_secs(1), &policy, &mut ledger, VAULT),
            Err(TreasuryError::InsufficientApprovals { have: 0, need: 1 })
        );
        scheduler
            .approve(intent.id, BOB, &approval_sig(&intent, BOB), &approver)
            .unwrap();
        let receipt = scheduler
            .execute(intent.id, UnixTimestamp::from_secs(1), &policy, &mut ledger, VAULT)
            .unwrap();
        assert_eq!(receipt.status, IntentStatus::Executed);
        assert_eq!(receipt.execution_count, 1);
        assert_eq!(receipt.next_execution_time, None);
        assert_eq!(ledger.balance_of(PAYEE), TokenAmount::from(500u64));
        assert!(scheduler.intent(intent.id).is_none());
        assert_eq!(
            scheduler.execute(intent.id, UnixTimestamp::from_secs(2), &policy, &mut ledger, VAULT),
            Err(TreasuryError::IntentNotFound(intent.id))
        );
    }

    #[test]
    fn test_recurring_intent_rearms_and_clears_approvals() {
        let policy = policy();
        let domain = domain();
        let approver = Approver {
            policy: &policy,
            verifier: &HashVerifier,
            domain: &domain,
        };
        let mut ledger = funded();
        let mut scheduler = IntentScheduler::default();
        let t = UnixTimestamp::from_secs(1000);
        let intent = scheduler
            .create_intent(DAVE, PAYEE, 500u64.into(), 86_400, t)
            .unwrap();
        scheduler
            .approve(intent.id, ALICE, &approval_sig(&intent, ALICE), &approver)
            .unwrap();

        let receipt = scheduler
            .execute(intent.id, t, &policy, &mut ledger, VAULT)
            .unwrap();
        assert_eq!(receipt.status, IntentStatus::Approving);
        assert_eq!(
            receipt.next_execution_time,
            Some(UnixTimestamp::from_secs(87_400))
        );

        let rearmed = scheduler.intent(intent.id).unwrap().clone();
        assert!(rearmed.approvals.is_empty());
        assert_eq!(rearmed.execution_count, 1);
        assert_eq!(rearmed.next_execution_time, UnixTimestamp::from_secs(87_400));

        assert_eq!(
            scheduler.execute(intent.id, t, &policy, &mut ledger, VAULT),
            Err(TreasuryError::ExecutionTimeNotReached {
                next_execution_time: UnixTimestamp::from_secs(87_400),
                now: t,
            })
        );

        let due = UnixTimestamp::from_secs(87_400);
        assert_eq!(
            scheduler.execute(intent.id, due, &policy, &mut ledger, VAULT),
            Err(TreasuryError::InsufficientApprovals { have: 0, need: 1 })
        );

        scheduler
            .approve(intent.id, ALICE, &approval_sig(&rearmed, ALICE), &approver)
            .unwrap();
        let receipt = scheduler
            .execute(intent.id, due, &policy, &mut ledger, VAULT)
            .unwrap();
        assert_eq!(receipt.execution_count, 2);
        assert_eq!(ledger.balance_of(PAYEE), TokenAmount::from(1000u64));
    }

    #[test]
    fn test_approval_is_bound_to_its_round() {
        let policy = policy();
        let domain = domain();
        let approver = Approver {
            policy: &policy,
            verifier: &HashVerifier,
            domain: &domain,
        };
        let mut ledger = funded();
        let mut scheduler = IntentScheduler::default();
        let t = UnixTimestamp::from_secs(1000);
        let intent = scheduler
            .create_intent(DAVE, PAYEE, 5000u64.into(), 3600, t)
            .unwrap();
        let first_round = [
            SignedApproval {
                signer: ALICE,
                signature: approval_sig(&intent, ALICE).into(),
            },
            SignedApproval {
                signer: BOB,
                signature: approval_sig(&intent, BOB).into(),
            },
        ];
        scheduler
            .approve_batch(intent.id, &first_round, &approver)
            .unwrap();
        scheduler
            .execute(intent.id, t, &policy, &mut ledger, VAULT)
            .unwrap();

        for approval in &first_round {
            assert_eq!(
                scheduler.approve(intent.id, approval.signer, &approval.signature, &approver),
                Err(TreasuryError::InvalidSignature)
            );
        }
        assert_eq!(
            scheduler.approve_batch(intent.id, &first_round, &approver),
            Err(TreasuryError::InvalidSignature)
        );
        assert_eq!(
            scheduler.execute(intent.id, UnixTimestamp::from_secs(4600), &policy, &mut ledger, VAULT),
            Err(TreasuryError::InsufficientApprovals { have: 0, need: 2 })
        );
        assert_eq!(ledger.balance_of(PAYEE), TokenAmount::from(5000u64));
    }

    #[test]
    fn test_insufficient_balance_leaves_intent_untouched() {
        let policy = policy();
        let domain = domain();
        let approver = Approver {
            policy: &policy,
            verifier: &HashVerifier,
            domain: &domain,
        };
        let mut ledger = MemoryLedger::with_balances([(VAULT, TokenAmount::from(10u64))]);
        let mut scheduler = IntentScheduler::default();
        let intent = scheduler
            .create_intent(DAVE, PAYEE, 500u64.into(), 0, UnixTimestamp::from_secs(1))
            .unwrap();
        scheduler
            .approve(intent.id, ALICE, &approval_sig(&intent, ALICE), &approver)
            .unwrap();
        let err = scheduler
            .execute(intent.id, UnixTimestamp::from_secs(1), &policy, &mut ledger, VAULT)
            .unwrap_err();
        assert!(matches!(err, TreasuryError::InsufficientBalance { .. }));
        let intent = scheduler.intent(intent.id).unwrap();
        assert_eq!(intent.execution_count, 0);
        assert_eq!(intent.approvals.len(), 1);
    }

    #[test]
    fn test_policy_change_reevaluates_required_count() {
        let mut policy = policy();
        let domain = domain();
        let mut scheduler = IntentScheduler::default();
        let intent = scheduler
            .create_intent(DAVE, PAYEE, 5000u64.into(), 0, UnixTimestamp::from_secs(1))
            .unwrap();
        {
            let approver = Approver {
                policy: &policy,
                verifier: &HashVerifier,
                domain: &domain,
            };
            scheduler
                .approve(intent.id, ALICE, &approval_sig(&intent, ALICE), &approver)
                .unwrap();
        }
        assert_eq!(scheduler.status(intent.id, &policy), Ok(IntentStatus::Approving));

        policy
            .change_value_threshold(CUSTODIAN, TokenAmount::from(5000u64))
            .unwrap();
        assert_eq!(scheduler.status(intent.id, &policy), Ok(IntentStatus::Executable));

        policy
            .change_value_threshold(CUSTODIAN, TokenAmount::from(1000u64))
            .unwrap();
        policy.change_required_signatures(CUSTODIAN, 3).unwrap();
        assert_eq!(scheduler.approvals_needed(intent.id, &policy), Ok(2));
    }

    #[test]
    fn test_removed_owner_approval_stops_counting() {
        let mut policy = MultiSigPolicy::new(MultiSigConfig {
            owners: vec![ALICE, BOB, CAROL],
            required_signatures: 1,
            custodian: CUSTODIAN,
            value_threshold: TokenAmount::ZERO,
        })
        .unwrap();
        let domain = domain();
        let mut scheduler = IntentScheduler::default();
        let intent = scheduler
            .create_intent(DAVE, PAYEE, 5u64.into(), 0, UnixTimestamp::from_secs(1))
            .unwrap();
        {
            let approver = Approver {
                policy: &policy,
                verifier: &HashVerifier,
                domain: &domain,
            };
            scheduler
                .approve(intent.id, CAROL, &approval_sig(&intent, CAROL), &approver)
                .unwrap();
        }
        policy.remove_owner(CUSTODIAN, CAROL).unwrap();
        let mut ledger = funded();
        assert_eq!(
            scheduler.execute(intent.id, UnixTimestamp::from_secs(1), &policy, &mut ledger, VAULT),
            Err(TreasuryError::InsufficientApprovals { have: 0, need: 1 })
        );
    }
}
