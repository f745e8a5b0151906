//! Owner set, quorum and value threshold for outgoing payments.
//!
//! Payments up to and including `value_threshold` need a single owner
//! approval; anything larger needs `required_signatures` distinct owners.
//! All mutations are gated on the custodian and keep
//! `1 <= required_signatures <= owners.len()`.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;
use crate::error::TreasuryError;

/// Multisig configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSigConfig {
    /// Owners allowed to approve intents. Non-empty, no duplicates.
    pub owners: Vec<Address>,
    /// Quorum for payments above the value threshold.
    pub required_signatures: usize,
    /// Role allowed to manage owners and thresholds.
    pub custodian: Address,
    /// Largest amount that needs only one approval.
    pub value_threshold: TokenAmount,
}

/// Outcome of a custodian-gated policy change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum PolicyChange {
    /// A new owner joined.
    OwnerAdded {
        /// The added owner.
        owner: Address,
    },
    /// An owner left.
    OwnerRemoved {
        /// The removed owner.
        owner: Address,
    },
    /// The quorum changed.
    RequiredSignaturesChanged {
        /// Previous quorum.
        previous: usize,
        /// New quorum.
        current: usize,
    },
    /// The value threshold changed.
    ValueThresholdChanged {
        /// Previous threshold.
        previous: TokenAmount,
        /// New threshold.
        current: TokenAmount,
    },
}

/// Validated multisig policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSigPolicy {
    config: MultiSigConfig,
}

impl MultiSigPolicy {
    /// Validates `config` and builds the policy.
    ///
    /// # Errors
    ///
    /// Returns [`TreasuryError::InvalidConfig`] for an empty or duplicated
    /// owner list, or [`TreasuryError::InvalidThreshold`] when the quorum is
    /// outside `1..=owners`.
    pub fn new(config: MultiSigConfig) -> Result<Self, TreasuryError> {
        if config.owners.is_empty() {
            return Err(TreasuryError::InvalidConfig("owner set is empty".into()));
        }
        for (i, owner) in config.owners.iter().enumerate() {
            if config.owners[..i].contains(owner) {
                return Err(TreasuryError::InvalidConfig(format!(
                    "duplicate owner {owner}"
                )));
            }
        }
        check_threshold(config.required_signatures, config.owners.len())?;
        Ok(Self { config })
    }

    /// Number of approvals a payment of `amount` needs.
    ///
    /// `amount <= value_threshold` is the small-payment case (one approval);
    /// the comparison is inclusive.
    #[must_use]
    pub fn required_approvals(&self, amount: TokenAmount) -> usize {
        if amount <= self.config.value_threshold {
            1
        } else {
            self.config.required_signatures
        }
    }

    /// Returns `true` if `account` is a current owner.
    #[must_use]
    pub fn is_owner(&self, account: Address) -> bool {
        self.config.owners.contains(&account)
    }

    /// Current owners in insertion order.
    #[must_use]
    pub fn owners(&self) -> &[Address] {
        &self.config.owners
    }

    /// Current quorum.
    #[must_use]
    pub const fn required_signatures(&self) -> usize {
        self.config.required_signatures
    }

    /// Current value threshold.
    #[must_use]
    pub const fn value_threshold(&self) -> TokenAmount {
        self.config.value_threshold
    }

    /// Custodian account.
    #[must_use]
    pub const fn custodian(&self) -> Address {
        self.config.custodian
    }

    /// Snapshot of the full configuration.
    #[must_use]
    pub const fn config(&self) -> &MultiSigConfig {
        &self.config
    }

    /// Adds `new_owner`.
    ///
    /// # Errors
    ///
    /// [`TreasuryError::NotCustodian`] or [`TreasuryError::OwnerAlreadyExists`].
    pub fn add_owner(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<PolicyChange, TreasuryError> {
        self.ensure_custodian(caller)?;
        if self.is_owner(new_owner) {
            return Err(TreasuryError::OwnerAlreadyExists(new_owner));
        }
        self.config.owners.push(new_owner);
        Ok(PolicyChange::OwnerAdded { owner: new_owner })
    }

    /// Removes `owner`.
    ///
    /// # Errors
    ///
    /// [`TreasuryError::NotCustodian`], [`TreasuryError::OwnerNotFound`], or
    /// [`TreasuryError::ThresholdViolation`] when fewer owners than the quorum
    /// would remain. The owner set is unchanged on error.
    pub fn remove_owner(
        &mut self,
        caller: Address,
        owner: Address,
    ) -> Result<PolicyChange, TreasuryError> {
        self.ensure_custodian(caller)?;
        let position = self
            .config
            .owners
            .iter()
            .position(|o| *o == owner)
            .ok_or(TreasuryError::OwnerNotFound(owner))?;
        let remaining = self.config.owners.len() - 1;
        if self.config.required_signatures > remaining {
            return Err(TreasuryError::ThresholdViolation {
                required: self.config.required_signatures,
                remaining,
            });
        }
        self.config.owners.remove(position);
        Ok(PolicyChange::OwnerRemoved { owner })
    }

    /// Sets the quorum to `required`.
    ///
    /// # Errors
    ///
    /// [`TreasuryError::NotCustodian`] or [`TreasuryError::InvalidThreshold`].
    pub fn change_required_signatures(
        &mut self,
        caller: Address,
        required: usize,
    ) -> Result<PolicyChange, TreasuryError> {
        self.ensure_custodian(caller)?;
        check_threshold(required, self.config.owners.len())?;
        let previous = std::mem::replace(&mut self.config.required_signatures, required);
        Ok(PolicyChange::RequiredSignaturesChanged {
            previous,
            current: required,
        })
    }

    /// Sets the value threshold.
    ///
    /// # Errors
    ///
    /// [`TreasuryError::NotCustodian`].
    pub fn change_value_threshold(
        &mut self,
        caller: Address,
        threshold: TokenAmount,
    ) -> Result<PolicyChange, TreasuryError> {
        self.ensure_custodian(caller)?;
        let previous = std::mem::replace(&mut self.config.value_threshold, threshold);
        Ok(PolicyChange::ValueThresholdChanged {
            previous,
            current: threshold,
        })
    }

    fn ensure_custodian(&self, caller: Address) -> Result<(), TreasuryError> {
        if caller == self.config.custodian {
            Ok(())
        } else {
            Err(TreasuryError::NotCustodian(caller))
        }
    }
}

fn check_threshold(required: usize, owners: usize) -> Result<(), TreasuryError> {
    if required < 1 || required > owners {
        return Err(TreasuryError::InvalidThreshold {
            requested: required,
            owners,
        });
    }
    Ok(())
}
