//! Error taxonomy for treasury operations.
//!
//! Every error is a rejection of the requested operation: none of them leaves
//! partially applied state behind, and none is retried by the core.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;
use crate::intent::IntentId;
use crate::ledger::LedgerError;
use crate::timestamp::UnixTimestamp;

/// Errors returned by treasury operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TreasuryError {
    /// The signature does not recover to the claimed signer, or is malformed.
    #[error("Signature is invalid for the claimed signer")]
    InvalidSignature,
    /// The permit nonce has already been consumed by this owner.
    #[error("Nonce {nonce} already used by {owner}")]
    NonceAlreadyUsed {
        /// Permit owner.
        owner: Address,
        /// The replayed nonce.
        nonce: U256,
    },
    /// The permit deadline is in the past.
    #[error("Permit expired at {deadline} (now {now})")]
    DeadlineExpired {
        /// Permit deadline (inclusive).
        deadline: UnixTimestamp,
        /// Time of the redemption attempt.
        now: UnixTimestamp,
    },
    /// A zero amount was supplied where a positive one is required.
    #[error("Amount must be greater than zero")]
    AmountMustBeGreaterThanZero,
    /// The caller is not the custodian.
    #[error("{0} is not the custodian")]
    NotCustodian(Address),
    /// The owner to add is already in the owner set.
    #[error("{0} is already an owner")]
    OwnerAlreadyExists(Address),
    /// The owner to remove is not in the owner set.
    #[error("{0} is not an owner")]
    OwnerNotFound(Address),
    /// Removing an owner would leave fewer owners than required signatures.
    #[error("Removing an owner would leave {remaining} owners for {required} required signatures")]
    ThresholdViolation {
        /// Current required signature count.
        required: usize,
        /// Owner count after the removal.
        remaining: usize,
    },
    /// Requested required-signature count is outside `1..=owners`.
    #[error("Required signatures {requested} must be between 1 and {owners}")]
    InvalidThreshold {
        /// Requested count.
        requested: usize,
        /// Current owner count.
        owners: usize,
    },
    /// The approving signer is not a current owner.
    #[error("{0} is not an authorized signer")]
    UnauthorizedSigner(Address),
    /// The signer already approved this intent in the current round.
    #[error("{0} already signed this intent")]
    AlreadySigned(Address),
    /// The intent does not yet have enough owner approvals.
    #[error("Not enough approvals: {have} of {need}")]
    InsufficientApprovals {
        /// Approvals from current owners.
        have: usize,
        /// Approvals required for the intent amount.
        need: usize,
    },
    /// The intent's next execution time has not been reached.
    #[error("Execution time {next_execution_time} not reached (now {now})")]
    ExecutionTimeNotReached {
        /// Earliest execution time.
        next_execution_time: UnixTimestamp,
        /// Time of the attempt.
        now: UnixTimestamp,
    },
    /// A debit would drive a balance negative.
    #[error("Insufficient balance for {account}: have {balance}, need {required}")]
    InsufficientBalance {
        /// Debited account.
        account: Address,
        /// Balance before the debit.
        balance: TokenAmount,
        /// Amount requested.
        required: TokenAmount,
    },
    /// Every nonce in the scanned word has been used.
    #[error("No unused nonce left in word {word} for {owner}")]
    NoAvailableNonce {
        /// Nonce owner.
        owner: Address,
        /// Exhausted word index.
        word: U256,
    },
    /// The permit token is not the asset this treasury holds.
    #[error("Permit token {actual} does not match treasury asset {expected}")]
    AssetMismatch {
        /// Configured asset.
        expected: Address,
        /// Token named by the permit.
        actual: Address,
    },
    /// No active intent with this id.
    #[error("Intent {0} not found")]
    IntentNotFound(IntentId),
    /// Construction-time configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Arithmetic overflow while advancing a schedule or crediting a balance.
    #[error("Arithmetic overflow")]
    AmountOverflow,
    /// Infrastructure failure reported by the ledger boundary.
    #[error("Ledger failure: {0}")]
    Ledger(String),
}

impl From<LedgerError> for TreasuryError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::InsufficientBalance {
                account,
                balance,
                required,
            } => Self::InsufficientBalance {
                account,
                balance,
                required,
            },
            LedgerError::Overflow => Self::AmountOverflow,
            LedgerError::Backend(msg) => Self::Ledger(msg),
        }
    }
}

/// Machine-readable reason codes for treasury errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorReason {
    /// See [`TreasuryError::InvalidSignature`].
    InvalidSignature,
    /// See [`TreasuryError::NonceAlreadyUsed`].
    NonceAlreadyUsed,
    /// See [`TreasuryError::DeadlineExpired`].
    DeadlineExpired,
    /// See [`TreasuryError::AmountMustBeGreaterThanZero`].
    AmountMustBeGreaterThanZero,
    /// See [`TreasuryError::NotCustodian`].
    NotCustodian,
    /// See [`TreasuryError::OwnerAlreadyExists`].
    OwnerAlreadyExists,
    /// See [`TreasuryError::OwnerNotFound`].
    OwnerNotFound,
    /// See [`TreasuryError::ThresholdViolation`].
    ThresholdViolation,
    /// See [`TreasuryError::InvalidThreshold`].
    InvalidThreshold,
    /// See [`TreasuryError::UnauthorizedSigner`].
    UnauthorizedSigner,
    /// See [`TreasuryError::AlreadySigned`].
    AlreadySigned,
    /// See [`TreasuryError::InsufficientApprovals`].
    InsufficientApprovals,
    /// See [`TreasuryError::ExecutionTimeNotReached`].
    ExecutionTimeNotReached,
    /// See [`TreasuryError::InsufficientBalance`].
    InsufficientBalance,
    /// See [`TreasuryError::NoAvailableNonce`].
    NoAvailableNonce,
    /// See [`TreasuryError::AssetMismatch`].
    AssetMismatch,
    /// See [`TreasuryError::IntentNotFound`].
    IntentNotFound,
    /// See [`TreasuryError::InvalidConfig`].
    InvalidConfig,
    /// See [`TreasuryError::AmountOverflow`].
    AmountOverflow,
    /// See [`TreasuryError::Ledger`].
    Ledger,
}

impl TreasuryError {
    /// Returns the machine-readable reason code for this error.
    #[must_use]
    pub const fn reason(&self) -> ErrorReason {
        match self {
            Self::InvalidSignature => ErrorReason::InvalidSignature,
            Self::NonceAlreadyUsed { .. } => ErrorReason::NonceAlreadyUsed,
            Self::DeadlineExpired { .. } => ErrorReason::DeadlineExpired,
            Self::AmountMustBeGreaterThanZero => ErrorReason::AmountMustBeGreaterThanZero,
            Self::NotCustodian(_) => ErrorReason::NotCustodian,
            Self::OwnerAlreadyExists(_) => ErrorReason::OwnerAlreadyExists,
            Self::OwnerNotFound(_) => ErrorReason::OwnerNotFound,
            Self::ThresholdViolation { .. } => ErrorReason::ThresholdViolation,
            Self::InvalidThreshold { .. } => ErrorReason::InvalidThreshold,
            Self::UnauthorizedSigner(_) => ErrorReason::UnauthorizedSigner,
            Self::AlreadySigned(_) => ErrorReason::AlreadySigned,
            Self::InsufficientApprovals { .. } => ErrorReason::InsufficientApprovals,
            Self::ExecutionTimeNotReached { .. } => ErrorReason::ExecutionTimeNotReached,
            Self::InsufficientBalance { .. } => ErrorReason::InsufficientBalance,
            Self::NoAvailableNonce { .. } => ErrorReason::NoAvailableNonce,
            Self::AssetMismatch { .. } => ErrorReason::AssetMismatch,
            Self::IntentNotFound(_) => ErrorReason::IntentNotFound,
            Self::InvalidConfig(_) => ErrorReason::InvalidConfig,
            Self::AmountOverflow => ErrorReason::AmountOverflow,
            Self::Ledger(_) => ErrorReason::Ledger,
        }
    }
}
