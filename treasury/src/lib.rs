#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Authorization core for a custodial treasury.
//!
//! Funds enter through single-use signed permits and leave through payment
//! intents that a quorum of owners approves. The crate holds the rules and
//! the state; signature cryptography and the balance store sit behind the
//! [`SignatureVerifier`] and [`Ledger`] traits, so the same engine runs
//! against an EIP-712 verifier in production and a deterministic one in tests.
//!
//! # Modules
//!
//! - [`nonce`] - Unordered nonce bitmaps for replay protection
//! - [`signing`] - Signing domain, signed message kinds and the verifier seam
//! - [`permit`] - Delegated-transfer permits
//! - [`policy`] - Owner set, quorum and value threshold
//! - [`intent`] - One-shot and recurring payment intents
//! - [`ledger`] - Balance store boundary and an in-memory implementation
//! - [`engine`] - The [`Treasury`] facade tying it all together
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation of state-changing operations

pub mod amount;
pub mod config;
pub mod engine;
pub mod error;
pub mod intent;
pub mod ledger;
pub mod nonce;
pub mod permit;
pub mod policy;
pub mod signing;
pub mod timestamp;

#[cfg(test)]
pub(crate) mod testkit;

pub use amount::TokenAmount;
pub use config::TreasuryConfig;
pub use engine::{DepositReceipt, IntentCreated, NoncesInvalidated, Treasury};
pub use error::{ErrorReason, TreasuryError};
pub use intent::{
    ApprovalReceipt, ExecutionReceipt, FirstExecution, Intent, IntentId, IntentScheduler,
    IntentStatus, SignedApproval,
};
pub use ledger::{Ledger, LedgerError, MemoryLedger};
pub use nonce::NonceRegistry;
pub use permit::PermitAuthorization;
pub use policy::{MultiSigConfig, MultiSigPolicy, PolicyChange};
pub use signing::{IntentApproval, SignatureVerifier, SigningDomain, TypedMessage};
pub use timestamp::UnixTimestamp;
