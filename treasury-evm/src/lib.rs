#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EVM signature support for the treasury engine.
//!
//! Permits and intent approvals are signed as EIP-712 typed data and verified
//! by ECDSA public key recovery. The domain separator is built from the
//! treasury's [`SigningDomain`](treasury::SigningDomain), so signatures are
//! bound to one deployment, network and version.
//!
//! # Modules
//!
//! - [`types`] - `sol!` definitions of the signed structs
//! - [`domain`] - EIP-712 domain construction
//! - [`signature`] - 65-byte and ERC-2098 signature parsing and recovery
//! - [`verifier`] - [`Eip712Verifier`], the [`SignatureVerifier`](treasury::SignatureVerifier) implementation
//!
//! # Feature Flags
//!
//! - `client` - Wallet-side signing helpers
//! - `telemetry` - Tracing of rejected signatures

pub mod domain;
pub mod signature;
pub mod types;
pub mod verifier;

#[cfg(feature = "client")]
pub mod client;

pub use signature::SignatureFormatError;
pub use verifier::Eip712Verifier;
