//! HTTP service hosting one treasury.
//!
//! The engine runs behind a single `tokio` mutex over an in-memory ledger
//! seeded from configuration. Owner management stays a library call: HTTP
//! carries no authenticated caller, so no route can act as the custodian.
//!
//! # Modules
//!
//! - [`handlers`] - Axum route handlers and router builder
//! - [`error`] - HTTP error mapping
//! - [`config`] - Server configuration with environment variable expansion

pub mod config;
pub mod error;
pub mod handlers;

pub use handlers::{AppState, treasury_router};
