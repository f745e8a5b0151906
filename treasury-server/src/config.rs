//! Server configuration.
//!
//! Loaded from a TOML file whose string values may reference environment
//! variables as `$VAR` or `${VAR}`.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 4030
//!
//! [treasury]
//! asset = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"
//! custody = "$CUSTODY_ADDRESS"
//! firstExecution = "immediate"
//!
//! [treasury.domain]
//! name = "Treasury"
//! version = "1"
//! networkId = 8453
//! verifyingContract = "$CUSTODY_ADDRESS"
//!
//! [treasury.multisig]
//! owners = ["$OWNER_A", "$OWNER_B", "$OWNER_C"]
//! requiredSignatures = 2
//! custodian = "$CUSTODIAN"
//! valueThreshold = "1000000000"
//!
//! [[genesis]]
//! account = "$DEPOSITOR"
//! amount = "5000000000"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `config.toml`)
//! - `HOST` - Override server bind address
//! - `PORT` - Override server port

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use treasury::{TokenAmount, TreasuryConfig};

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port (default: `4030`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// The hosted treasury.
    pub treasury: TreasuryConfig,

    /// Opening balances of the in-memory ledger.
    #[serde(default)]
    pub genesis: Vec<GenesisBalance>,
}

/// One opening balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBalance {
    /// Account credited at startup.
    pub account: Address,
    /// Opening balance.
    pub amount: TokenAmount,
}

/// Errors from loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Config path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid configuration TOML.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

const fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_port() -> u16 {
    4030
}

impl ServerConfig {
    /// Loads the file named by `CONFIG`, falling back to `config.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from `path` and applies `HOST` / `PORT` overrides.
    ///
    /// A missing file is treated as empty, which fails on the required
    /// `treasury` table with a parse error naming it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_owned(),
                source,
            })?
        } else {
            String::new()
        };

        let mut config = Self::parse(&content, |name| std::env::var(name).ok())?;

        if let Some(host) = std::env::var("HOST").ok().and_then(|h| h.parse().ok()) {
            config.host = host;
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            config.port = port;
        }
        Ok(config)
    }

    /// Parses TOML after expanding variables through `lookup`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`].
    pub fn parse(
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        Ok(toml::from_str(&expand_vars(content, lookup))?)
    }
}

/// Replaces `$NAME` and `${NAME}` with `lookup(NAME)`.
///
/// References `lookup` cannot resolve are kept verbatim.
fn expand_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let (name, consumed) = match tail.strip_prefix('{') {
            Some(braced) => braced
                .find('}')
                .map_or(("", 0), |end| (&braced[..end], end + 2)),
            None => {
                let end = tail
                    .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                    .unwrap_or(tail.len());
                (&tail[..end], end)
            }
        };

        match (!name.is_empty()).then(|| lookup(name)).flatten() {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..=start + consumed]),
        }
        rest = &tail[consumed..];
    }

    out.push_str(rest);
    out
}
