//! Deployment configuration for one [`Treasury`](crate::Treasury).

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::intent::FirstExecution;
use crate::policy::MultiSigConfig;
use crate::signing::SigningDomain;

/// Everything fixed at deployment time.
///
/// ```toml
/// asset = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"
/// custody = "0x0000000000000000000000000000000000000fa7"
/// firstExecution = "immediate"
///
/// [domain]
/// name = "Treasury"
/// version = "1"
/// networkId = 8453
/// verifyingContract = "0x0000000000000000000000000000000000000fa7"
///
/// [multisig]
/// owners = ["0x...", "0x..."]
/// requiredSignatures = 2
/// custodian = "0x..."
/// valueThreshold = "1000000"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreasuryConfig {
    /// Domain every signature is bound to.
    pub domain: SigningDomain,
    /// The single token this treasury accepts.
    pub asset: Address,
    /// Account credited by deposits and debited by intent executions.
    pub custody: Address,
    /// Owner set and approval thresholds.
    pub multisig: MultiSigConfig,
    /// When newly created intents first become due.
    #[serde(default)]
    pub first_execution: FirstExecution,
}
