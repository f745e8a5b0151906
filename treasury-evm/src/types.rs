//! EIP-712 struct definitions for the two signed message kinds.
//!
//! Field names and order are part of the type hash; wallets, the verifier
//! and the client helpers must all agree on them.

use alloy_primitives::U256;
use alloy_sol_types::sol;
use serde::{Deserialize, Serialize};

sol!(
    /// EIP-712 struct for the token and amount a permit covers.
    #[derive(Serialize, Deserialize)]
    struct TokenPermissions {
        address token;
        uint256 amount;
    }

    /// EIP-712 struct for a single-use delegated transfer.
    ///
    /// The owner is not a field: it is the address recovered from the
    /// signature and compared against the claimed owner.
    #[derive(Serialize, Deserialize)]
    struct PermitTransferFrom {
        TokenPermissions permitted;
        address spender;
        uint256 nonce;
        uint256 deadline;
    }

    /// EIP-712 struct for an owner's approval of one round of an intent.
    #[derive(Serialize, Deserialize)]
    struct IntentApproval {
        uint256 intentId;
        address to;
        uint256 amount;
        uint256 round;
    }
);

impl From<&treasury::PermitAuthorization> for PermitTransferFrom {
    fn from(permit: &treasury::PermitAuthorization) -> Self {
        Self {
            permitted: TokenPermissions {
                token: permit.token,
                amount: permit.amount.into(),
            },
            spender: permit.spender,
            nonce: permit.nonce(),
            deadline: U256::from(permit.deadline.as_secs()),
        }
    }
}

impl From<&treasury::IntentApproval> for IntentApproval {
    fn from(approval: &treasury::IntentApproval) -> Self {
        Self {
            intentId: U256::from(approval.intent_id.0),
            to: approval.to,
            amount: approval.amount.into(),
            round: U256::from(approval.round),
        }
    }
}
