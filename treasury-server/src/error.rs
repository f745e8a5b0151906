//! HTTP error mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use treasury::{ErrorReason, TreasuryError};

/// Errors returned by the route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The treasury rejected the operation.
    #[error(transparent)]
    Treasury(#[from] TreasuryError),

    /// The request body could not be decoded.
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    /// A path parameter could not be parsed.
    #[error("invalid {name}: {value}")]
    InvalidParam {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}

impl ApiError {
    /// Builds an [`ApiError::InvalidParam`].
    pub fn param(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParam {
            name,
            value: value.into(),
        }
    }

    fn status(&self) -> StatusCode {
        let reason = match self {
            Self::Treasury(e) => e.reason(),
            Self::InvalidBody(_) | Self::InvalidParam { .. } => return StatusCode::BAD_REQUEST,
        };
        match reason {
            ErrorReason::IntentNotFound => StatusCode::NOT_FOUND,
            ErrorReason::InvalidSignature
            | ErrorReason::UnauthorizedSigner
            | ErrorReason::NotCustodian => StatusCode::FORBIDDEN,
            ErrorReason::NonceAlreadyUsed
            | ErrorReason::AlreadySigned
            | ErrorReason::OwnerAlreadyExists
            | ErrorReason::NoAvailableNonce => StatusCode::CONFLICT,
            ErrorReason::DeadlineExpired
            | ErrorReason::ExecutionTimeNotReached
            | ErrorReason::InsufficientApprovals
            | ErrorReason::InsufficientBalance
            | ErrorReason::ThresholdViolation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorReason::AmountMustBeGreaterThanZero
            | ErrorReason::AssetMismatch
            | ErrorReason::InvalidThreshold
            | ErrorReason::OwnerNotFound => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = match &self {
            Self::Treasury(e) => serde_json::json!({
                "error": self.to_string(),
                "reason": e.reason(),
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}
