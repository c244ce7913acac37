//! HTTP error mapping.
//!
//! Every handler returns `Result<_, ApiError>`. Library errors convert via
//! `From<PassportError>`, and each variant owns its status code and body
//! shape: `{"error": ..., "details": ...}`, with `details` omitted where
//! it would leak more than the caller should learn (denials).

use agentic_passport::{DenialReason, PassportError};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error body returned by every failing route.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body could not be parsed as the expected JSON.
    #[error("invalid request body: {0}")]
    BadRequest(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// Authorization or membership refusal. Carries only the public reason.
    #[error("{0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A backing service (ledger, prover) failed or timed out.
    #[error("{error}: {details}")]
    Unavailable { error: String, details: String },

    #[error("{error}: {details}")]
    Internal { error: String, details: String },
}

impl ApiError {
    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        match self {
            Self::BadRequest(details) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "invalid request body".into(),
                    details: Some(details.clone()),
                },
            ),
            Self::Validation(details) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "validation failed".into(),
                    details: Some(details.clone()),
                },
            ),
            Self::Forbidden(reason) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    error: reason.clone(),
                    details: None,
                },
            ),
            Self::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "not found".into(),
                    details: Some(what.clone()),
                },
            ),
            Self::Unavailable { error, details } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    error: error.clone(),
                    details: Some(details.clone()),
                },
            ),
            Self::Internal { error, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: error.clone(),
                    details: Some(details.clone()),
                },
            ),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status_and_body().0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<DenialReason> for ApiError {
    fn from(reason: DenialReason) -> Self {
        Self::Forbidden(reason.to_string())
    }
}

impl From<PassportError> for ApiError {
    fn from(err: PassportError) -> Self {
        match err {
            PassportError::Validation(msg) => Self::Validation(msg),
            PassportError::EmptyAllowlist | PassportError::AllowlistOverflow { .. } => {
                Self::Validation(err.to_string())
            }
            PassportError::NotFound(what) => Self::NotFound(what),
            PassportError::NotInAllowlist => Self::Forbidden("agent is not in the allowlist".into()),
            PassportError::ProofVerificationFailed => {
                Self::Forbidden("proof verification failed".into())
            }
            PassportError::IssuanceFailed(details) => Self::Internal {
                error: "passport issuance failed".into(),
                details,
            },
            PassportError::ExecutionFailed(details) => Self::Internal {
                error: "execution failed".into(),
                details,
            },
            PassportError::Ledger(_) | PassportError::Timeout(_) => Self::Unavailable {
                error: "ledger unavailable".into(),
                details: err.to_string(),
            },
            PassportError::Prover(_) | PassportError::Governance(_) => Self::Unavailable {
                error: "backend unavailable".into(),
                details: err.to_string(),
            },
            other => Self::Internal {
                error: "internal error".into(),
                details: other.to_string(),
            },
        }
    }
}
