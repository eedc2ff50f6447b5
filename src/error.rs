//! Gateway error taxonomy.
//!
//! # Responsibilities
//! - Classify upstream failures into a stable set of variants
//! - Map each variant to an HTTP status at the controller boundary
//! - Render every failure as a structured JSON body, never a stack trace
//!
//! # Design Decisions
//! - One error representation for the whole crate; classification happens
//!   once, in the proxy client, so callers branch on variants, not codes
//! - Upstream bodies are carried verbatim so controllers can surface the
//!   remote service's own error detail

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// All failures the gateway core can produce.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The remote service returned a non-2xx status not covered by a more
    /// specific variant. Carries the remote status and body when available.
    #[error("upstream {service} returned {status}")]
    Upstream {
        service: String,
        status: StatusCode,
        body: Option<serde_json::Value>,
    },

    /// Resource absent when expected to exist.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// A successful GET carried no ETag header, so the safe-write contract
    /// cannot be honored. Fatal and non-retryable for that call.
    #[error("upstream response for {0} carried no ETag")]
    PreconditionUnavailable(String),

    /// Conditional write rejected because the resource changed since it was
    /// fetched. The caller must re-fetch; the gateway never retries blindly.
    #[error("precondition failed for {0}: resource changed since fetch")]
    PreconditionFailed(String),

    /// 403-equivalent from the remote service.
    #[error("authorization denied by upstream")]
    AuthorizationDenied { body: Option<serde_json::Value> },

    /// Malformed caller input, detected before any network call.
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    /// Network or protocol failure talking to the upstream.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Gateway-side defect (misconfigured upstream, broken contract).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Field-level detail attached to validation failures.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl GatewayError {
    /// Shorthand for a validation failure with no field detail.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// HTTP status this error surfaces as at the controller boundary.
    pub fn status(&self) -> StatusCode {
        match self {
            // A 5xx from the upstream is a bad gateway from the caller's
            // point of view; 4xx statuses pass through unchanged.
            GatewayError::Upstream { status, .. } => {
                if status.is_server_error() {
                    StatusCode::BAD_GATEWAY
                } else {
                    *status
                }
            }
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::PreconditionUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            GatewayError::AuthorizationDenied { .. } => StatusCode::FORBIDDEN,
            GatewayError::Validation { .. } => StatusCode::BAD_REQUEST,
            GatewayError::Transport(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the error body.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Upstream { .. } => "upstream_error",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::PreconditionUnavailable(_) => "precondition_unavailable",
            GatewayError::PreconditionFailed(_) => "precondition_failed",
            GatewayError::AuthorizationDenied { .. } => "authorization_denied",
            GatewayError::Validation { .. } => "validation_failed",
            GatewayError::Transport(_) => "transport_error",
            GatewayError::Internal(_) => "internal_error",
        }
    }
}

/// Structured JSON error body returned by every controller failure path.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&GatewayError> for ErrorBody {
    fn from(err: &GatewayError) -> Self {
        let details = match err {
            GatewayError::Upstream { body, .. } => body.clone(),
            GatewayError::AuthorizationDenied { body } => body.clone(),
            GatewayError::Validation { fields, .. } if !fields.is_empty() => {
                serde_json::to_value(fields).ok()
            }
            _ => None,
        };
        ErrorBody {
            message: err.to_string(),
            code: Some(err.code().to_string()),
            details,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody::from(&self);
        (status, Json(body)).into_response()
    }
}
