//! Request-scoped context.
//!
//! # Responsibilities
//! - Carry the inbound request ID and bearer token to outbound calls
//! - Deduplicate start/finish log lines per logical operation
//! - Allow substituting a machine token for privileged sub-calls
//!
//! # Design Decisions
//! - Context is an explicit value passed down the call chain, not a
//!   process-wide side table; it is dropped when the request completes
//! - Operation log state lives behind a Mutex so handlers can share the
//!   context across concurrently in-flight batch items

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::GatewayError;

/// Per-request state owned for the lifetime of one inbound HTTP request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation ID, taken from `x-request-id` or freshly generated.
    pub request_id: String,
    /// Bearer token forwarded to upstream calls.
    token: String,
    /// Names of operations already logged within this request.
    ops: Arc<Mutex<HashSet<String>>>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            token: token.into(),
            ops: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// The token attached to every outbound call for this context.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Clone of this context carrying a machine-to-machine token instead of
    /// the caller's own. The operation log is shared with the parent so
    /// privileged sub-calls do not double-log.
    pub fn with_machine_token(&self, token: impl Into<String>) -> Self {
        Self {
            request_id: self.request_id.clone(),
            token: token.into(),
            ops: self.ops.clone(),
        }
    }

    /// Log the start of a logical operation, once per name per request.
    pub fn operation_start(&self, name: &str) -> Instant {
        let mut ops = self.ops.lock().unwrap_or_else(|e| e.into_inner());
        if ops.insert(format!("start:{name}")) {
            tracing::debug!(request_id = %self.request_id, operation = %name, "operation started");
        }
        Instant::now()
    }

    /// Log the completion of a logical operation, once per name per request.
    pub fn operation_finish(&self, name: &str, started: Instant) {
        let mut ops = self.ops.lock().unwrap_or_else(|e| e.into_inner());
        if ops.insert(format!("finish:{name}")) {
            tracing::debug!(
                request_id = %self.request_id,
                operation = %name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "operation finished"
            );
        }
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::validation("missing or malformed Authorization header"))?
            .to_string();

        Ok(RequestContext::new(request_id, token))
    }
}
