//! Fetch-then-conditional-write coordinator.
//!
//! # Responsibilities
//! - Capture the ETag from a GET immediately before each mutation
//! - Attach the captured tag verbatim as an If-Match precondition
//! - Surface a missing ETag as a fatal contract violation
//!
//! # Design Decisions
//! - One GET feeds exactly one conditional write; tags are never cached or
//!   reused across requests
//! - A stale-tag rejection (412) propagates to the caller, which decides
//!   whether to re-fetch and retry; the coordinator never retries

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ETAG, IF_MATCH};
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::proxy::ProxyClient;

/// A resource body paired with the version tag observed when it was read.
///
/// Consumed by exactly one subsequent conditional write.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub resource: T,
    pub etag: String,
}

/// Coordinates safe mutations against resources that support conditional
/// writes.
#[derive(Debug, Clone)]
pub struct EtagCoordinator {
    client: Arc<ProxyClient>,
}

impl EtagCoordinator {
    pub fn new(client: Arc<ProxyClient>) -> Self {
        Self { client }
    }

    /// GET a resource and capture its ETag.
    ///
    /// Fails with `PreconditionUnavailable` when the response carries no
    /// ETag header: the safe-write contract cannot be honored for that
    /// resource, and blind writes are never issued instead.
    pub async fn fetch_with_etag<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        service: &str,
        path: &str,
    ) -> Result<Snapshot<T>, GatewayError> {
        let response = self
            .client
            .request_with_response::<T>(ctx, service, path, Method::GET)
            .await?;

        let etag = response
            .headers
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| GatewayError::PreconditionUnavailable(path.to_string()))?;

        Ok(Snapshot {
            resource: response.data,
            etag,
        })
    }

    /// Update a resource, conditioned on its state at fetch time.
    ///
    /// Returns the new representation from the upstream. A concurrent writer
    /// that lands between the fetch and the PUT surfaces as
    /// `PreconditionFailed`.
    pub async fn update_with_etag<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        service: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, GatewayError> {
        let snapshot = self.fetch_with_etag::<serde_json::Value>(ctx, service, path).await?;
        self.client
            .request::<T>(
                ctx,
                service,
                path,
                Method::PUT,
                None,
                Some(body),
                Some(if_match_headers(&snapshot.etag)?),
            )
            .await
    }

    /// Delete a resource, conditioned on its state at fetch time.
    pub async fn delete_with_etag(
        &self,
        ctx: &RequestContext,
        service: &str,
        path: &str,
    ) -> Result<(), GatewayError> {
        let snapshot = self.fetch_with_etag::<serde_json::Value>(ctx, service, path).await?;
        self.client
            .request_no_content(
                ctx,
                service,
                path,
                Method::DELETE,
                Some(if_match_headers(&snapshot.etag)?),
            )
            .await
    }
}

/// Build the If-Match header set carrying the captured tag verbatim.
fn if_match_headers(etag: &str) -> Result<HeaderMap, GatewayError> {
    let value = HeaderValue::from_str(etag)
        .map_err(|_| GatewayError::Internal(format!("upstream ETag is not a valid header value: {etag}")))?;
    let mut headers = HeaderMap::new();
    headers.insert(IF_MATCH, value);
    Ok(headers)
}
