//! Outbound HTTP client for named upstream services.
//!
//! # Responsibilities
//! - Translate (service, path, method, params, body, headers) into one
//!   outbound HTTP call against the service's configured base URL
//! - Forward the caller's bearer token unchanged
//! - Classify non-2xx responses into the gateway error taxonomy
//!
//! # Design Decisions
//! - No automatic retries; a failed call fails the caller's operation
//! - No business logging; callers own the semantics of what a call means
//! - Classification happens here, once, so every layer above branches on
//!   error variants instead of raw status codes

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::GatewayConfig;
use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::observability::metrics;

/// A decoded upstream response including its headers.
///
/// Used by callers that need more than the body, e.g. the ETag coordinator.
#[derive(Debug)]
pub struct ProxyResponse<T> {
    pub data: T,
    pub headers: HeaderMap,
}

/// Client for outbound calls to configured upstream services.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    upstreams: HashMap<String, Url>,
}

impl ProxyClient {
    /// Build a client from the gateway configuration.
    ///
    /// Every outbound call is bounded by the configured request timeout.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .build()?;

        let mut upstreams = HashMap::new();
        for upstream in &config.upstreams {
            let mut url = Url::parse(&upstream.base_url).map_err(|e| {
                GatewayError::Internal(format!("invalid base URL for {}: {e}", upstream.name))
            })?;
            // Url::join drops the last path segment without this.
            if !url.path().ends_with('/') {
                url.set_path(&format!("{}/", url.path()));
            }
            upstreams.insert(upstream.name.clone(), url);
        }

        Ok(Self { http, upstreams })
    }

    /// Issue a request and decode the JSON response body.
    pub async fn request<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        service: &str,
        path: &str,
        method: Method,
        params: Option<&[(&str, &str)]>,
        body: Option<&serde_json::Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, GatewayError> {
        let response = self
            .send(ctx, service, path, method, params, body, extra_headers)
            .await?;
        Ok(response.json::<T>().await?)
    }

    /// Issue a request and return both the decoded body and the response
    /// headers. Used by callers that need header access (ETag capture).
    pub async fn request_with_response<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        service: &str,
        path: &str,
        method: Method,
    ) -> Result<ProxyResponse<T>, GatewayError> {
        let response = self
            .send(ctx, service, path, method, None, None, None)
            .await?;
        let headers = response.headers().clone();
        let data = response.json::<T>().await?;
        Ok(ProxyResponse { data, headers })
    }

    /// Issue a request and discard any response body (DELETE and similar).
    pub async fn request_no_content(
        &self,
        ctx: &RequestContext,
        service: &str,
        path: &str,
        method: Method,
        extra_headers: Option<HeaderMap>,
    ) -> Result<(), GatewayError> {
        self.send(ctx, service, path, method, None, None, extra_headers)
            .await?;
        Ok(())
    }

    async fn send(
        &self,
        ctx: &RequestContext,
        service: &str,
        path: &str,
        method: Method,
        params: Option<&[(&str, &str)]>,
        body: Option<&serde_json::Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<reqwest::Response, GatewayError> {
        let base = self
            .upstreams
            .get(service)
            .ok_or_else(|| GatewayError::Internal(format!("unknown upstream service: {service}")))?;
        let url = base.join(path.trim_start_matches('/')).map_err(|e| {
            GatewayError::Internal(format!("invalid path {path} for {service}: {e}"))
        })?;

        let method_label = method.to_string();
        let mut request = self.http.request(method, url).header(
            AUTHORIZATION,
            bearer_header(ctx.token())
                .ok_or_else(|| GatewayError::validation("bearer token is not a valid header value"))?,
        );
        if let Some(params) = params {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(headers) = extra_headers {
            request = request.headers(headers);
        }

        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        metrics::record_upstream_request(service, &method_label, status.as_u16(), start);

        tracing::debug!(
            request_id = %ctx.request_id,
            service = %service,
            path = %path,
            status = %status,
            "upstream call completed"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = read_error_body(response).await;
        Err(classify_failure(service, path, status, body))
    }
}

fn bearer_header(token: &str) -> Option<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}")).ok()?;
    value.set_sensitive(true);
    Some(value)
}

async fn read_error_body(response: reqwest::Response) -> Option<serde_json::Value> {
    let bytes = response.bytes().await.ok()?;
    if bytes.is_empty() {
        return None;
    }
    serde_json::from_slice(&bytes)
        .ok()
        .or_else(|| Some(serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())))
}

/// Map a non-2xx upstream status onto the error taxonomy.
fn classify_failure(
    service: &str,
    path: &str,
    status: StatusCode,
    body: Option<serde_json::Value>,
) -> GatewayError {
    match status {
        StatusCode::FORBIDDEN => GatewayError::AuthorizationDenied { body },
        StatusCode::NOT_FOUND => GatewayError::NotFound(path.to_string()),
        StatusCode::PRECONDITION_FAILED => GatewayError::PreconditionFailed(path.to_string()),
        _ => GatewayError::Upstream {
            service: service.to_string(),
            status,
            body,
        },
    }
}
