//! Batch access checks with degradation to "no access".
//!
//! # Responsibilities
//! - Encode (resourceType, id, accessKind) triples as the access endpoint's
//!   `"resourceType:id#accessKind"` wire strings
//! - Parse the parallel result strings back into an id → granted map
//! - Merge capability booleans onto resource objects non-destructively
//!
//! # Design Decisions
//! - A failed or unparseable check is never an error on the read path: every
//!   requested id degrades to false and the degradation is logged
//! - No deduplication; callers own the shape of the batch

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;

use crate::config::AccessConfig;
use crate::context::RequestContext;
use crate::proxy::ProxyClient;

/// One capability question: does the caller hold `access_kind` on this
/// resource?
#[derive(Debug, Clone)]
pub struct AccessCheck {
    pub resource_type: String,
    pub id: String,
    pub access_kind: String,
}

impl AccessCheck {
    pub fn new(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        access_kind: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            access_kind: access_kind.into(),
        }
    }

    /// Wire encoding understood by the access endpoint.
    fn encode(&self) -> String {
        format!("{}:{}#{}", self.resource_type, self.id, self.access_kind)
    }
}

#[derive(Debug, Deserialize)]
struct AccessCheckResponseBody {
    results: Vec<String>,
}

/// Client for the batch access-check endpoint.
#[derive(Debug, Clone)]
pub struct AccessChecker {
    client: Arc<ProxyClient>,
    config: AccessConfig,
}

impl AccessChecker {
    pub fn new(client: Arc<ProxyClient>, config: AccessConfig) -> Self {
        Self { client, config }
    }

    /// Check a batch of capabilities in one upstream call.
    ///
    /// Returns a map from resource id to granted. Ids whose result is
    /// missing or unparseable map to false; if the whole call fails, every
    /// requested id maps to false. This method never returns an error.
    pub async fn check_batch(
        &self,
        ctx: &RequestContext,
        checks: &[AccessCheck],
    ) -> HashMap<String, bool> {
        let mut granted: HashMap<String, bool> =
            checks.iter().map(|c| (c.id.clone(), false)).collect();
        if checks.is_empty() {
            return granted;
        }

        let body = serde_json::json!({
            "requests": checks.iter().map(AccessCheck::encode).collect::<Vec<_>>(),
        });

        let response = self
            .client
            .request::<AccessCheckResponseBody>(
                ctx,
                &self.config.service,
                &self.config.path,
                Method::POST,
                None,
                Some(&body),
                None,
            )
            .await;

        let results = match response {
            Ok(body) => body.results,
            Err(err) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    checks = checks.len(),
                    error = %err,
                    "access check failed, degrading to no access"
                );
                return granted;
            }
        };

        // Results are parallel to the request array.
        for (check, result) in checks.iter().zip(results.iter()) {
            match parse_result(result) {
                Some(allowed) => {
                    granted.insert(check.id.clone(), allowed);
                }
                None => {
                    tracing::warn!(
                        request_id = %ctx.request_id,
                        result = %result,
                        "unparseable access check result, degrading to no access"
                    );
                }
            }
        }
        granted
    }

    /// Annotate each resource object with the named capability under the
    /// accessKind's field name. All other fields are left unchanged.
    pub async fn add_access_to_resources(
        &self,
        ctx: &RequestContext,
        resources: &mut [serde_json::Value],
        resource_type: &str,
        id_field: &str,
        access_kind: &str,
    ) {
        let checks: Vec<AccessCheck> = resources
            .iter()
            .filter_map(|r| r.get(id_field).and_then(|v| v.as_str()))
            .map(|id| AccessCheck::new(resource_type, id, access_kind))
            .collect();
        let granted = self.check_batch(ctx, &checks).await;

        for resource in resources.iter_mut() {
            let allowed = resource
                .get(id_field)
                .and_then(|v| v.as_str())
                .and_then(|id| granted.get(id).copied())
                .unwrap_or(false);
            if let Some(object) = resource.as_object_mut() {
                object.insert(access_kind.to_string(), serde_json::Value::Bool(allowed));
            }
        }
    }

    /// Single-resource convenience wrapper over [`add_access_to_resources`].
    ///
    /// [`add_access_to_resources`]: Self::add_access_to_resources
    pub async fn add_access_to_resource(
        &self,
        ctx: &RequestContext,
        resource: &mut serde_json::Value,
        resource_type: &str,
        id_field: &str,
        access_kind: &str,
    ) {
        self.add_access_to_resources(
            ctx,
            std::slice::from_mut(resource),
            resource_type,
            id_field,
            access_kind,
        )
        .await;
    }
}

/// Parse one result string of the form `<type>:<id>#<kind>@<principal>:<granted>`.
fn parse_result(result: &str) -> Option<bool> {
    let (_, granted) = result.rsplit_once(':')?;
    match granted {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
