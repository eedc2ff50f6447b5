//! Registrant batch controllers.
//!
//! Each endpoint applies one operation shape to every element of the array
//! body via the batch processor, then maps the summary onto the shared
//! status-code policy: 201/200 all success, 400 all failure, 207 mixed.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use reqwest::Method;
use serde::Serialize;

use crate::batch::{batch_status, run_batch, BatchKind, BatchReport};
use crate::context::RequestContext;
use crate::error::{FieldError, GatewayError};
use crate::http::handlers::meetings::{MEETING_COLLECTION, PLATFORM};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resource::{is_single_segment, ResourceRev};

/// Result payload for one deleted registrant.
#[derive(Debug, Serialize)]
pub struct DeletedRegistrant {
    pub uid: String,
}

/// Registrant writes are privileged: they run under the machine credential
/// when one is configured, on behalf of the authenticated caller.
fn write_context(state: &AppState, ctx: &RequestContext) -> RequestContext {
    match &state.m2m_token {
        Some(token) => ctx.with_machine_token(token),
        None => ctx.clone(),
    }
}

fn reject_empty(len: usize) -> Result<(), GatewayError> {
    if len == 0 {
        return Err(GatewayError::Validation {
            message: "batch body must contain at least one item".into(),
            fields: vec![FieldError {
                field: "body".into(),
                message: "empty array".into(),
            }],
        });
    }
    Ok(())
}

/// Create registrants in batch. 201 when every item succeeds.
pub async fn create_registrants(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(uid): Path<String>,
    Json(items): Json<Vec<serde_json::Value>>,
) -> Result<(StatusCode, Json<BatchReport<serde_json::Value, serde_json::Value>>), GatewayError> {
    reject_empty(items.len())?;
    validate_objects(&items)?;
    let started = ctx.operation_start("create_registrants");

    let path = format!("{}/registrants", ResourceRev::parse(&uid)?.path(MEETING_COLLECTION));
    let write_ctx = write_context(&state, &ctx);
    let client = state.client.as_ref();
    let (ctx_ref, path_ref) = (&write_ctx, path.as_str());

    let report = run_batch(items, move |_, item| async move {
        client
            .request::<serde_json::Value>(
                ctx_ref,
                PLATFORM,
                path_ref,
                Method::POST,
                None,
                Some(&item),
                None,
            )
            .await
    })
    .await?;

    metrics::record_batch("create", report.summary.successful, report.summary.failed);
    ctx.operation_finish("create_registrants", started);
    Ok((batch_status(BatchKind::Create, &report.summary), Json(report)))
}

/// Update registrants in batch, each through the conditional-write protocol.
/// 200 when every item succeeds.
pub async fn update_registrants(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(uid): Path<String>,
    Json(items): Json<Vec<serde_json::Value>>,
) -> Result<(StatusCode, Json<BatchReport<serde_json::Value, serde_json::Value>>), GatewayError> {
    reject_empty(items.len())?;
    validate_objects(&items)?;
    validate_uids(&items)?;
    let started = ctx.operation_start("update_registrants");

    let base = ResourceRev::parse(&uid)?.path(MEETING_COLLECTION);
    let write_ctx = write_context(&state, &ctx);
    let etag = &state.etag;
    let (ctx_ref, base_ref) = (&write_ctx, base.as_str());

    let report = run_batch(items, move |_, item| {
        let registrant_uid = item
            .get("uid")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        async move {
            let path = format!("{base_ref}/registrants/{registrant_uid}");
            etag.update_with_etag::<serde_json::Value>(ctx_ref, PLATFORM, &path, &item)
                .await
        }
    })
    .await?;

    metrics::record_batch("update", report.summary.successful, report.summary.failed);
    ctx.operation_finish("update_registrants", started);
    Ok((batch_status(BatchKind::Update, &report.summary), Json(report)))
}

/// Delete registrants in batch; the body is an array of registrant UIDs.
/// 200 when every item succeeds.
pub async fn delete_registrants(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(uid): Path<String>,
    Json(uids): Json<Vec<String>>,
) -> Result<(StatusCode, Json<BatchReport<String, DeletedRegistrant>>), GatewayError> {
    reject_empty(uids.len())?;
    validate_uid_segments(&uids)?;
    let started = ctx.operation_start("delete_registrants");

    let base = ResourceRev::parse(&uid)?.path(MEETING_COLLECTION);
    let write_ctx = write_context(&state, &ctx);
    let etag = &state.etag;
    let (ctx_ref, base_ref) = (&write_ctx, base.as_str());

    let report = run_batch(uids, move |_, registrant_uid| async move {
        let path = format!("{base_ref}/registrants/{registrant_uid}");
        etag.delete_with_etag(ctx_ref, PLATFORM, &path).await?;
        Ok(DeletedRegistrant { uid: registrant_uid })
    })
    .await?;

    metrics::record_batch("delete", report.summary.successful, report.summary.failed);
    ctx.operation_finish("delete_registrants", started);
    Ok((batch_status(BatchKind::Delete, &report.summary), Json(report)))
}

/// Every batch item must be a JSON object.
fn validate_objects(items: &[serde_json::Value]) -> Result<(), GatewayError> {
    let fields: Vec<FieldError> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| !item.is_object())
        .map(|(i, _)| FieldError {
            field: format!("body[{i}]"),
            message: "must be a JSON object".into(),
        })
        .collect();
    if fields.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::Validation {
            message: "batch items must be JSON objects".into(),
            fields,
        })
    }
}

/// Update items must carry the registrant's uid, and the uid must be usable
/// verbatim as an upstream path segment.
fn validate_uids(items: &[serde_json::Value]) -> Result<(), GatewayError> {
    let fields: Vec<FieldError> = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let field = format!("body[{i}].uid");
            match item.get("uid").and_then(|v| v.as_str()) {
                None | Some("") => Some(FieldError {
                    field,
                    message: "required".into(),
                }),
                Some(uid) if !is_single_segment(uid) => Some(FieldError {
                    field,
                    message: "must be a single path segment".into(),
                }),
                Some(_) => None,
            }
        })
        .collect();
    if fields.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::Validation {
            message: "every update item must carry a uid".into(),
            fields,
        })
    }
}

/// Delete bodies are bare uid strings; each must be a single path segment.
fn validate_uid_segments(uids: &[String]) -> Result<(), GatewayError> {
    let fields: Vec<FieldError> = uids
        .iter()
        .enumerate()
        .filter(|(_, uid)| !is_single_segment(uid))
        .map(|(i, _)| FieldError {
            field: format!("body[{i}]"),
            message: "must be a single path segment".into(),
        })
        .collect();
    if fields.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::Validation {
            message: "every uid must be a single path segment".into(),
            fields,
        })
    }
}
