//! Meeting controllers: read-path enrichment and safe mutation.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use reqwest::Method;

use crate::context::RequestContext;
use crate::error::GatewayError;
use crate::http::server::AppState;
use crate::resource::ResourceRev;

pub(crate) const PLATFORM: &str = "platform";
pub(crate) const MEETING_COLLECTION: &str = "meetings";
const MEETING_TYPE: &str = "meeting";
const ORGANIZER: &str = "organizer";
const ID_FIELD: &str = "uid";

/// List meetings, annotated with the caller's organizer capability.
pub async fn list_meetings(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<serde_json::Value>>, GatewayError> {
    let started = ctx.operation_start("list_meetings");

    let params: Vec<(&str, &str)> = query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    let mut meetings = state
        .client
        .request::<Vec<serde_json::Value>>(
            &ctx,
            PLATFORM,
            "/meetings",
            Method::GET,
            if params.is_empty() { None } else { Some(&params) },
            None,
            None,
        )
        .await?;

    state
        .access
        .add_access_to_resources(&ctx, &mut meetings, MEETING_TYPE, ID_FIELD, ORGANIZER)
        .await;

    ctx.operation_finish("list_meetings", started);
    Ok(Json(meetings))
}

/// Fetch one meeting, annotated with the caller's organizer capability.
pub async fn get_meeting(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(uid): Path<String>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let started = ctx.operation_start("get_meeting");

    let path = ResourceRev::parse(&uid)?.path(MEETING_COLLECTION);
    let mut meeting = state
        .client
        .request::<serde_json::Value>(&ctx, PLATFORM, &path, Method::GET, None, None, None)
        .await?;

    state
        .access
        .add_access_to_resource(&ctx, &mut meeting, MEETING_TYPE, ID_FIELD, ORGANIZER)
        .await;

    ctx.operation_finish("get_meeting", started);
    Ok(Json(meeting))
}

/// Update a meeting through the conditional-write protocol.
pub async fn update_meeting(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(uid): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    if !body.is_object() {
        return Err(GatewayError::validation("request body must be a JSON object"));
    }
    let started = ctx.operation_start("update_meeting");

    let path = ResourceRev::parse(&uid)?.path(MEETING_COLLECTION);
    let updated = state
        .etag
        .update_with_etag::<serde_json::Value>(&ctx, PLATFORM, &path, &body)
        .await?;

    ctx.operation_finish("update_meeting", started);
    Ok(Json(updated))
}

/// Delete a meeting through the conditional-write protocol.
pub async fn delete_meeting(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(uid): Path<String>,
) -> Result<StatusCode, GatewayError> {
    let started = ctx.operation_start("delete_meeting");

    let path = ResourceRev::parse(&uid)?.path(MEETING_COLLECTION);
    state.etag.delete_with_etag(&ctx, PLATFORM, &path).await?;

    ctx.operation_finish("delete_meeting", started);
    Ok(StatusCode::NO_CONTENT)
}
