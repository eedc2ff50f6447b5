//! Request controllers.
//!
//! Controllers validate caller input, assemble the batch processor when the
//! body is an array, and delegate everything else to the proxy, ETag, and
//! access subsystems.

pub mod meetings;
pub mod registrants;

use axum::Json;

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
