//! Resource revision detection.
//!
//! The platform hosts two generations of meeting resources. Current ones are
//! keyed by UUID; legacy ones use opaque short ids and live under a different
//! path prefix. The generation is resolved exactly once, at the HTTP
//! boundary, and carried as an explicit variant from then on.

use uuid::Uuid;

use crate::error::{FieldError, GatewayError};

/// True when `value` can be embedded verbatim as one upstream path segment.
/// Separators, percent escapes, and dot-segments would address a different
/// resource once the URL is normalized.
pub fn is_single_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\', '%', '?', '#'])
        && !value.chars().any(|c| c.is_ascii_control() || c.is_whitespace())
}

/// Which generation of the platform a resource UID belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRev {
    /// Pre-migration resource, addressed under the legacy path prefix.
    Legacy(String),
    /// Current resource, keyed by UUID.
    Current(Uuid),
}

impl ResourceRev {
    /// Classify a UID by its shape. Valid UUIDs are current resources;
    /// anything else is legacy, provided it fits in a single path segment.
    pub fn parse(uid: &str) -> Result<Self, GatewayError> {
        if let Ok(uuid) = Uuid::parse_str(uid) {
            return Ok(ResourceRev::Current(uuid));
        }
        if is_single_segment(uid) {
            Ok(ResourceRev::Legacy(uid.to_string()))
        } else {
            Err(GatewayError::Validation {
                message: "invalid resource uid".into(),
                fields: vec![FieldError {
                    field: "uid".into(),
                    message: "must be a single path segment".into(),
                }],
            })
        }
    }

    /// Upstream path for this resource within a collection.
    pub fn path(&self, collection: &str) -> String {
        match self {
            ResourceRev::Legacy(id) => format!("/v1/{collection}/{id}"),
            ResourceRev::Current(uuid) => format!("/{collection}/{uuid}"),
        }
    }

    pub fn uid(&self) -> String {
        match self {
            ResourceRev::Legacy(id) => id.clone(),
            ResourceRev::Current(uuid) => uuid.to_string(),
        }
    }
}
