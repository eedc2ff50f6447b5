//! Batched capability checks and read-path enrichment.
//!
//! # Data Flow
//! ```text
//! controller (list of resources)
//!     → AccessChecker::check_batch ("type:id#kind" strings, one call)
//!     → map of id → granted (false on any failure)
//!     → add_access_to_resource(s) (merge boolean onto each resource)
//! ```

pub mod checker;

pub use checker::{AccessCheck, AccessChecker};
