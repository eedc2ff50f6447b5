//! Optimistic concurrency for upstream mutations.
//!
//! # Data Flow
//! ```text
//! update/delete request
//!     → fetch resource (capture ETag header)
//!     → conditional PUT/DELETE with If-Match
//!     → upstream applies, or rejects with 412 if the tag went stale
//! ```

pub mod coordinator;

pub use coordinator::{EtagCoordinator, Snapshot};
