//! Batch operation subsystem.
//!
//! # Data Flow
//! ```text
//! controller (array body)
//!     → run_batch (probe input[0], then concurrent remainder)
//!     → BatchReport (per-item outcomes in input order + summary)
//!     → batch_status (201/200 all success, 400 all failure, 207 mixed)
//! ```

pub mod processor;

pub use processor::{
    batch_status, run_batch, BatchError, BatchKind, BatchOutcome, BatchReport, BatchSummary,
};
