//! Partial-success batch processor with authorization fail-fast.
//!
//! # Responsibilities
//! - Apply N independent operations of the same shape against one parent
//!   resource
//! - Probe the first input alone; a 403 there aborts the whole batch before
//!   any further call is made
//! - Run the remainder concurrently, capturing per-item failures without
//!   cancelling siblings
//! - Assemble results in input order with a summary derived from them
//!
//! # Design Decisions
//! - Concurrency is in-flight I/O on one event loop, not parallelism; a
//!   timed-out item simply records as a Failure
//! - An authorization error on a later item is an ordinary per-item failure;
//!   only the probe triggers fail-fast

use std::future::Future;

use axum::http::StatusCode;
use futures_util::future::join_all;
use serde::Serialize;

use crate::error::{ErrorBody, GatewayError};

/// Outcome of one batch item, in input order.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome<I, T> {
    Succeeded { data: T },
    Failed { input: I, error: BatchError },
}

impl<I, T> BatchOutcome<I, T> {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Succeeded { .. })
    }
}

/// Error shape recorded for a failed batch item.
#[derive(Debug, Clone, Serialize)]
pub struct BatchError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&GatewayError> for BatchError {
    fn from(err: &GatewayError) -> Self {
        let body = ErrorBody::from(err);
        BatchError {
            message: body.message,
            code: body.code,
            details: body.details,
        }
    }
}

/// Counts derived from the result collection they accompany.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Per-item outcomes plus their summary.
#[derive(Debug, Serialize)]
pub struct BatchReport<I, T> {
    pub results: Vec<BatchOutcome<I, T>>,
    pub summary: BatchSummary,
}

impl<I, T> BatchReport<I, T> {
    /// Derive the summary from the results; the two are never computed
    /// independently.
    fn from_results(results: Vec<BatchOutcome<I, T>>) -> Self {
        let successful = results.iter().filter(|r| r.is_success()).count();
        let summary = BatchSummary {
            total: results.len(),
            successful,
            failed: results.len() - successful,
        };
        Self { results, summary }
    }
}

/// The mutation kind a batch endpoint performs, for status selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Create,
    Update,
    Delete,
}

/// Status-code policy shared by every batch endpoint: all succeeded → 201
/// (create) / 200 (update, delete); all failed → 400; mixed → 207.
pub fn batch_status(kind: BatchKind, summary: &BatchSummary) -> StatusCode {
    if summary.failed == 0 {
        match kind {
            BatchKind::Create => StatusCode::CREATED,
            BatchKind::Update | BatchKind::Delete => StatusCode::OK,
        }
    } else if summary.successful == 0 {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::MULTI_STATUS
    }
}

/// Apply `op` to every input with first-item probing.
///
/// The first input runs alone. If it fails with `AuthorizationDenied` the
/// whole batch is abandoned and that error is returned: a 403 on the very
/// first item means the caller lacks permission for the entire batch, and
/// attempting the rest would waste calls. Any other probe failure is
/// recorded and the remaining inputs still run, concurrently, with results
/// assembled in input order.
///
/// Callers must reject empty input before invoking the processor; an empty
/// batch here yields an empty report.
pub async fn run_batch<I, T, F, Fut>(inputs: Vec<I>, op: F) -> Result<BatchReport<I, T>, GatewayError>
where
    I: Clone,
    F: Fn(usize, I) -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let mut inputs = inputs.into_iter();
    let first = match inputs.next() {
        Some(first) => first,
        None => return Ok(BatchReport::from_results(Vec::new())),
    };

    let probe = match op(0, first.clone()).await {
        Ok(data) => BatchOutcome::Succeeded { data },
        Err(err @ GatewayError::AuthorizationDenied { .. }) => return Err(err),
        Err(err) => BatchOutcome::Failed {
            input: first,
            error: BatchError::from(&err),
        },
    };

    let rest = inputs.enumerate().map(|(offset, input)| {
        let fut = op(offset + 1, input.clone());
        async move {
            match fut.await {
                Ok(data) => BatchOutcome::Succeeded { data },
                Err(err) => BatchOutcome::Failed {
                    input,
                    error: BatchError::from(&err),
                },
            }
        }
    });

    let mut results = Vec::with_capacity(1 + rest.len());
    results.push(probe);
    results.extend(join_all(rest).await);

    Ok(BatchReport::from_results(results))
}
