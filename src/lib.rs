//! Backend-for-frontend gateway for a collaboration platform.
//!
//! Fronts the platform microservice with four cooperating pieces: a proxy
//! client for typed upstream calls, an ETag coordinator for safe mutations,
//! a batch processor with partial-success semantics, and batched access
//! enrichment for the read path.

pub mod access;
pub mod batch;
pub mod config;
pub mod context;
pub mod error;
pub mod etag;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod resource;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
