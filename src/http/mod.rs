//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → server.rs (Axum setup, middleware, request ID)
//!     → handlers (controllers: meetings, registrants, health)
//!     → domain plumbing (proxy, etag, batch, access)
//!     → JSON response (or structured error body)
//! ```

pub mod handlers;
pub mod server;

pub use server::{AppState, HttpServer};
