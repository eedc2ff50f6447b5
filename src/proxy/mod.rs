//! Outbound proxy subsystem.
//!
//! # Data Flow
//! ```text
//! domain service / controller
//!     → ProxyClient (resolve service base URL, attach bearer token)
//!     → upstream HTTP call (bounded timeout)
//!     → decoded JSON body (+ headers when requested)
//! ```

pub mod client;

pub use client::{ProxyClient, ProxyResponse};
