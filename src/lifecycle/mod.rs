//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Signal received → stop accepting → drain in-flight requests → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans the shutdown signal out to every task
//! - In-flight batch items are never cancelled; the server drains them

pub mod shutdown;

pub use shutdown::Shutdown;
