//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, graceful shutdown)
//!     → admin::auth (bearer token check)
//!     → attempts.rs (host completion hook)
//!     → admin::handlers (operator actions)
//! ```

pub mod attempts;
pub mod server;

pub use server::{AppState, HttpServer};
