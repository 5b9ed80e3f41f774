//! Certificate registrar library.
//!
//! Registers course completion certificates on an EVM certificate registry
//! and tracks each attempt's certificate through issuance and revocation.

pub mod admin;
pub mod blockchain;
pub mod certificates;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod settings;

pub use certificates::{CertificateManager, TriggerSurface};
pub use config::schema::RegistrarConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
