//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RegistrarConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::RegistrarConfig;

/// RPC round trips in one issuance before the receipt wait.
const LIFECYCLE_RPC_CALLS: u64 = 4;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &RegistrarConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }
    if config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::new("admin.api_key", "must not be empty"));
    }
    if config.ledger.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("ledger.rpc_timeout_secs", "must be greater than 0"));
    }
    if config.ledger.receipt_timeout_secs == 0 {
        errors.push(ValidationError::new("ledger.receipt_timeout_secs", "must be greater than 0"));
    }
    if config.ledger.poll_interval_ms == 0 {
        errors.push(ValidationError::new("ledger.poll_interval_ms", "must be greater than 0"));
    }
    if config.ledger.poll_interval_ms / 1000 >= config.ledger.receipt_timeout_secs {
        errors.push(ValidationError::new(
            "ledger.poll_interval_ms",
            "must be shorter than ledger.receipt_timeout_secs",
        ));
    }
    // connect, nonce, gas price and broadcast each take up to one RPC timeout
    let lifecycle_secs = config
        .ledger
        .receipt_timeout_secs
        .saturating_add(config.ledger.rpc_timeout_secs.saturating_mul(LIFECYCLE_RPC_CALLS));
    if config.server.request_timeout_secs <= lifecycle_secs {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            format!(
                "must be greater than ledger.receipt_timeout_secs + {} x ledger.rpc_timeout_secs ({}s)",
                LIFECYCLE_RPC_CALLS, lifecycle_secs
            ),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
