//! Error types for the certificate lifecycle.

use alloy::primitives::TxHash;
use thiserror::Error;

use crate::blockchain::BlockchainError;
use crate::certificates::types::{CertificateStatus, SkipReason};
use crate::settings::ConfigurationError;

/// Why a ledger interaction failed. Recorded on the record, never raised to
/// the triggering domain event.
#[derive(Debug, Clone, Error)]
pub enum CertificationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Ledger connection failed: {0}")]
    Connection(#[source] BlockchainError),

    #[error("Ledger submission failed: {0}")]
    Submission(#[source] BlockchainError),

    #[error("Receipt wait failed: {0}")]
    Receipt(#[source] BlockchainError),

    #[error("Transaction {0} failed (reverted on chain)")]
    ChainRevert(TxHash),

    #[error("Transaction {tx_hash} submitted but no {event} confirmation event was found")]
    EventMissing { tx_hash: TxHash, event: &'static str },

    #[error("Ledger query failed: {0}")]
    Query(#[source] BlockchainError),

    #[error("Record store error: {0}")]
    Store(String),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("Unexpected fault: {0}")]
    Fault(String),
}

impl From<StoreError> for CertificationError {
    fn from(e: StoreError) -> Self {
        CertificationError::Store(e.to_string())
    }
}

/// Operator action rejected before any ledger interaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("Certificate for attempt {0} is already registered on the blockchain")]
    AlreadyConfirmed(String),

    #[error("Certificate for attempt {attempt_id} cannot be revoked: status is {}", .status.map(|s| s.to_string()).unwrap_or_else(|| "not issued".to_string()))]
    NotConfirmed {
        attempt_id: String,
        status: Option<CertificateStatus>,
    },

    #[error("Attempt {attempt_id} is not eligible for certification: {reason}")]
    NotEligible { attempt_id: String, reason: SkipReason },

    #[error("No completed attempt with id {0}")]
    UnknownAttempt(String),
}

/// Persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CertificationError::ChainRevert(TxHash::ZERO);
        assert!(err.to_string().contains("reverted on chain"));

        let err = PreconditionError::NotConfirmed {
            attempt_id: "a-1".to_string(),
            status: None,
        };
        assert!(err.to_string().contains("not issued"));

        let err = PreconditionError::NotConfirmed {
            attempt_id: "a-1".to_string(),
            status: Some(CertificateStatus::Error),
        };
        assert!(err.to_string().contains("status is Error"));

        let err = CertificationError::from(ConfigurationError::Missing(vec!["ledger.rpc_url"]));
        assert!(err.to_string().contains("configuration is missing"));
    }
}
