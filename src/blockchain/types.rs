//! Chain-specific types and error definitions.

use alloy::primitives::{Address, Log, TxHash, U256};
use alloy::rpc::types::TransactionReceipt;
use serde::Serialize;
use thiserror::Error;

// Re-export LedgerClientConfig from config module to avoid duplication
pub use crate::config::schema::LedgerClientConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, Error)]
pub enum BlockchainError {
    /// Endpoint invalid, unreachable, or failed the liveness check.
    #[error("Could not connect to ledger endpoint {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    /// RPC request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Signing or broadcast was rejected.
    #[error("Transaction submission rejected: {0}")]
    Submission(String),

    /// Receipt was not observed within the wait bound.
    #[error("Transaction {tx_hash} not mined within {secs} seconds")]
    ReceiptTimeout { tx_hash: TxHash, secs: u64 },

    /// Invalid private key format or derivation error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Contract address could not be parsed.
    #[error("Invalid contract address '{0}'")]
    InvalidAddress(String),

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Call result could not be decoded against the contract ABI.
    #[error("ABI decode error: {0}")]
    Decode(String),
}

/// Result type for ledger operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// A broadcast transaction whose receipt has not been observed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTx {
    pub tx_hash: TxHash,
}

/// Mined transaction outcome with its emitted logs.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerReceipt {
    pub tx_hash: TxHash,
    /// False when the transaction was mined but reverted.
    pub success: bool,
    pub block_number: Option<u64>,
    pub logs: Vec<Log>,
}

impl From<&TransactionReceipt> for LedgerReceipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            success: receipt.status(),
            block_number: receipt.block_number,
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        }
    }
}

/// Result of the read-only `verifyCertificate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateView {
    pub certificate_id: U256,
    pub valid: bool,
    pub student_name: String,
    pub course_name: String,
    pub issuer: Address,
    /// Unix timestamp the contract recorded at issuance.
    pub issue_date: U256,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(31337u64);
        assert_eq!(chain_id.0, 31337);
        assert_eq!(u64::from(chain_id), 31337);
    }

    #[test]
    fn test_default_client_config() {
        let config = LedgerClientConfig::default();
        assert_eq!(config.rpc_timeout_secs, 10);
        assert_eq!(config.receipt_timeout_secs, 120);
        assert_eq!(config.confirmation_blocks, 0);
    }

    #[test]
    fn test_error_display() {
        let err = BlockchainError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = BlockchainError::Connection {
            endpoint: "127.0.0.1:8545".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("Could not connect"));

        let err = BlockchainError::ReceiptTimeout {
            tx_hash: TxHash::ZERO,
            secs: 120,
        };
        assert!(err.to_string().contains("not mined within 120 seconds"));
    }
}
