//! Ledger RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint and check it is alive
//! - Query chain state (nonce, gas price, block number, receipts)
//! - Broadcast signed transactions and run read-only calls
//! - Bound every request with the configured timeout

use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId};
use crate::observability::metrics;

/// JSON-RPC client bound to a single ledger endpoint.
#[derive(Clone)]
pub struct LedgerClient {
    provider: Arc<dyn Provider + Send + Sync>,
    /// Host and port only; full URLs may embed API keys.
    endpoint: String,
    chain_id: ChainId,
    timeout_duration: Duration,
}

impl LedgerClient {
    /// Connect to an endpoint and verify it answers `eth_chainId`.
    ///
    /// # Arguments
    /// * `rpc_url` - HTTP(S) JSON-RPC endpoint
    /// * `rpc_timeout_secs` - Bound for each individual request
    pub async fn connect(rpc_url: &str, rpc_timeout_secs: u64) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(rpc_timeout_secs);

        let url: url::Url = rpc_url.parse().map_err(|e| BlockchainError::Connection {
            endpoint: "<invalid url>".to_string(),
            reason: format!("Invalid RPC URL: {}", e),
        })?;
        let endpoint = redact_endpoint(&url);

        let provider =
            Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>;

        let chain_id = match timeout(timeout_duration, provider.get_chain_id()).await {
            Ok(Ok(id)) => ChainId(id),
            Ok(Err(e)) => {
                metrics::record_ledger_health(false);
                return Err(BlockchainError::Connection {
                    endpoint,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                metrics::record_ledger_health(false);
                return Err(BlockchainError::Connection {
                    endpoint,
                    reason: format!("no response within {} seconds", rpc_timeout_secs),
                });
            }
        };

        metrics::record_ledger_health(true);
        tracing::debug!(endpoint = %endpoint, chain_id = chain_id.0, "Connected to ledger");

        Ok(Self {
            provider,
            endpoint,
            chain_id,
            timeout_duration,
        })
    }

    /// Run one RPC request under the client timeout.
    async fn request<T, E, F>(&self, method: &'static str, fut: F) -> BlockchainResult<T>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(endpoint = %self.endpoint, method, error = %e, "RPC error");
                Err(BlockchainError::Rpc(format!("{} failed: {}", method, e)))
            }
            Err(_) => {
                tracing::warn!(endpoint = %self.endpoint, method, "RPC timeout");
                Err(BlockchainError::Timeout(self.timeout_duration.as_secs()))
            }
        }
    }

    /// Chain ID reported at connect time.
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Endpoint host, safe for logs.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.request("eth_blockNumber", self.provider.get_block_number())
            .await
    }

    /// Get the transaction count (nonce) for an address, including pending.
    pub async fn get_transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        self.request(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address).pending(),
        )
        .await
    }

    /// Get current gas price in wei.
    pub async fn get_gas_price(&self) -> BlockchainResult<u128> {
        self.request("eth_gasPrice", self.provider.get_gas_price())
            .await
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>> {
        self.request(
            "eth_getTransactionReceipt",
            self.provider.get_transaction_receipt(tx_hash),
        )
        .await
    }

    /// Broadcast a signed, EIP-2718 encoded transaction.
    pub async fn send_raw_transaction(&self, encoded: &[u8]) -> BlockchainResult<TxHash> {
        match timeout(self.timeout_duration, self.provider.send_raw_transaction(encoded)).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => Err(BlockchainError::Submission(e.to_string())),
            Err(_) => Err(BlockchainError::Timeout(self.timeout_duration.as_secs())),
        }
    }

    /// Execute a read-only contract call.
    pub async fn call(&self, request: TransactionRequest) -> BlockchainResult<Bytes> {
        self.request("eth_call", self.provider.call(request)).await
    }

    /// Check if the ledger is reachable.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_ledger_health(healthy);
        healthy
    }
}

/// Keep scheme, host and port; drop path, query and credentials.
fn redact_endpoint(url: &url::Url) -> String {
    match (url.host_str(), url.port_or_known_default()) {
        (Some(host), Some(port)) => format!("{}://{}:{}", url.scheme(), host, port),
        (Some(host), None) => format!("{}://{}", url.scheme(), host),
        _ => url.scheme().to_string(),
    }
}

impl std::fmt::Debug for LedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerClient")
            .field("endpoint", &self.endpoint)
            .field("chain_id", &self.chain_id.0)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
