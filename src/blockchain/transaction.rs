//! Transaction building, signing, and receipt monitoring.
//!
//! # Responsibilities
//! - Build contract calls with a fresh nonce and gas price
//! - Sign and broadcast, returning the hash before any waiting
//! - Poll for the receipt within a bounded timeout

use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::time::{Duration, Instant};
use tokio::time::{interval, timeout};

use crate::blockchain::client::LedgerClient;
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, LedgerClientConfig, LedgerReceipt, PendingTx,
};
use crate::blockchain::wallet::Wallet;
use crate::observability::metrics;

/// Builds and signs contract-call transactions for one wallet.
pub struct TxBuilder<'a> {
    client: &'a LedgerClient,
    wallet: &'a Wallet,
    config: &'a LedgerClientConfig,
}

impl<'a> TxBuilder<'a> {
    pub fn new(client: &'a LedgerClient, wallet: &'a Wallet, config: &'a LedgerClientConfig) -> Self {
        Self {
            client,
            wallet,
            config,
        }
    }

    /// Build a legacy contract-call transaction.
    ///
    /// # Arguments
    /// * `to` - Contract address
    /// * `data` - ABI-encoded call data
    /// * `gas_limit` - Gas limit from the ledger settings
    pub async fn build(
        &self,
        to: Address,
        data: Bytes,
        gas_limit: u64,
    ) -> BlockchainResult<TransactionRequest> {
        // Fresh per submission; both values move under us.
        let nonce = self.client.get_transaction_count(self.wallet.address()).await?;
        let gas_price = self.client.get_gas_price().await?;

        if self.config.max_gas_price_gwei > 0 {
            let gas_price_gwei = gas_price / 1_000_000_000;
            if gas_price_gwei > self.config.max_gas_price_gwei as u128 {
                return Err(BlockchainError::GasPriceTooHigh {
                    current_gwei: gas_price_gwei as u64,
                    max_gwei: self.config.max_gas_price_gwei,
                });
            }
        }

        Ok(build_call_request(
            to,
            data,
            nonce,
            gas_price,
            gas_limit,
            self.wallet.chain_id(),
        ))
    }

    /// Sign and broadcast. Returns as soon as the node accepts the transaction.
    pub async fn sign_and_send(&self, request: TransactionRequest) -> BlockchainResult<PendingTx> {
        let envelope = self.wallet.sign_transaction(request).await?;
        let local_hash = *envelope.tx_hash();
        let encoded = envelope.encoded_2718();

        let tx_hash = self.client.send_raw_transaction(&encoded).await?;
        if tx_hash != local_hash {
            tracing::warn!(
                local = %local_hash,
                remote = %tx_hash,
                "Node reported a different transaction hash"
            );
        }

        tracing::info!(tx_hash = %tx_hash, from = %self.wallet.address(), "Transaction broadcast");
        Ok(PendingTx { tx_hash })
    }
}

/// Wait for a transaction to be mined.
///
/// Polls at `poll_interval_ms` until the receipt appears and, when
/// `confirmation_blocks` is non-zero, until that many blocks sit on top.
pub async fn wait_for_receipt(
    client: &LedgerClient,
    config: &LedgerClientConfig,
    tx_hash: TxHash,
) -> BlockchainResult<LedgerReceipt> {
    let required_confirmations = config.confirmation_blocks;
    let timeout_secs = config.receipt_timeout_secs;
    let poll_interval = Duration::from_millis(config.poll_interval_ms.max(1));
    let started = Instant::now();

    let result = timeout(Duration::from_secs(timeout_secs), async {
        let mut ticker = interval(poll_interval);

        loop {
            ticker.tick().await;

            let receipt = match client.get_transaction_receipt(tx_hash).await {
                Ok(Some(r)) => r,
                Ok(None) => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    continue;
                }
                // A single failed poll is not fatal; the outer timeout bounds us.
                Err(e) => {
                    tracing::debug!(tx_hash = %tx_hash, error = %e, "Receipt poll failed");
                    continue;
                }
            };

            if required_confirmations == 0 || !receipt.status() {
                return LedgerReceipt::from(&receipt);
            }

            let current_block = match client.get_block_number().await {
                Ok(block) => block,
                Err(_) => continue,
            };
            let tx_block = receipt.block_number.unwrap_or(current_block);
            let confirmations = current_block.saturating_sub(tx_block);

            if confirmations >= required_confirmations {
                return LedgerReceipt::from(&receipt);
            }

            tracing::debug!(
                tx_hash = %tx_hash,
                confirmations,
                required = required_confirmations,
                "Waiting for confirmations"
            );
        }
    })
    .await;

    metrics::record_receipt_wait(started.elapsed());

    result.map_err(|_| BlockchainError::ReceiptTimeout {
        tx_hash,
        secs: timeout_secs,
    })
}

/// Assemble a legacy (EIP-155) call with every field the signer needs.
pub fn build_call_request(
    to: Address,
    data: Bytes,
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    chain_id: u64,
) -> TransactionRequest {
    TransactionRequest::default()
        .with_to(to)
        .with_value(U256::ZERO)
        .with_input(data)
        .with_nonce(nonce)
        .with_gas_price(gas_price)
        .with_gas_limit(gas_limit)
        .with_chain_id(chain_id)
}
