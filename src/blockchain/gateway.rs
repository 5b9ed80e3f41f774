//! Ledger adapter seam used by the certificate lifecycle.
//!
//! `LedgerGateway` opens a session per operation; `LedgerSession` exposes the
//! two-phase submit / await split so callers can persist the transaction hash
//! before blocking on the receipt.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::blockchain::abi::{issueCertificateCall, revokeCertificateCall, verifyCertificateCall};
use crate::blockchain::client::LedgerClient;
use crate::blockchain::transaction::{wait_for_receipt, TxBuilder};
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, CertificateView, LedgerClientConfig, LedgerReceipt,
    PendingTx,
};
use crate::blockchain::wallet::Wallet;
use crate::observability::metrics;
use crate::settings::LedgerConfig;

/// Opens connections to the ledger.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Connect to `rpc_url`; fails if the node does not answer a liveness check.
    async fn connect(&self, rpc_url: &str) -> BlockchainResult<Box<dyn LedgerSession>>;
}

/// A live connection to one ledger node.
#[async_trait]
pub trait LedgerSession: Send + Sync {
    /// Broadcast `issueCertificate(studentName, courseName)`.
    async fn submit_issuance(
        &self,
        config: &LedgerConfig,
        student_name: &str,
        course_name: &str,
    ) -> BlockchainResult<PendingTx>;

    /// Broadcast `revokeCertificate(certificateId)`.
    async fn submit_revocation(
        &self,
        config: &LedgerConfig,
        certificate_id: U256,
    ) -> BlockchainResult<PendingTx>;

    /// Block until the transaction is mined or the receipt timeout elapses.
    async fn await_receipt(&self, pending: PendingTx) -> BlockchainResult<LedgerReceipt>;

    /// Read a certificate through `verifyCertificate(id)`.
    async fn verify_certificate(
        &self,
        config: &LedgerConfig,
        certificate_id: U256,
    ) -> BlockchainResult<CertificateView>;
}

/// Per-signer submission locks, shared across sessions.
type SignerLocks = Arc<DashMap<Address, Arc<Mutex<()>>>>;

/// `LedgerGateway` talking JSON-RPC through alloy.
#[derive(Clone)]
pub struct AlloyGateway {
    config: LedgerClientConfig,
    signer_locks: SignerLocks,
}

impl AlloyGateway {
    pub fn new(config: LedgerClientConfig) -> Self {
        Self {
            config,
            signer_locks: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait]
impl LedgerGateway for AlloyGateway {
    async fn connect(&self, rpc_url: &str) -> BlockchainResult<Box<dyn LedgerSession>> {
        let client = LedgerClient::connect(rpc_url, self.config.rpc_timeout_secs).await?;
        Ok(Box::new(AlloySession {
            client,
            config: self.config.clone(),
            signer_locks: self.signer_locks.clone(),
        }))
    }
}

/// Session over a connected `LedgerClient`.
pub struct AlloySession {
    client: LedgerClient,
    config: LedgerClientConfig,
    signer_locks: SignerLocks,
}

impl AlloySession {
    fn contract_address(config: &LedgerConfig) -> BlockchainResult<Address> {
        config
            .contract_address
            .trim()
            .parse()
            .map_err(|_| BlockchainError::InvalidAddress(config.contract_address.clone()))
    }

    /// Sign and broadcast `data` to the registry.
    ///
    /// Holds the signer's lock from nonce query to broadcast so concurrent
    /// submissions from one account never reuse a nonce.
    async fn submit(
        &self,
        config: &LedgerConfig,
        data: Vec<u8>,
        kind: &'static str,
    ) -> BlockchainResult<PendingTx> {
        let contract = Self::contract_address(config)?;
        let wallet = Wallet::from_private_key(&config.signer_key, self.client.chain_id().0)?;

        let lock = self
            .signer_locks
            .entry(wallet.address())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let builder = TxBuilder::new(&self.client, &wallet, &self.config);
        let request = builder
            .build(contract, Bytes::from(data), config.gas_limit)
            .await?;
        let pending = builder.sign_and_send(request).await?;

        metrics::record_submission(kind);
        Ok(pending)
    }
}

#[async_trait]
impl LedgerSession for AlloySession {
    async fn submit_issuance(
        &self,
        config: &LedgerConfig,
        student_name: &str,
        course_name: &str,
    ) -> BlockchainResult<PendingTx> {
        let call = issueCertificateCall {
            studentName: student_name.to_string(),
            courseName: course_name.to_string(),
        };
        self.submit(config, call.abi_encode(), "issue").await
    }

    async fn submit_revocation(
        &self,
        config: &LedgerConfig,
        certificate_id: U256,
    ) -> BlockchainResult<PendingTx> {
        let call = revokeCertificateCall { id: certificate_id };
        self.submit(config, call.abi_encode(), "revoke").await
    }

    async fn await_receipt(&self, pending: PendingTx) -> BlockchainResult<LedgerReceipt> {
        wait_for_receipt(&self.client, &self.config, pending.tx_hash).await
    }

    async fn verify_certificate(
        &self,
        config: &LedgerConfig,
        certificate_id: U256,
    ) -> BlockchainResult<CertificateView> {
        let contract = Self::contract_address(config)?;
        let request = TransactionRequest::default()
            .with_to(contract)
            .with_input(verifyCertificateCall { id: certificate_id }.abi_encode());

        let output = self.client.call(request).await?;
        let decoded = verifyCertificateCall::abi_decode_returns(&output)
            .map_err(|e| BlockchainError::Decode(e.to_string()))?;

        Ok(CertificateView {
            certificate_id,
            valid: decoded.valid,
            student_name: decoded.student,
            course_name: decoded.course,
            issuer: decoded.issuer,
            issue_date: decoded.date,
        })
    }
}
