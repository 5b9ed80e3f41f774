//! Shared fixtures for integration tests.
//!
//! `ScriptedLedger` stands in for the ledger: each test scripts how the next
//! connection, submission and receipt behave, then inspects what was sent.

#![allow(dead_code)]

use alloy::primitives::{Address, Log, TxHash, U256};
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cert_registrar::blockchain::abi::{CertificateIssued, CertificateRevoked};
use cert_registrar::blockchain::{
    BlockchainError, BlockchainResult, CertificateView, LedgerGateway, LedgerReceipt,
    LedgerSession, PendingTx,
};
use cert_registrar::certificates::{
    CertificateManager, CertificationTarget, FileStore, TriggerSurface,
};
use cert_registrar::settings::{
    LedgerConfig, MemorySettings, SettingsResolver, KEY_CONTRACT_ADDRESS, KEY_RPC_URL,
    KEY_SIGNER_KEY,
};

pub const RPC_URL: &str = "http://ledger.test:8545";
pub const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const SIGNER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// How the mined receipt for the next transaction looks.
#[derive(Debug, Clone)]
pub enum ReceiptScript {
    /// Success with a `CertificateIssued` log carrying this id.
    Issued(u64),
    /// Success with a `CertificateRevoked` log.
    Revoked,
    /// Success with no logs.
    NoEvent,
    /// Mined with status 0.
    Reverted,
    /// Never mined within the wait bound.
    Timeout,
}

#[derive(Debug)]
pub struct LedgerScript {
    pub connect_error: Option<String>,
    pub submit_error: Option<String>,
    pub panic_on_submit: bool,
    pub issue_receipt: ReceiptScript,
    pub revoke_receipt: ReceiptScript,
    pub receipt_delay: Duration,
}

impl Default for LedgerScript {
    fn default() -> Self {
        Self {
            connect_error: None,
            submit_error: None,
            panic_on_submit: false,
            issue_receipt: ReceiptScript::Issued(42),
            revoke_receipt: ReceiptScript::Revoked,
            receipt_delay: Duration::ZERO,
        }
    }
}

/// What the scripted ledger observed.
#[derive(Debug, Default, Clone)]
pub struct LedgerCalls {
    pub connects: Vec<String>,
    pub issuances: Vec<(String, String)>,
    pub revocations: Vec<U256>,
    pub receipts: usize,
    pub verifications: Vec<U256>,
}

impl LedgerCalls {
    pub fn submissions(&self) -> usize {
        self.issuances.len() + self.revocations.len()
    }
}

#[derive(Default)]
struct Inner {
    script: LedgerScript,
    calls: LedgerCalls,
    next_hash: u8,
    revocation_hashes: Vec<TxHash>,
}

#[derive(Clone, Default)]
pub struct ScriptedLedger {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, f: impl FnOnce(&mut LedgerScript)) {
        f(&mut self.inner.lock().unwrap().script);
    }

    pub fn calls(&self) -> LedgerCalls {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Hash that the nth submission (1-based) receives.
    pub fn tx_hash(n: u8) -> TxHash {
        TxHash::repeat_byte(n)
    }

    fn next_pending(&self, revocation: bool) -> PendingTx {
        let mut inner = self.inner.lock().unwrap();
        inner.next_hash += 1;
        let tx_hash = Self::tx_hash(inner.next_hash);
        if revocation {
            inner.revocation_hashes.push(tx_hash);
        }
        PendingTx { tx_hash }
    }
}

#[async_trait]
impl LedgerGateway for ScriptedLedger {
    async fn connect(&self, rpc_url: &str) -> BlockchainResult<Box<dyn LedgerSession>> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.connects.push(rpc_url.to_string());
        if let Some(reason) = inner.script.connect_error.clone() {
            return Err(BlockchainError::Connection {
                endpoint: rpc_url.to_string(),
                reason,
            });
        }
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl LedgerSession for ScriptedLedger {
    async fn submit_issuance(
        &self,
        _config: &LedgerConfig,
        student_name: &str,
        course_name: &str,
    ) -> BlockchainResult<PendingTx> {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.script.panic_on_submit {
                drop(inner);
                panic!("scripted ledger panic");
            }
            if let Some(reason) = inner.script.submit_error.clone() {
                return Err(BlockchainError::Submission(reason));
            }
            inner
                .calls
                .issuances
                .push((student_name.to_string(), course_name.to_string()));
        }
        Ok(self.next_pending(false))
    }

    async fn submit_revocation(
        &self,
        _config: &LedgerConfig,
        certificate_id: U256,
    ) -> BlockchainResult<PendingTx> {
        {
            let mut inner = self.inner.lock().unwrap();
            if let Some(reason) = inner.script.submit_error.clone() {
                return Err(BlockchainError::Submission(reason));
            }
            inner.calls.revocations.push(certificate_id);
        }
        Ok(self.next_pending(true))
    }

    async fn await_receipt(&self, pending: PendingTx) -> BlockchainResult<LedgerReceipt> {
        let (delay, script) = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.receipts += 1;
            let is_revocation = inner.revocation_hashes.contains(&pending.tx_hash);
            let script = if is_revocation {
                inner.script.revoke_receipt.clone()
            } else {
                inner.script.issue_receipt.clone()
            };
            (inner.script.receipt_delay, script)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let (success, logs) = match script {
            ReceiptScript::Issued(id) => (true, vec![issued_log(id)]),
            ReceiptScript::Revoked => (true, vec![revoked_log()]),
            ReceiptScript::NoEvent => (true, Vec::new()),
            ReceiptScript::Reverted => (false, Vec::new()),
            ReceiptScript::Timeout => {
                return Err(BlockchainError::ReceiptTimeout {
                    tx_hash: pending.tx_hash,
                    secs: 120,
                })
            }
        };

        Ok(LedgerReceipt {
            tx_hash: pending.tx_hash,
            success,
            block_number: Some(1),
            logs,
        })
    }

    async fn verify_certificate(
        &self,
        _config: &LedgerConfig,
        certificate_id: U256,
    ) -> BlockchainResult<CertificateView> {
        self.inner
            .lock()
            .unwrap()
            .calls
            .verifications
            .push(certificate_id);
        Ok(CertificateView {
            certificate_id,
            valid: true,
            student_name: "Ada Lovelace".to_string(),
            course_name: "Analytical Engines".to_string(),
            issuer: Address::repeat_byte(0x11),
            issue_date: U256::from(1_700_000_000u64),
        })
    }
}

pub fn issued_log(id: u64) -> Log {
    Log {
        address: CONTRACT.parse().unwrap(),
        data: CertificateIssued {
            certificateId: U256::from(id),
            issuer: Address::repeat_byte(0x11),
            studentName: "Ada Lovelace".to_string(),
        }
        .encode_log_data(),
    }
}

pub fn revoked_log() -> Log {
    Log {
        address: CONTRACT.parse().unwrap(),
        data: CertificateRevoked {
            certificateId: U256::from(42),
        }
        .encode_log_data(),
    }
}

/// Settings with every required ledger key present.
pub fn configured_settings() -> MemorySettings {
    let settings = MemorySettings::new();
    settings.set(KEY_RPC_URL, RPC_URL);
    settings.set(KEY_CONTRACT_ADDRESS, CONTRACT);
    settings.set(KEY_SIGNER_KEY, SIGNER_KEY);
    settings
}

pub fn passed_attempt(id: &str) -> CertificationTarget {
    CertificationTarget {
        id: id.to_string(),
        student_name: Some("Ada Lovelace".to_string()),
        email: Some("ada@example.org".to_string()),
        course_title: Some("Analytical Engines".to_string()),
        passed: true,
        certification_required: true,
    }
}

/// A wired registrar over a scripted ledger and an in-memory store.
pub struct Harness {
    pub ledger: ScriptedLedger,
    pub settings: MemorySettings,
    pub store: FileStore,
    pub triggers: Arc<TriggerSurface>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(configured_settings())
    }

    pub fn with_settings(settings: MemorySettings) -> Self {
        let ledger = ScriptedLedger::new();
        let store = FileStore::in_memory();
        let manager = CertificateManager::new(
            Arc::new(SettingsResolver::new(Arc::new(settings.clone()))),
            Arc::new(ledger.clone()),
            Arc::new(store.clone()),
        );
        let triggers = Arc::new(TriggerSurface::new(Arc::new(manager), Arc::new(store.clone())));
        Self {
            ledger,
            settings,
            store,
            triggers,
        }
    }

    pub fn manager(&self) -> &CertificateManager {
        self.triggers.manager()
    }

    /// Complete `target` with a host step that always succeeds.
    pub async fn complete(
        &self,
        target: CertificationTarget,
    ) -> cert_registrar::certificates::AttemptCompletion<(), String> {
        self.triggers.complete_attempt(target, |_| Ok(())).await
    }
}
