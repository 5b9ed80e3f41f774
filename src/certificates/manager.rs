//! Certificate transaction lifecycle.
//!
//! Drives one record through issuance or revocation:
//!
//! ```text
//! resolve settings → connect → submit ──persist hash──→ await receipt → decode event
//!        │              │         │                          │              │
//!        └──────────────┴─────────┴──────── Error ◀──────────┴──────────────┘
//! ```
//!
//! Failures are recorded on the record and returned as values. Nothing here
//! unwinds into the caller, so a ledger fault can never undo the domain event
//! that triggered issuance.

use alloy::primitives::{TxHash, U256};
use futures_util::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::blockchain::{
    decode_issued_event, decode_revoked_event, CertificateView, LedgerGateway, LedgerSession,
};
use crate::certificates::error::{CertificationError, PreconditionError};
use crate::certificates::store::RecordStore;
use crate::certificates::types::{
    CertificateRecord, CertificateStatus, CertificationTarget, SkipReason,
};
use crate::observability::metrics;
use crate::settings::{ConfigProvider, LedgerConfig};

/// Result of an issuance request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IssueOutcome {
    /// Preconditions not met; nothing was written or sent.
    Skipped { reason: SkipReason },
    /// Mined with a `CertificateIssued` event.
    Confirmed {
        tx_hash: TxHash,
        certificate_id: U256,
    },
    /// Recorded as Error on the record.
    Failed {
        tx_hash: Option<TxHash>,
        error: String,
    },
}

/// Result of a revocation request that passed its precondition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RevokeOutcome {
    Revoked { tx_hash: TxHash },
    /// Record stays Confirmed; the message is on the record.
    Failed {
        tx_hash: Option<TxHash>,
        error: String,
    },
}

/// Orchestrates settings, ledger adapter and record store.
#[derive(Clone)]
pub struct CertificateManager {
    config: Arc<dyn ConfigProvider>,
    gateway: Arc<dyn LedgerGateway>,
    store: Arc<dyn RecordStore>,
}

impl CertificateManager {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        gateway: Arc<dyn LedgerGateway>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            config,
            gateway,
            store,
        }
    }

    /// Current record for an attempt.
    pub fn record(&self, attempt_id: &str) -> Result<Option<CertificateRecord>, CertificationError> {
        Ok(self.store.get(attempt_id)?)
    }

    /// All records.
    pub fn records(&self) -> Result<Vec<CertificateRecord>, CertificationError> {
        Ok(self.store.list()?)
    }

    /// Issue a certificate for a passed attempt.
    ///
    /// A no-op when the attempt did not pass, its course does not require
    /// certification, or the record is already Confirmed.
    pub async fn issue(&self, target: &CertificationTarget) -> IssueOutcome {
        let existing = match self.store.get(&target.id) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(attempt_id = %target.id, error = %e, "Cannot read certificate record");
                metrics::record_issuance("error");
                return IssueOutcome::Failed {
                    tx_hash: None,
                    error: CertificationError::from(e).to_string(),
                };
            }
        };

        if let Some(reason) = skip_reason(target, existing.as_ref()) {
            tracing::debug!(attempt_id = %target.id, %reason, "Issuance skipped");
            metrics::record_issuance("skipped");
            return IssueOutcome::Skipped { reason };
        }

        let mut record = existing.unwrap_or_else(|| CertificateRecord::new(target.id.clone()));

        let result = AssertUnwindSafe(self.run_issuance(target, &mut record))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(CertificationError::Fault(panic_message(panic))));

        match result {
            Ok((tx_hash, certificate_id)) => {
                record.mark_confirmed(certificate_id);
                self.persist(&mut record);
                tracing::info!(
                    attempt_id = %target.id,
                    tx_hash = %tx_hash,
                    certificate_id = %certificate_id,
                    "Certificate confirmed on ledger"
                );
                metrics::record_issuance("confirmed");
                IssueOutcome::Confirmed {
                    tx_hash,
                    certificate_id,
                }
            }
            Err(e) => {
                let error = e.to_string();
                record.mark_error(error.clone());
                self.persist(&mut record);
                tracing::warn!(
                    attempt_id = %target.id,
                    tx_hash = ?record.transaction_hash,
                    error = %error,
                    "Certificate issuance failed"
                );
                metrics::record_issuance("error");
                IssueOutcome::Failed {
                    tx_hash: record.transaction_hash,
                    error,
                }
            }
        }
    }

    /// Operator retry. Rejected when the record is Confirmed or the attempt
    /// is not eligible; otherwise runs `issue`.
    pub async fn retry_issuance(
        &self,
        target: &CertificationTarget,
    ) -> Result<IssueOutcome, PreconditionError> {
        let status = match self.store.get(&target.id) {
            Ok(record) => record.map(|r| r.status),
            Err(e) => {
                tracing::error!(attempt_id = %target.id, error = %e, "Cannot read certificate record");
                metrics::record_issuance("error");
                return Ok(IssueOutcome::Failed {
                    tx_hash: None,
                    error: CertificationError::from(e).to_string(),
                })
            }
        };

        if status == Some(CertificateStatus::Confirmed) {
            return Err(PreconditionError::AlreadyConfirmed(target.id.clone()));
        }
        if let Some(reason) = target.ineligibility() {
            return Err(PreconditionError::NotEligible {
                attempt_id: target.id.clone(),
                reason,
            });
        }

        Ok(self.issue(target).await)
    }

    /// Revoke a confirmed certificate.
    ///
    /// The record only becomes Revoked once a `CertificateRevoked` log is
    /// observed; any failure leaves it Confirmed with the message recorded.
    pub async fn revoke(&self, attempt_id: &str) -> Result<RevokeOutcome, PreconditionError> {
        let existing = match self.store.get(attempt_id) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(attempt_id, error = %e, "Cannot read certificate record");
                metrics::record_revocation("error");
                return Ok(RevokeOutcome::Failed {
                    tx_hash: None,
                    error: CertificationError::from(e).to_string(),
                });
            }
        };

        let mut record = match existing {
            Some(record) if record.status == CertificateStatus::Confirmed => record,
            other => {
                metrics::record_revocation("rejected");
                return Err(PreconditionError::NotConfirmed {
                    attempt_id: attempt_id.to_string(),
                    status: other.map(|r| r.status),
                });
            }
        };

        let result = AssertUnwindSafe(self.run_revocation(&mut record))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(CertificationError::Fault(panic_message(panic))));

        match result {
            Ok(tx_hash) => {
                record.mark_revoked();
                self.persist(&mut record);
                tracing::info!(attempt_id, tx_hash = %tx_hash, "Certificate revoked on ledger");
                metrics::record_revocation("revoked");
                Ok(RevokeOutcome::Revoked { tx_hash })
            }
            Err(e) => {
                let error = e.to_string();
                record.note_failure(error.clone());
                self.persist(&mut record);
                tracing::warn!(attempt_id, error = %error, "Certificate revocation failed");
                metrics::record_revocation("error");
                Ok(RevokeOutcome::Failed {
                    tx_hash: record.revocation_tx_hash,
                    error,
                })
            }
        }
    }

    /// Read a record's certificate back from the registry.
    pub async fn verify(&self, attempt_id: &str) -> Result<CertificateView, CertificationError> {
        let record = self.store.get(attempt_id)?;
        let certificate_id = record
            .as_ref()
            .and_then(|r| r.certificate_id)
            .ok_or_else(|| PreconditionError::NotConfirmed {
                attempt_id: attempt_id.to_string(),
                status: record.as_ref().map(|r| r.status),
            })?;

        let (config, session) = self.open_session().await?;
        session
            .verify_certificate(&config, certificate_id)
            .await
            .map_err(CertificationError::Query)
    }

    /// Resolve settings and connect, without submitting anything.
    pub async fn probe(&self) -> Result<(), CertificationError> {
        self.open_session().await.map(|_| ())
    }

    async fn open_session(
        &self,
    ) -> Result<(LedgerConfig, Box<dyn LedgerSession>), CertificationError> {
        let config = self.config.resolve()?;
        let session = self
            .gateway
            .connect(&config.rpc_url)
            .await
            .map_err(CertificationError::Connection)?;
        Ok((config, session))
    }

    async fn run_issuance(
        &self,
        target: &CertificationTarget,
        record: &mut CertificateRecord,
    ) -> Result<(TxHash, U256), CertificationError> {
        let (config, session) = self.open_session().await?;

        let pending = session
            .submit_issuance(&config, &target.display_name(), &target.course_name())
            .await
            .map_err(CertificationError::Submission)?;

        // Lands before the receipt wait so the hash survives a timeout or crash.
        record.mark_submitted(pending.tx_hash);
        self.persist(record);
        tracing::info!(attempt_id = %target.id, tx_hash = %pending.tx_hash, "Issuance submitted");

        let receipt = session
            .await_receipt(pending)
            .await
            .map_err(CertificationError::Receipt)?;

        if !receipt.success {
            return Err(CertificationError::ChainRevert(pending.tx_hash));
        }

        decode_issued_event(&receipt)
            .map(|certificate_id| (pending.tx_hash, certificate_id))
            .ok_or(CertificationError::EventMissing {
                tx_hash: pending.tx_hash,
                event: "CertificateIssued",
            })
    }

    async fn run_revocation(
        &self,
        record: &mut CertificateRecord,
    ) -> Result<TxHash, CertificationError> {
        let certificate_id = record.certificate_id.ok_or_else(|| {
            CertificationError::Fault("confirmed record has no certificate id".to_string())
        })?;

        let (config, session) = self.open_session().await?;

        let pending = session
            .submit_revocation(&config, certificate_id)
            .await
            .map_err(CertificationError::Submission)?;

        record.revocation_tx_hash = Some(pending.tx_hash);
        self.persist(record);
        tracing::info!(
            attempt_id = %record.attempt_id,
            tx_hash = %pending.tx_hash,
            certificate_id = %certificate_id,
            "Revocation submitted"
        );

        let receipt = session
            .await_receipt(pending)
            .await
            .map_err(CertificationError::Receipt)?;

        if !receipt.success {
            return Err(CertificationError::ChainRevert(pending.tx_hash));
        }
        if !decode_revoked_event(&receipt) {
            return Err(CertificationError::EventMissing {
                tx_hash: pending.tx_hash,
                event: "CertificateRevoked",
            });
        }
        Ok(pending.tx_hash)
    }

    /// Write the record. A failed write is logged; the lifecycle carries on.
    fn persist(&self, record: &mut CertificateRecord) {
        record.touch();
        if let Err(e) = self.store.put(record) {
            tracing::error!(
                attempt_id = %record.attempt_id,
                status = %record.status,
                error = %e,
                "Failed to persist certificate record"
            );
        }
    }
}

fn skip_reason(target: &CertificationTarget, record: Option<&CertificateRecord>) -> Option<SkipReason> {
    target.ineligibility().or_else(|| {
        record
            .filter(|r| r.status == CertificateStatus::Confirmed)
            .map(|_| SkipReason::AlreadyConfirmed)
    })
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
