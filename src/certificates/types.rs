//! Certificate domain types.

use alloy::primitives::{TxHash, U256};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Identifier of one learner's scored attempt.
pub type AttemptId = String;

/// A completed, scored attempt that may qualify for a ledger certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationTarget {
    pub id: AttemptId,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub course_title: Option<String>,
    pub passed: bool,
    /// Whether the owning course is registered on the ledger.
    pub certification_required: bool,
}

impl CertificationTarget {
    /// Name written to the ledger: student name, else email, else "Unknown".
    pub fn display_name(&self) -> String {
        non_blank(&self.student_name)
            .or_else(|| non_blank(&self.email))
            .unwrap_or("Unknown")
            .to_string()
    }

    /// Course title written to the ledger.
    pub fn course_name(&self) -> String {
        non_blank(&self.course_title)
            .unwrap_or("Unknown Course")
            .to_string()
    }

    /// Why this attempt can never be issued, if it cannot.
    pub fn ineligibility(&self) -> Option<SkipReason> {
        if !self.passed {
            Some(SkipReason::NotPassed)
        } else if !self.certification_required {
            Some(SkipReason::CertificationNotRequired)
        } else {
            None
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.ineligibility().is_none()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Why an issuance request was not acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotPassed,
    CertificationNotRequired,
    AlreadyConfirmed,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotPassed => write!(f, "attempt did not pass"),
            SkipReason::CertificationNotRequired => {
                write!(f, "course does not require ledger certification")
            }
            SkipReason::AlreadyConfirmed => write!(f, "certificate already confirmed"),
        }
    }
}

/// Ledger status of a certificate record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    /// Not yet attempted, or broadcast and awaiting a receipt.
    #[default]
    Pending,
    /// Mined with a `CertificateIssued` event.
    Confirmed,
    /// Last attempt failed; retry is allowed.
    Error,
    /// Invalidated on the ledger.
    Revoked,
}

impl std::fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CertificateStatus::Pending => write!(f, "Pending"),
            CertificateStatus::Confirmed => write!(f, "Confirmed"),
            CertificateStatus::Error => write!(f, "Error"),
            CertificateStatus::Revoked => write!(f, "Revoked"),
        }
    }
}

/// Durable audit record of every ledger interaction for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub attempt_id: AttemptId,
    /// Hash of the last issuance broadcast.
    pub transaction_hash: Option<TxHash>,
    /// Id assigned by the registry contract.
    pub certificate_id: Option<U256>,
    pub status: CertificateStatus,
    pub error_message: Option<String>,
    /// Hash of the last revocation broadcast.
    #[serde(default)]
    pub revocation_tx_hash: Option<TxHash>,
    /// Unix seconds of the last write.
    #[serde(default)]
    pub updated_at: u64,
}

impl CertificateRecord {
    pub fn new(attempt_id: impl Into<AttemptId>) -> Self {
        Self {
            attempt_id: attempt_id.into(),
            transaction_hash: None,
            certificate_id: None,
            status: CertificateStatus::Pending,
            error_message: None,
            revocation_tx_hash: None,
            updated_at: now_secs(),
        }
    }

    /// Issuance broadcast accepted by the node.
    ///
    /// Drops any id from an earlier, revoked issuance; the id always belongs
    /// to `transaction_hash`.
    pub fn mark_submitted(&mut self, tx_hash: TxHash) {
        self.transaction_hash = Some(tx_hash);
        self.certificate_id = None;
        self.status = CertificateStatus::Pending;
        self.error_message = None;
    }

    /// `CertificateIssued` observed.
    pub fn mark_confirmed(&mut self, certificate_id: U256) {
        self.certificate_id = Some(certificate_id);
        self.status = CertificateStatus::Confirmed;
        self.error_message = None;
    }

    /// Issuance failed; hash and id are kept for follow-up.
    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.status = CertificateStatus::Error;
        self.error_message = Some(message.into());
    }

    /// `CertificateRevoked` observed. Only a confirmed record moves.
    pub fn mark_revoked(&mut self) -> bool {
        if self.status != CertificateStatus::Confirmed {
            return false;
        }
        self.status = CertificateStatus::Revoked;
        self.error_message = None;
        true
    }

    /// Record a failure without touching the status.
    pub fn note_failure(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = now_secs();
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
