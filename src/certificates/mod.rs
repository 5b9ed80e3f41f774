//! Certificate issuance and revocation.
//!
//! # Data Flow
//! ```text
//! domain event / operator action
//!     → trigger.rs (hook, per-attempt lock, batch fan-out)
//!     → manager.rs (state machine: Pending → Confirmed | Error, Confirmed → Revoked)
//!     → store.rs (durable record per attempt)
//! ```
//!
//! # Design Decisions
//! - The ledger assigns certificate ids; none are created locally
//! - The transaction hash is persisted before waiting on the receipt
//! - Records are never deleted; failed attempts stay as audit trail

pub mod error;
pub mod manager;
pub mod store;
pub mod trigger;
pub mod types;

pub use error::{CertificationError, PreconditionError, StoreError};
pub use manager::{CertificateManager, IssueOutcome, RevokeOutcome};
pub use store::{AttemptDirectory, FileStore, RecordStore};
pub use trigger::{AttemptCompletion, BatchItem, CertificationEvents, TriggerSurface};
pub use types::{AttemptId, CertificateRecord, CertificateStatus, CertificationTarget, SkipReason};
