//! Entry points that invoke the certificate lifecycle.
//!
//! # Responsibilities
//! - Host event hook (`CertificationEvents::on_certification_passed`)
//! - Compose domain completion and ledger registration as two outcomes
//! - Operator retry / revoke fan-outs over selected attempts
//! - Keep at most one in-flight lifecycle run per attempt

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::future::join_all;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinError;

use crate::certificates::error::PreconditionError;
use crate::certificates::manager::{CertificateManager, IssueOutcome, RevokeOutcome};
use crate::certificates::store::AttemptDirectory;
use crate::certificates::types::CertificationTarget;

/// Subscription interface the host calls when an attempt passes.
#[async_trait]
pub trait CertificationEvents: Send + Sync {
    async fn on_certification_passed(&self, target: &CertificationTarget) -> IssueOutcome;
}

#[async_trait]
impl CertificationEvents for CertificateManager {
    async fn on_certification_passed(&self, target: &CertificationTarget) -> IssueOutcome {
        self.issue(target).await
    }
}

/// Both outcomes of completing an attempt. The certification outcome never
/// alters the completion result.
#[derive(Debug)]
pub struct AttemptCompletion<T, E> {
    pub completion: Result<T, E>,
    /// `None` when completion failed or the attempt is not eligible.
    pub certification: Option<IssueOutcome>,
}

/// Per-attempt result of an operator batch action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem<T> {
    pub attempt_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> BatchItem<T> {
    fn from_result(attempt_id: String, result: Result<T, PreconditionError>) -> Self {
        match result {
            Ok(value) => Self {
                attempt_id,
                result: Some(value),
                error: None,
            },
            Err(e) => Self {
                attempt_id,
                result: None,
                error: Some(e.to_string()),
            },
        }
    }
}

type InFlight = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Automatic and operator triggers over a shared manager.
///
/// Every lifecycle run is spawned onto the runtime and awaited. A caller
/// that goes away (request timeout, client disconnect) stops waiting, but
/// the run still reaches Confirmed, Error or Revoked.
pub struct TriggerSurface {
    manager: Arc<CertificateManager>,
    attempts: Arc<dyn AttemptDirectory>,
    in_flight: InFlight,
}

impl TriggerSurface {
    pub fn new(manager: Arc<CertificateManager>, attempts: Arc<dyn AttemptDirectory>) -> Self {
        Self {
            manager,
            attempts,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    pub fn manager(&self) -> &CertificateManager {
        &self.manager
    }

    /// Complete an attempt, then register it on the ledger if it qualifies.
    ///
    /// `completion` is the host's own completion step. Issuance fires once,
    /// only after it succeeds, and its outcome is reported separately.
    pub async fn complete_attempt<T, E, F>(
        &self,
        target: CertificationTarget,
        completion: F,
    ) -> AttemptCompletion<T, E>
    where
        F: FnOnce(&CertificationTarget) -> Result<T, E> + Send,
    {
        let completion = completion(&target);
        if completion.is_err() {
            return AttemptCompletion {
                completion,
                certification: None,
            };
        }

        if let Err(e) = self.attempts.record_attempt(&target) {
            tracing::error!(attempt_id = %target.id, error = %e, "Failed to record completed attempt");
        }

        let certification = if target.is_eligible() {
            let attempt_id = target.id.clone();
            let outcome = self
                .detached(&attempt_id, move |manager| async move {
                    let events: &dyn CertificationEvents = manager.as_ref();
                    events.on_certification_passed(&target).await
                })
                .await
                .unwrap_or_else(|e| issue_task_failed(&attempt_id, e));
            Some(outcome)
        } else {
            None
        };

        AttemptCompletion {
            completion,
            certification,
        }
    }

    /// Operator retry for one attempt.
    pub async fn retry_one(&self, attempt_id: &str) -> Result<IssueOutcome, PreconditionError> {
        let target = self.lookup(attempt_id)?;
        self.detached(attempt_id, move |manager| async move {
            manager.retry_issuance(&target).await
        })
        .await
        .unwrap_or_else(|e| Ok(issue_task_failed(attempt_id, e)))
    }

    /// Operator revoke for one attempt.
    pub async fn revoke_one(&self, attempt_id: &str) -> Result<RevokeOutcome, PreconditionError> {
        let id = attempt_id.to_string();
        self.detached(attempt_id, move |manager| async move { manager.revoke(&id).await })
            .await
            .unwrap_or_else(|e| {
                tracing::error!(attempt_id, error = %e, "Revocation task failed");
                Ok(RevokeOutcome::Failed {
                    tx_hash: None,
                    error: e.to_string(),
                })
            })
    }

    /// Retry many attempts; each runs independently.
    pub async fn retry(&self, attempt_ids: &[String]) -> Vec<BatchItem<IssueOutcome>> {
        join_all(attempt_ids.iter().map(|id| async move {
            BatchItem::from_result(id.clone(), self.retry_one(id).await)
        }))
        .await
    }

    /// Revoke many attempts; each runs independently.
    pub async fn revoke(&self, attempt_ids: &[String]) -> Vec<BatchItem<RevokeOutcome>> {
        join_all(attempt_ids.iter().map(|id| async move {
            BatchItem::from_result(id.clone(), self.revoke_one(id).await)
        }))
        .await
    }

    fn lookup(&self, attempt_id: &str) -> Result<CertificationTarget, PreconditionError> {
        match self.attempts.attempt(attempt_id) {
            Ok(Some(target)) => Ok(target),
            Ok(None) => Err(PreconditionError::UnknownAttempt(attempt_id.to_string())),
            Err(e) => {
                tracing::error!(attempt_id, error = %e, "Failed to read attempt directory");
                Err(PreconditionError::UnknownAttempt(attempt_id.to_string()))
            }
        }
    }

    /// Spawn `op` under the attempt's lock and wait for it.
    async fn detached<R, F, Fut>(&self, attempt_id: &str, op: F) -> Result<R, JoinError>
    where
        F: FnOnce(Arc<CertificateManager>) -> Fut + Send + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        let manager = self.manager.clone();
        let in_flight = self.in_flight.clone();
        let attempt_id = attempt_id.to_string();
        tokio::spawn(async move { with_record_lock(&in_flight, &attempt_id, op(manager)).await })
            .await
    }
}

/// Run `fut` while holding the attempt's lock.
async fn with_record_lock<R>(
    in_flight: &DashMap<String, Arc<Mutex<()>>>,
    attempt_id: &str,
    fut: impl Future<Output = R>,
) -> R {
    let lock = in_flight
        .entry(attempt_id.to_string())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone();

    let result = {
        let _guard = lock.lock().await;
        fut.await
    };

    drop(lock);
    in_flight.remove_if(attempt_id, |_, l| Arc::strong_count(l) == 1);
    result
}

fn issue_task_failed(attempt_id: &str, e: JoinError) -> IssueOutcome {
    tracing::error!(attempt_id, error = %e, "Issuance task failed");
    IssueOutcome::Failed {
        tx_hash: None,
        error: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_item_serialization() {
        let ok: BatchItem<u32> = BatchItem::from_result("a-1".to_string(), Ok(5));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({ "attempt_id": "a-1", "result": 5 })
        );

        let err: BatchItem<u32> = BatchItem::from_result(
            "a-2".to_string(),
            Err(PreconditionError::AlreadyConfirmed("a-2".to_string())),
        );
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["attempt_id"], "a-2");
        assert!(value["error"].as_str().unwrap().contains("already registered"));
        assert!(value.get("result").is_none());
    }
}
