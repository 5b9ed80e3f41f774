//! Host completion hook.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::certificates::{CertificationTarget, IssueOutcome};
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub attempt_id: String,
    pub completed: bool,
    /// Absent when the attempt does not qualify for certification.
    pub certification: Option<IssueOutcome>,
}

/// `POST /attempts/complete`: the host reports a finished, scored attempt.
///
/// The response status reflects the completion only; a failed ledger
/// registration is reported in `certification` with a 200.
pub async fn complete_attempt(
    State(state): State<AppState>,
    Json(target): Json<CertificationTarget>,
) -> (StatusCode, Json<CompletionResponse>) {
    let attempt_id = target.id.clone();
    let outcome = state
        .triggers
        .complete_attempt(target, |t| {
            tracing::info!(attempt_id = %t.id, passed = t.passed, "Attempt completed");
            Ok::<(), std::convert::Infallible>(())
        })
        .await;

    (
        StatusCode::OK,
        Json(CompletionResponse {
            attempt_id,
            completed: outcome.completion.is_ok(),
            certification: outcome.certification,
        }),
    )
}
