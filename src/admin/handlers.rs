use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::blockchain::{abi::ABI_VERSION, CertificateView};
use crate::certificates::{
    BatchItem, CertificateRecord, CertificationError, IssueOutcome, RevokeOutcome,
};
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub abi_version: &'static str,
    pub ledger_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_error: Option<String>,
    /// Record counts keyed by status.
    pub records: BTreeMap<String, usize>,
}

#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub ids: Vec<String>,
}

/// JSON error body with a status code derived from the failure kind.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(attempt_id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("No certificate record for attempt {attempt_id}"),
        }
    }
}

impl From<CertificationError> for ApiError {
    fn from(e: CertificationError) -> Self {
        let status = match &e {
            CertificationError::Precondition(_) => StatusCode::CONFLICT,
            CertificationError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            CertificationError::Connection(_) | CertificationError::Query(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

pub async fn get_status(State(state): State<AppState>) -> Result<Json<SystemStatus>, ApiError> {
    let manager = state.triggers.manager();
    let probe = manager.probe().await;

    let mut records = BTreeMap::new();
    for record in manager.records()? {
        *records
            .entry(record.status.to_string().to_lowercase())
            .or_insert(0) += 1;
    }

    Ok(Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        abi_version: ABI_VERSION,
        ledger_reachable: probe.is_ok(),
        ledger_error: probe.err().map(|e| e.to_string()),
        records,
    }))
}

pub async fn list_certificates(
    State(state): State<AppState>,
) -> Result<Json<Vec<CertificateRecord>>, ApiError> {
    Ok(Json(state.triggers.manager().records()?))
}

pub async fn get_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CertificateRecord>, ApiError> {
    state
        .triggers
        .manager()
        .record(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(&id))
}

pub async fn verify_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CertificateView>, ApiError> {
    Ok(Json(state.triggers.manager().verify(&id).await?))
}

pub async fn retry_certificates(
    State(state): State<AppState>,
    Json(selection): Json<SelectionRequest>,
) -> Json<Vec<BatchItem<IssueOutcome>>> {
    tracing::info!(count = selection.ids.len(), "Operator retry requested");
    Json(state.triggers.retry(&selection.ids).await)
}

pub async fn revoke_certificates(
    State(state): State<AppState>,
    Json(selection): Json<SelectionRequest>,
) -> Json<Vec<BatchItem<RevokeOutcome>>> {
    tracing::info!(count = selection.ids.len(), "Operator revoke requested");
    Json(state.triggers.revoke(&selection.ids).await)
}
