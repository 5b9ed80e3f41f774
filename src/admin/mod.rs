pub mod auth;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use self::handlers::*;
use crate::http::server::AppState;

/// Operator routes. Authentication is layered on by the server.
pub fn setup_admin_router() -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/certificates", get(list_certificates))
        .route("/admin/certificates/retry", post(retry_certificates))
        .route("/admin/certificates/revoke", post(revoke_certificates))
        .route("/admin/certificates/{id}", get(get_certificate))
        .route("/admin/certificates/{id}/verify", get(verify_certificate))
}
