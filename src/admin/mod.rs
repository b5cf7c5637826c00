//! Operator endpoints for the spy blocklist and service status.

pub mod handlers;

use axum::{
    routing::{delete, get, post},
    Router,
};
use crate::http::server::AppState;
use self::handlers::*;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/spy-domains", get(list_spy_domains).post(add_spy_domain))
        .route("/admin/spy-domains/{*entry}", delete(remove_spy_domain))
        .route("/admin/classify", post(classify_referrer))
        .with_state(state)
}
