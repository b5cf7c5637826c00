use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use crate::http::response::{success, ApiError};
use crate::http::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub spy_entries: usize,
    pub domains: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct SpyDomainPayload {
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClassifyPayload {
    #[serde(default)]
    pub referrer: Option<String>,
}

pub async fn get_status(State(state): State<AppState>) -> Result<Response, ApiError> {
    let status = SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        spy_entries: state.blocklist().len(),
        domains: state.lookup.resolver().count()?,
    };
    Ok(success(StatusCode::OK, "Service status", status))
}

pub async fn list_spy_domains(State(state): State<AppState>) -> Response {
    let entries = state.blocklist().list_entries();
    success(StatusCode::OK, format!("{} spy domains", entries.len()), entries)
}

pub async fn add_spy_domain(
    State(state): State<AppState>,
    payload: Result<Json<SpyDomainPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let domain = payload.domain.unwrap_or_default();

    let added = state.blocklist().add_entry(&domain)?;
    let entries = state.blocklist().list_entries();
    Ok(if added {
        success(StatusCode::CREATED, "Spy domain added", entries)
    } else {
        success(StatusCode::OK, "Spy domain already listed", entries)
    })
}

pub async fn remove_spy_domain(
    State(state): State<AppState>,
    Path(entry): Path<String>,
) -> Result<Response, ApiError> {
    let entry = entry.trim_start_matches('/');
    if !state.blocklist().remove_entry(entry)? {
        return Err(ApiError::not_found(
            "Spy domain not found",
            format!("{} is not in the spy domain list", entry),
        ));
    }
    Ok(success(
        StatusCode::OK,
        "Spy domain removed",
        state.blocklist().list_entries(),
    ))
}

pub async fn classify_referrer(
    State(state): State<AppState>,
    payload: Result<Json<ClassifyPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let analysis = state.lookup.classifier().classify(payload.referrer.as_deref());
    Ok(success(StatusCode::OK, "Referrer classified", analysis))
}
