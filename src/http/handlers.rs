//! Domain and lookup handlers.

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;

use crate::http::request;
use crate::http::response::{success, ApiError};
use crate::http::server::AppState;
use crate::lookup::{LookupOutcome, LookupRequest};

/// Body of POST/PUT on `/api/domains`.
#[derive(Debug, Default, Deserialize)]
pub struct DomainPayload {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, rename = "campaignID")]
    pub campaign_id: Option<String>,
}

impl DomainPayload {
    fn required(&self) -> Result<(&str, &str), ApiError> {
        match (self.domain.as_deref(), self.campaign_id.as_deref()) {
            (Some(d), Some(c)) if !d.trim().is_empty() && !c.trim().is_empty() => Ok((d, c)),
            _ => Err(ApiError::bad_request(
                "Missing required fields",
                "Both domain and campaignID are required",
            )),
        }
    }
}

/// Body (POST) or query string (GET) of the lookup endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct LookupPayload {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
}

#[derive(Serialize)]
struct LookupData {
    #[serde(flatten)]
    outcome: LookupOutcome,
    /// Legacy name for `isSpy`, kept for existing landing-page scripts.
    past: bool,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK", "message": "API is running" }))
}

pub async fn create_domain(
    State(state): State<AppState>,
    payload: Result<Json<DomainPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let (domain, campaign_id) = payload.required()?;

    let record = state.lookup.resolver().upsert(domain, campaign_id)?;
    Ok(success(
        StatusCode::CREATED,
        "Domain and campaign ID stored successfully",
        record,
    ))
}

pub async fn list_domains(State(state): State<AppState>) -> Result<Response, ApiError> {
    let records = state.lookup.resolver().list()?;
    Ok(success(StatusCode::OK, format!("{} domains", records.len()), records))
}

pub async fn update_domain(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<DomainPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let (domain, campaign_id) = payload.required()?;

    let record = state.lookup.resolver().update(id, domain, campaign_id)?;
    Ok(success(
        StatusCode::OK,
        "Domain and campaign ID updated successfully",
        record,
    ))
}

pub async fn delete_domain(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    state.lookup.resolver().delete(id)?;
    Ok(success(
        StatusCode::OK,
        "Domain and campaign ID deleted successfully",
        json!({ "id": id }),
    ))
}

pub async fn lookup_post(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<LookupPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    run_lookup(&state, &headers, peer, payload).await
}

pub async fn lookup_get(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(payload): Query<LookupPayload>,
) -> Result<Response, ApiError> {
    run_lookup(&state, &headers, peer, payload).await
}

async fn run_lookup(
    state: &AppState,
    headers: &HeaderMap,
    peer: SocketAddr,
    payload: LookupPayload,
) -> Result<Response, ApiError> {
    let req = LookupRequest {
        referrer: request::referrer(payload.referrer.as_deref(), headers),
        user_agent: request::user_agent(headers),
        client_ip: request::client_ip(headers, Some(peer)),
        domain: payload.domain,
        query: payload.query,
    };
    tracing::debug!(request_id = %request::request_id(headers), domain = ?req.domain, "Lookup requested");

    let outcome = state.lookup.handle_lookup(&req).await?;
    let message = if outcome.tracking_error.is_some() {
        "Domain found; tracking call failed"
    } else {
        "Domain found and tracking triggered successfully"
    };
    let past = outcome.is_spy;
    Ok(success(StatusCode::OK, message, LookupData { outcome, past }))
}
