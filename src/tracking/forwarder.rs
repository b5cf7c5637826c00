//! Click tracking forwarder with timeout and error absorption.
//!
//! # Responsibilities
//! - Derive the tracking endpoint from domain + campaign
//! - Issue one bounded GET with forwarded client metadata
//! - Extract the click id from the JSON body
//! - Turn every failure into an empty click id at the public boundary

use reqwest::header::{ACCEPT, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::config::TrackingConfig;
use crate::observability::metrics;
use crate::tracking::types::{ForwardError, TrackingRequest, TrackingResult};

const ACCEPT_JSON: &str = "application/json, text/json, */*";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Outbound client for the click tracking service.
#[derive(Clone)]
pub struct TrackingForwarder {
    client: reqwest::Client,
    config: TrackingConfig,
    timeout_duration: Duration,
}

impl TrackingForwarder {
    pub fn new(config: TrackingConfig) -> Result<Self, ForwardError> {
        let timeout_duration = Duration::from_millis(config.timeout_ms);
        let mut builder = reqwest::Client::builder().connect_timeout(timeout_duration);
        if config.bypass_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            config,
            timeout_duration,
        })
    }

    /// Endpoint for a domain/campaign pair, with `query` and the format
    /// directive appended. A leading `?` on `query` is tolerated.
    pub fn endpoint_url(&self, domain: &str, campaign_id: &str, query: &str) -> Result<Url, ForwardError> {
        let host = match &self.config.host_override {
            Some(host) => host.clone(),
            None => format!("{}.{}", self.config.subdomain, domain),
        };

        let mut url = Url::parse(&format!("{}://{}/", self.config.scheme, host))
            .map_err(|e| ForwardError::InvalidUrl(format!("{}: {}", host, e)))?;
        url.path_segments_mut()
            .map_err(|_| ForwardError::InvalidUrl(format!("{} cannot carry a path", host)))?
            .pop_if_empty()
            .push(campaign_id);

        let format = format!("format={}", self.config.format);
        let query = query.trim().trim_start_matches('?');
        if query.is_empty() {
            url.set_query(Some(&format));
        } else {
            url.set_query(Some(&format!("{}&{}", query, format)));
        }

        Ok(url)
    }

    /// Perform the call. `Ok(None)` means the endpoint answered but carried
    /// no click id.
    pub async fn try_forward(&self, req: TrackingRequest<'_>) -> Result<Option<String>, ForwardError> {
        let url = self.endpoint_url(req.domain, req.campaign_id, req.query)?;

        let user_agent = if req.user_agent.trim().is_empty() {
            self.config.default_user_agent.as_str()
        } else {
            req.user_agent
        };

        let mut builder = self
            .client
            .get(url.clone())
            .header(USER_AGENT, user_agent)
            .header(ACCEPT, ACCEPT_JSON);
        let client_ip = req.client_ip.trim();
        if !client_ip.is_empty() {
            builder = builder.header(X_FORWARDED_FOR, client_ip);
        }

        tracing::info!(url = %url, user_agent = %user_agent, client_ip = %client_ip, "Calling tracking endpoint");

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ForwardError::Status(status.as_u16()));
            }
            let body = response.bytes().await?;
            Ok::<_, ForwardError>(serde_json::from_slice::<Value>(&body)?)
        };

        let body = match timeout(self.timeout_duration, exchange).await {
            Ok(result) => result?,
            Err(_) => return Err(ForwardError::Timeout(self.config.timeout_ms)),
        };

        let click_id = extract_click_id(&body, &self.config.click_id_field);
        match &click_id {
            Some(id) => tracing::info!(rtkcid = %id, "Tracking click id received"),
            None => tracing::warn!(field = %self.config.click_id_field, "No click id in tracking response"),
        }
        Ok(click_id)
    }

    /// Best-effort call: never fails, yields an empty click id instead.
    pub async fn forward(&self, req: TrackingRequest<'_>) -> TrackingResult {
        match self.try_forward(req).await {
            Ok(Some(rtkcid)) => {
                metrics::record_tracking_forward("ok");
                TrackingResult { rtkcid, error: None }
            }
            Ok(None) => {
                metrics::record_tracking_forward("missing_click_id");
                TrackingResult::default()
            }
            Err(e) => {
                tracing::warn!(domain = %req.domain, error = %e, "Tracking call failed, continuing without click id");
                metrics::record_tracking_forward(e.kind());
                TrackingResult {
                    rtkcid: String::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Click id under `field`, if present as a string or number.
pub fn extract_click_id(body: &Value, field: &str) -> Option<String> {
    match body.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
