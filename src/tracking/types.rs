//! Tracking request/response types and error definitions.

use thiserror::Error;

/// Inputs for one outbound tracking call. Empty strings mean "not supplied".
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackingRequest<'a> {
    pub domain: &'a str,
    pub campaign_id: &'a str,
    pub query: &'a str,
    pub user_agent: &'a str,
    pub client_ip: &'a str,
}

impl<'a> TrackingRequest<'a> {
    pub fn new(domain: &'a str, campaign_id: &'a str) -> Self {
        Self {
            domain,
            campaign_id,
            ..Default::default()
        }
    }

    pub fn query(mut self, query: &'a str) -> Self {
        self.query = query;
        self
    }

    pub fn user_agent(mut self, user_agent: &'a str) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn client_ip(mut self, client_ip: &'a str) -> Self {
        self.client_ip = client_ip;
        self
    }
}

/// Why a tracking call produced no click id.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Endpoint URL could not be built from the domain/campaign.
    #[error("invalid tracking URL: {0}")]
    InvalidUrl(String),

    /// The whole exchange exceeded the configured bound.
    #[error("tracking request timed out after {0} ms")]
    Timeout(u64),

    /// Connection, TLS or protocol failure.
    #[error("tracking request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Endpoint answered with a non-2xx status.
    #[error("tracking endpoint returned status {0}")]
    Status(u16),

    /// Body was not JSON.
    #[error("tracking response was not valid JSON: {0}")]
    Body(#[from] serde_json::Error),
}

impl ForwardError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::InvalidUrl(_) => "invalid_url",
            ForwardError::Timeout(_) => "timeout",
            ForwardError::Transport(_) => "transport",
            ForwardError::Status(_) => "status",
            ForwardError::Body(_) => "body",
        }
    }
}

/// What callers of the forwarder see.
///
/// `rtkcid` is empty when no click id was obtained; `error` says why, when
/// the reason was a failure rather than a response without the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingResult {
    pub rtkcid: String,
    pub error: Option<String>,
}

impl TrackingResult {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
