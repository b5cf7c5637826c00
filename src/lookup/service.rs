//! Per-request lookup service.

use serde::Serialize;
use std::time::Instant;
use thiserror::Error;

use crate::domains::{normalize, DomainError, DomainResolver};
use crate::observability::metrics;
use crate::referrer::ReferrerClassifier;
use crate::tracking::{TrackingForwarder, TrackingRequest};

/// One incoming lookup with its ambient request metadata.
#[derive(Debug, Clone, Default)]
pub struct LookupRequest {
    pub domain: Option<String>,
    pub referrer: Option<String>,
    pub query: Option<String>,
    pub user_agent: Option<String>,
    pub client_ip: Option<String>,
}

/// Combined result of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupOutcome {
    pub domain: String,
    pub rtkcid: String,
    pub is_spy: bool,
    /// Set when the tracking call failed; the lookup itself still succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_error: Option<String>,
}

/// Lookup failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("No campaign ID found for domain: {0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Storage(#[source] DomainError),
}

impl LookupError {
    fn outcome_label(&self) -> &'static str {
        match self {
            LookupError::Validation(_) => "invalid",
            LookupError::NotFound(_) => "not_found",
            LookupError::Storage(_) => "storage_error",
        }
    }
}

/// Composes classification, resolution and forwarding.
#[derive(Clone)]
pub struct LookupService {
    resolver: DomainResolver,
    classifier: ReferrerClassifier,
    forwarder: TrackingForwarder,
}

impl LookupService {
    pub fn new(resolver: DomainResolver, classifier: ReferrerClassifier, forwarder: TrackingForwarder) -> Self {
        Self {
            resolver,
            classifier,
            forwarder,
        }
    }

    pub fn resolver(&self) -> &DomainResolver {
        &self.resolver
    }

    pub fn classifier(&self) -> &ReferrerClassifier {
        &self.classifier
    }

    /// Resolve a domain, forward to tracking and classify the referrer.
    pub async fn handle_lookup(&self, req: &LookupRequest) -> Result<LookupOutcome, LookupError> {
        let start = Instant::now();
        let result = self.lookup(req).await;
        let label = match &result {
            Ok(outcome) if outcome.tracking_error.is_some() => "found_untracked",
            Ok(_) => "found",
            Err(e) => e.outcome_label(),
        };
        metrics::record_lookup(label, start);
        result
    }

    async fn lookup(&self, req: &LookupRequest) -> Result<LookupOutcome, LookupError> {
        let analysis = self.classifier.classify(req.referrer.as_deref());
        tracing::debug!(
            referrer = analysis.referrer.as_deref().unwrap_or("none"),
            referrer_domain = analysis.referrer_domain.as_deref().unwrap_or("none"),
            is_spy = analysis.is_spy,
            "Referrer classified"
        );

        let raw = req
            .domain
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .ok_or(LookupError::Validation("domain is required in request body"))?;
        let domain = normalize(raw);
        if domain.is_empty() {
            return Err(LookupError::Validation("domain must contain a host before any '/'"));
        }
        metrics::record_spy_verdict(analysis.is_spy);
        tracing::debug!(raw = %raw, normalized = %domain, "Searching for domain");

        let record = self.resolver.resolve(&domain).map_err(|e| match e {
            DomainError::UnknownDomain(d) => LookupError::NotFound(d),
            other => {
                tracing::error!(domain = %domain, error = %other, "Domain lookup failed");
                LookupError::Storage(other)
            }
        })?;

        let tracking = self
            .forwarder
            .forward(
                TrackingRequest::new(&record.domain, &record.campaign_id)
                    .query(req.query.as_deref().unwrap_or_default())
                    .user_agent(req.user_agent.as_deref().unwrap_or_default())
                    .client_ip(req.client_ip.as_deref().unwrap_or_default()),
            )
            .await;

        Ok(LookupOutcome {
            domain: record.domain,
            rtkcid: tracking.rtkcid,
            is_spy: analysis.is_spy,
            tracking_error: tracking.error,
        })
    }
}
