//! Domain resolution and record maintenance.

use std::sync::Arc;
use thiserror::Error;

use crate::domains::normalize::normalize;
use crate::store::{DomainRecord, DomainStore, StoreError};

/// Errors surfaced by the resolver.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Required input missing or blank.
    #[error("{0}")]
    Invalid(&'static str),

    /// No campaign is mapped to this domain.
    #[error("No campaign ID found for domain: {0}")]
    UnknownDomain(String),

    /// No record has this id.
    #[error("No domain found with ID: {0}")]
    UnknownId(i64),

    #[error("Domain {0} is already mapped by another record")]
    Conflict(String),

    #[error(transparent)]
    Storage(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(domain) => DomainError::Conflict(domain),
            other => DomainError::Storage(other),
        }
    }
}

/// Result type for resolver operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Maps normalized domains to campaign records.
#[derive(Clone)]
pub struct DomainResolver {
    store: Arc<dyn DomainStore>,
}

impl DomainResolver {
    pub fn new(store: Arc<dyn DomainStore>) -> Self {
        Self { store }
    }

    /// Look up an already-normalized domain.
    pub fn resolve(&self, normalized_domain: &str) -> DomainResult<DomainRecord> {
        self.store
            .get(normalized_domain)?
            .ok_or_else(|| DomainError::UnknownDomain(normalized_domain.to_string()))
    }

    /// Store a mapping, replacing the campaign of an existing domain.
    pub fn upsert(&self, domain: &str, campaign_id: &str) -> DomainResult<DomainRecord> {
        let (domain, campaign_id) = validated(domain, campaign_id)?;
        let record = self.store.upsert_by_domain(&domain, campaign_id)?;
        tracing::info!(id = record.id, domain = %record.domain, campaign_id = %record.campaign_id, "Stored domain mapping");
        Ok(record)
    }

    pub fn update(&self, id: i64, domain: &str, campaign_id: &str) -> DomainResult<DomainRecord> {
        let (domain, campaign_id) = validated(domain, campaign_id)?;
        if !self.store.update_by_id(id, &domain, campaign_id)? {
            return Err(DomainError::UnknownId(id));
        }
        tracing::info!(id, domain = %domain, "Updated domain mapping");
        self.store.get_by_id(id)?.ok_or(DomainError::UnknownId(id))
    }

    pub fn delete(&self, id: i64) -> DomainResult<()> {
        if !self.store.delete_by_id(id)? {
            return Err(DomainError::UnknownId(id));
        }
        tracing::info!(id, "Deleted domain mapping");
        Ok(())
    }

    /// All records, newest first.
    pub fn list(&self) -> DomainResult<Vec<DomainRecord>> {
        Ok(self.store.list_all()?)
    }

    pub fn count(&self) -> DomainResult<usize> {
        Ok(self.store.count()?)
    }
}

fn validated<'a>(domain: &str, campaign_id: &'a str) -> DomainResult<(String, &'a str)> {
    let campaign_id = campaign_id.trim();
    if domain.trim().is_empty() || campaign_id.is_empty() {
        return Err(DomainError::Invalid("Both domain and campaignID are required"));
    }
    let domain = normalize(domain);
    if domain.is_empty() {
        return Err(DomainError::Invalid("domain must contain a host before any '/'"));
    }
    Ok((domain, campaign_id))
}
