//! Domain record storage subsystem.
//!
//! # Data Flow
//! ```text
//! domains::DomainResolver
//!     → DomainStore trait (keyed by the normalized domain, or by id)
//!     → sqlite.rs (single connection behind a mutex)
//! ```
//!
//! # Design Decisions
//! - `domain` is unique; writes by domain are upserts (last write wins)
//! - "No such row" is a normal `Option::None` / `false`, never an error
//! - Every `StoreError` is a storage fault except `Conflict`

pub mod sqlite;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub use sqlite::SqliteStore;

/// A domain mapped to a tracking campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    pub id: i64,
    pub domain: String,
    #[serde(rename = "campaignID")]
    pub campaign_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Errors raised by a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The write would give two records the same domain.
    #[error("domain '{0}' already belongs to another record")]
    Conflict(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database connection lock poisoned")]
    Poisoned,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed record store behind the domain resolver.
pub trait DomainStore: Send + Sync {
    /// Look up by normalized domain.
    fn get(&self, domain: &str) -> StoreResult<Option<DomainRecord>>;

    fn get_by_id(&self, id: i64) -> StoreResult<Option<DomainRecord>>;

    /// Insert, or replace the campaign of an existing domain.
    fn upsert_by_domain(&self, domain: &str, campaign_id: &str) -> StoreResult<DomainRecord>;

    /// Returns `false` when no record has this id.
    fn update_by_id(&self, id: i64, domain: &str, campaign_id: &str) -> StoreResult<bool>;

    /// Returns `false` when no record has this id.
    fn delete_by_id(&self, id: i64) -> StoreResult<bool>;

    /// All records, newest first.
    fn list_all(&self) -> StoreResult<Vec<DomainRecord>>;

    fn count(&self) -> StoreResult<usize>;
}
