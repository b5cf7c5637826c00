//! Lookup orchestration.
//!
//! # Data Flow
//! ```text
//! LookupRequest { domain, referrer, query, user_agent, client_ip }
//!     → referrer::ReferrerClassifier (no I/O)       ─┐
//!     → domains::normalize → DomainResolver::resolve ─┤
//!     → tracking::TrackingForwarder (resolved only)   │
//!     → LookupOutcome { domain, rtkcid, is_spy } ◀────┘
//! ```
//!
//! # Design Decisions
//! - `is_spy` always comes from this request's own referrer
//! - Unknown domain and storage faults are surfaced; tracking failures are not

pub mod service;

pub use service::{LookupError, LookupOutcome, LookupRequest, LookupService};
