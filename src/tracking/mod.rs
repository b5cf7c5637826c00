//! Click tracking subsystem.
//!
//! # Data Flow
//! ```text
//! resolved DomainRecord + request metadata
//!     → forwarder.rs builds https://<subdomain>.<domain>/<campaign>?<query>&format=json
//!     → GET with User-Agent / Accept / X-Forwarded-For, bounded by timeout
//!     → JSON body → click id field
//!     → TrackingResult { rtkcid, error }
//! ```
//!
//! # Design Decisions
//! - At most one attempt per lookup, no retries
//! - `try_forward` keeps failure causes apart; `forward` flattens them to ""
//! - A response without the click id field is not a failure

pub mod forwarder;
pub mod types;

pub use forwarder::TrackingForwarder;
pub use types::{ForwardError, TrackingRequest, TrackingResult};
