//! Referrer analysis subsystem.
//!
//! # Data Flow
//! ```text
//! Referer header / body field
//!     → classifier.rs (parse URL, lower-case host)
//!     → blocklist.rs snapshot (host rule OR path rule)
//!     → ReferrerAnalysis { referrer, referrer_domain, is_spy }
//!
//! Admin API:
//!     add / remove → blocklist.rs (serialized writers, atomic publish)
//!     list         → copy of current snapshot
//! ```

pub mod blocklist;
pub mod classifier;

pub use blocklist::{BlocklistError, SpyBlocklist, SpyEntry};
pub use classifier::{ReferrerAnalysis, ReferrerClassifier};
