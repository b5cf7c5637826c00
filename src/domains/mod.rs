//! Domain resolution subsystem.
//!
//! # Data Flow
//! ```text
//! raw domain ("Example.com/track ")
//!     → normalize.rs ("example.com")
//!     → resolver.rs → store::DomainStore::get
//!     → DomainRecord | UnknownDomain
//! ```

pub mod normalize;
pub mod resolver;

pub use normalize::normalize;
pub use resolver::{DomainError, DomainResolver, DomainResult};
