//! Campaign relay: maps marketing domains to tracking campaigns, forwards
//! lookups to the click tracker and flags ad-spy referrers.

pub mod config;
pub mod http;
pub mod domains;
pub mod store;
pub mod referrer;
pub mod tracking;
pub mod lookup;
pub mod lifecycle;
pub mod observability;
pub mod admin;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
