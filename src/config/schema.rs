//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the campaign relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Domain record storage.
    pub storage: StorageConfig,

    /// Outbound click tracking.
    pub tracking: TrackingConfig,

    /// Spy referrer blocklist.
    pub spy: SpyConfig,

    /// Cross-origin settings for the browser-facing lookup endpoint.
    pub cors: CorsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

impl ListenerConfig {
    /// Replace the port of `bind_address`, keeping the host part.
    pub fn override_port(&mut self, port: u16) {
        let host = match self.bind_address.rsplit_once(':') {
            Some((host, _)) => host.to_string(),
            None => self.bind_address.clone(),
        };
        self.bind_address = format!("{}:{}", host, port);
    }
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "domains.db".to_string(),
        }
    }
}

/// Tracking endpoint configuration.
///
/// The endpoint for a domain is `<scheme>://<subdomain>.<domain>/<campaign>`
/// unless `host_override` pins every request to a single tracking host.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// URL scheme of the tracking endpoint.
    pub scheme: String,

    /// Subdomain prepended to the resolved domain.
    pub subdomain: String,

    /// Fixed tracking host (e.g. "trk.example.net" or "127.0.0.1:9000").
    pub host_override: Option<String>,

    /// Value of the `format` query parameter.
    pub format: String,

    /// Response field carrying the click identifier.
    pub click_id_field: String,

    /// Upper bound for the whole outbound call, in milliseconds.
    pub timeout_ms: u64,

    /// User-Agent sent when the caller supplied none.
    pub default_user_agent: String,

    /// Connect directly, ignoring `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    pub bypass_proxy: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            subdomain: "trk".to_string(),
            host_override: None,
            format: "json".to_string(),
            click_id_field: "clickid".to_string(),
            timeout_ms: 5000,
            default_user_agent: "Mozilla/5.0 (compatible; API-Client/1.0)".to_string(),
            bypass_proxy: false,
        }
    }
}

/// Spy referrer blocklist configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpyConfig {
    /// Initial entries: bare hosts or host+path prefixes.
    pub domains: Vec<String>,

    /// JSON file the list is loaded from and saved to after each change.
    pub persist_path: Option<String>,
}

impl Default for SpyConfig {
    fn default() -> Self {
        Self {
            domains: DEFAULT_SPY_DOMAINS.iter().map(|d| d.to_string()).collect(),
            persist_path: None,
        }
    }
}

/// Ad-intelligence and ad-library tools known to scrape landing pages.
pub const DEFAULT_SPY_DOMAINS: &[&str] = &[
    "adspy.com",
    "bigspy.com",
    "minea.com",
    "adspyder.io",
    "adflex.io",
    "poweradspy.com",
    "dropispy.com",
    "socialpeta.com",
    "adstransparency.google.com",
    "facebook.com/ads/library",
    "adbeat.com",
    "anstrex.com",
    "semrush.com",
    "autods.com",
    "foreplay.co",
    "spyfu.com",
    "adplexity.com",
    "spypush.com",
    "nativeadbuzz.com",
    "spyover.com",
    "videoadvault.com",
    "admobispy.com",
    "ispionage.com",
    "similarweb.com",
    "pipiads.com",
    "adespresso.com",
];

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the API from a browser.
    pub allowed_origins: Vec<String>,

    /// Whether cookies/credentials may accompany cross-origin requests.
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://127.0.0.1:5502".to_string(),
                "http://localhost:5502".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:3000".to_string(),
            ],
            allow_credentials: true,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}
