//! Referrer classification.
//!
//! # Responsibilities
//! - Extract a normalized host from a referrer string
//! - Decide whether the referrer is spy traffic against the blocklist
//!
//! # Design Decisions
//! - Missing referrer (or the literal `direct`) counts as spy traffic
//! - Unparsable referrer is not evidence of anything: `is_spy = false`
//! - Host rule and path rule are independent and OR-ed together

use serde::Serialize;
use std::sync::Arc;
use url::Url;

use crate::referrer::blocklist::{SpyBlocklist, SpyEntry};

/// Token some clients send in place of a real referrer.
pub const DIRECT_REFERRER: &str = "direct";

/// Outcome of classifying one referrer. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerAnalysis {
    pub referrer: Option<String>,
    pub referrer_domain: Option<String>,
    pub is_spy: bool,
}

/// Lower-cased host of a referrer URL, if it parses and has one.
pub fn extract_referrer_domain(referrer: &str) -> Option<String> {
    Url::parse(referrer)
        .ok()?
        .host_str()
        .map(|h| h.to_lowercase())
}

/// Classify `referrer` against an entry list.
pub fn classify_with(entries: &[SpyEntry], referrer: Option<&str>) -> ReferrerAnalysis {
    let referrer = match referrer {
        None | Some("") | Some(DIRECT_REFERRER) => {
            return ReferrerAnalysis {
                referrer: referrer.filter(|r| !r.is_empty()).map(str::to_string),
                referrer_domain: None,
                is_spy: true,
            };
        }
        Some(r) => r,
    };

    let parsed = match Url::parse(referrer) {
        Ok(url) => url,
        Err(_) => {
            return ReferrerAnalysis {
                referrer: Some(referrer.to_string()),
                referrer_domain: None,
                is_spy: false,
            };
        }
    };

    let referrer_domain = parsed.host_str().map(|h| h.to_lowercase());
    let is_spy = match &referrer_domain {
        Some(host) => entries.iter().any(|e| e.matches(host, &parsed, referrer)),
        None => false,
    };

    ReferrerAnalysis {
        referrer: Some(referrer.to_string()),
        referrer_domain,
        is_spy,
    }
}

/// Referrer classifier bound to a shared blocklist.
#[derive(Clone)]
pub struct ReferrerClassifier {
    blocklist: Arc<SpyBlocklist>,
}

impl ReferrerClassifier {
    pub fn new(blocklist: Arc<SpyBlocklist>) -> Self {
        Self { blocklist }
    }

    /// Classify against the blocklist as it stands right now.
    pub fn classify(&self, referrer: Option<&str>) -> ReferrerAnalysis {
        let entries = self.blocklist.snapshot();
        classify_with(&entries, referrer)
    }

    pub fn blocklist(&self) -> &Arc<SpyBlocklist> {
        &self.blocklist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DEFAULT_SPY_DOMAINS;

    fn classifier() -> ReferrerClassifier {
        ReferrerClassifier::new(Arc::new(SpyBlocklist::new(DEFAULT_SPY_DOMAINS)))
    }

    #[test]
    fn test_missing_referrer_is_spy() {
        let c = classifier();

        let absent = c.classify(None);
        assert!(absent.is_spy);
        assert_eq!(absent.referrer, None);
        assert_eq!(absent.referrer_domain, None);

        let empty = c.classify(Some(""));
        assert!(empty.is_spy);
        assert_eq!(empty.referrer, None);

        let direct = c.classify(Some("direct"));
        assert!(direct.is_spy);
        assert_eq!(direct.referrer.as_deref(), Some("direct"));
        assert_eq!(direct.referrer_domain, None);
    }

    #[test]
    fn test_unparsable_referrer_is_not_spy() {
        let a = classifier().classify(Some("adspy.com"));
        assert!(!a.is_spy);
        assert_eq!(a.referrer_domain, None);
        assert_eq!(a.referrer.as_deref(), Some("adspy.com"));
    }

    #[test]
    fn test_host_and_subdomain_match() {
        let c = classifier();
        assert!(c.classify(Some("https://adspy.com/")).is_spy);

        let sub = c.classify(Some("https://Sub.AdSpy.com/x"));
        assert!(sub.is_spy);
        assert_eq!(sub.referrer_domain.as_deref(), Some("sub.adspy.com"));

        assert!(!c.classify(Some("https://notaspy.com")).is_spy);
        assert!(!c.classify(Some("https://google.com/search?q=adspy.com")).is_spy);
    }

    #[test]
    fn test_path_prefix_match() {
        let c = classifier();
        assert!(c.classify(Some("https://facebook.com/ads/library/123")).is_spy);
        assert!(c.classify(Some("https://facebook.com/ads/library")).is_spy);
        assert!(!c.classify(Some("https://facebook.com/other")).is_spy);
        // Path entries compare hosts exactly.
        assert!(!c.classify(Some("https://www.facebook.com/ads/library")).is_spy);
    }

    #[test]
    fn test_hostless_url() {
        let a = classifier().classify(Some("mailto:someone@adspy.com"));
        assert!(!a.is_spy);
        assert_eq!(a.referrer_domain, None);
    }

    #[test]
    fn test_sees_runtime_additions() {
        let c = classifier();
        assert!(!c.classify(Some("https://newspy.io/board")).is_spy);
        c.blocklist().add_entry("newspy.io").unwrap();
        assert!(c.classify(Some("https://newspy.io/board")).is_spy);
        c.blocklist().remove_entry("newspy.io").unwrap();
        assert!(!c.classify(Some("https://newspy.io/board")).is_spy);
    }

    #[test]
    fn test_analysis_serializes_camel_case() {
        let json = serde_json::to_value(classifier().classify(Some("https://adspy.com"))).unwrap();
        assert_eq!(json["isSpy"], true);
        assert_eq!(json["referrerDomain"], "adspy.com");
    }
}
