//! Spy domain blocklist with snapshot reads and optional persistence.

use arc_swap::ArcSwap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use url::Url;

use crate::config::SpyConfig;
use crate::observability::metrics;

/// Errors raised by blocklist mutations.
#[derive(Debug, Error)]
pub enum BlocklistError {
    /// Entry was empty after trimming.
    #[error("spy domain entry must not be blank")]
    Blank,

    /// Reading or writing the persistence file failed.
    #[error("failed to persist spy domains to {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Persistence file exists but is not a JSON array of strings.
    #[error("invalid spy domain file {path}: {source}")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("blocklist writer lock poisoned")]
    Poisoned,
}

/// How an entry is compared against a referrer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EntryRule {
    /// Bare host: exact or subdomain match on the referrer host.
    Host,
    /// Host plus path prefix, e.g. `facebook.com/ads/library`.
    HostPath { host: String, path: String },
    /// Entry with a path that does not parse as a URL; matched as raw text.
    Substring,
}

/// A single normalized blocklist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpyEntry {
    raw: String,
    rule: EntryRule,
}

impl SpyEntry {
    /// Normalize and parse an entry. Returns `None` for blank input.
    pub fn parse(input: &str) -> Option<Self> {
        let raw = input.trim().to_lowercase();
        if raw.is_empty() {
            return None;
        }

        let rule = if raw.contains('/') {
            let candidate = if raw.starts_with("http") {
                raw.clone()
            } else {
                format!("https://{}", raw)
            };
            match Url::parse(&candidate) {
                Ok(url) => match url.host_str() {
                    Some(host) => EntryRule::HostPath {
                        host: host.to_string(),
                        path: url.path().to_string(),
                    },
                    None => EntryRule::Substring,
                },
                Err(_) => EntryRule::Substring,
            }
        } else {
            EntryRule::Host
        };

        Some(Self { raw, rule })
    }

    /// The normalized entry text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this entry carries a path component.
    pub fn has_path(&self) -> bool {
        !matches!(self.rule, EntryRule::Host)
    }

    /// Test a parsed referrer against this entry.
    ///
    /// `host` must already be lowercase; `raw_referrer` is the referrer as
    /// received and is only consulted by substring entries.
    pub fn matches(&self, host: &str, referrer: &Url, raw_referrer: &str) -> bool {
        match &self.rule {
            EntryRule::Host => {
                host == self.raw
                    || host
                        .strip_suffix(self.raw.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
            EntryRule::HostPath { host: entry_host, path } => {
                host == entry_host && referrer.path().starts_with(path.as_str())
            }
            EntryRule::Substring => raw_referrer.contains(self.raw.as_str()),
        }
    }
}

/// Process-wide set of spy referrer patterns.
///
/// Readers take a lock-free snapshot; writers serialize on a mutex and
/// publish a fresh list, so a reader never observes a half-applied change.
pub struct SpyBlocklist {
    entries: ArcSwap<Vec<SpyEntry>>,
    write_lock: Mutex<()>,
    persist_path: Option<PathBuf>,
}

impl SpyBlocklist {
    /// Create an in-memory blocklist. Blank and duplicate entries are dropped.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list: Vec<SpyEntry> = Vec::new();
        for entry in entries.into_iter().filter_map(|e| SpyEntry::parse(e.as_ref())) {
            if !list.iter().any(|e| e.raw == entry.raw) {
                list.push(entry);
            }
        }
        metrics::record_spy_entries(list.len());

        Self {
            entries: ArcSwap::from_pointee(list),
            write_lock: Mutex::new(()),
            persist_path: None,
        }
    }

    /// Build from configuration, preferring the persisted list when present.
    pub fn from_config(config: &SpyConfig) -> Result<Self, BlocklistError> {
        match &config.persist_path {
            Some(path) if Path::new(path).exists() => Self::load_from_file(path),
            Some(path) => {
                let mut list = Self::new(&config.domains);
                list.persist_path = Some(PathBuf::from(path));
                Ok(list)
            }
            None => Ok(Self::new(&config.domains)),
        }
    }

    /// Load a list previously written by [`SpyBlocklist::save_to_file`].
    pub fn load_from_file(path: &str) -> Result<Self, BlocklistError> {
        let file = File::open(path).map_err(|source| BlocklistError::Persist {
            path: path.to_string(),
            source,
        })?;
        let stored: Vec<String> = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| BlocklistError::Format {
                path: path.to_string(),
                source,
            })?;

        let mut list = Self::new(&stored);
        list.persist_path = Some(PathBuf::from(path));
        tracing::info!(count = list.len(), path = %path, "Loaded spy domains from file");
        Ok(list)
    }

    /// Current entries. The returned value is detached from later mutations.
    pub fn snapshot(&self) -> Arc<Vec<SpyEntry>> {
        self.entries.load_full()
    }

    /// Copy of the normalized entry strings, in insertion order.
    pub fn list_entries(&self) -> Vec<String> {
        self.entries.load().iter().map(|e| e.raw.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add an entry. Returns `false` if it was already present.
    pub fn add_entry(&self, domain: &str) -> Result<bool, BlocklistError> {
        let entry = SpyEntry::parse(domain).ok_or(BlocklistError::Blank)?;
        let _guard = self.write_lock.lock().map_err(|_| BlocklistError::Poisoned)?;

        let current = self.entries.load_full();
        if current.iter().any(|e| e.raw == entry.raw) {
            return Ok(false);
        }

        let mut next = current.as_ref().clone();
        tracing::info!(domain = %entry.raw, "Added spy domain");
        next.push(entry);
        self.publish(next)?;
        Ok(true)
    }

    /// Remove an entry. Returns `false` if it was not present.
    pub fn remove_entry(&self, domain: &str) -> Result<bool, BlocklistError> {
        let needle = domain.trim().to_lowercase();
        let _guard = self.write_lock.lock().map_err(|_| BlocklistError::Poisoned)?;

        let current = self.entries.load_full();
        let Some(index) = current.iter().position(|e| e.raw == needle) else {
            return Ok(false);
        };

        let mut next = current.as_ref().clone();
        next.remove(index);
        self.publish(next)?;
        tracing::info!(domain = %needle, "Removed spy domain");
        Ok(true)
    }

    /// Write the current list to the persistence file, if one is configured.
    pub fn save_to_file(&self) -> Result<(), BlocklistError> {
        let current = self.entries.load_full();
        self.write_file(&current)
    }

    // Caller must hold `write_lock`.
    fn publish(&self, next: Vec<SpyEntry>) -> Result<(), BlocklistError> {
        self.write_file(&next)?;
        metrics::record_spy_entries(next.len());
        self.entries.store(Arc::new(next));
        Ok(())
    }

    fn write_file(&self, entries: &[SpyEntry]) -> Result<(), BlocklistError> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        let persist_err = |source| BlocklistError::Persist {
            path: path.display().to_string(),
            source,
        };

        let file = File::create(path).map_err(persist_err)?;
        let mut writer = BufWriter::new(file);
        let raw: Vec<&str> = entries.iter().map(|e| e.as_str()).collect();
        serde_json::to_writer_pretty(&mut writer, &raw).map_err(|e| persist_err(e.into()))?;
        writer.flush().map_err(persist_err)?;
        tracing::debug!(count = raw.len(), path = %path.display(), "Saved spy domains to file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DEFAULT_SPY_DOMAINS;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_entry_parsing() {
        let host = SpyEntry::parse("  AdSpy.com ").unwrap();
        assert_eq!(host.as_str(), "adspy.com");
        assert!(!host.has_path());

        let path = SpyEntry::parse("facebook.com/ads/library").unwrap();
        assert!(path.has_path());
        assert_eq!(
            path.rule,
            EntryRule::HostPath {
                host: "facebook.com".into(),
                path: "/ads/library".into()
            }
        );

        assert!(SpyEntry::parse("   ").is_none());
    }

    #[test]
    fn test_unparsable_path_entry_falls_back_to_substring() {
        let entry = SpyEntry::parse("bad host/ads").unwrap();
        assert_eq!(entry.rule, EntryRule::Substring);

        let referrer = "https://mirror.example/?u=bad host/ads";
        assert!(entry.matches("mirror.example", &url("https://mirror.example/"), referrer));
        assert!(!entry.matches("mirror.example", &url("https://mirror.example/"), "https://mirror.example/"));
    }

    #[test]
    fn test_host_rule_requires_label_boundary() {
        let entry = SpyEntry::parse("adspy.com").unwrap();
        let r = url("https://x.example/");
        assert!(entry.matches("adspy.com", &r, ""));
        assert!(entry.matches("app.adspy.com", &r, ""));
        assert!(!entry.matches("notadspy.com", &r, ""));
    }

    #[test]
    fn test_add_is_idempotent_and_normalized() {
        let list = SpyBlocklist::new(["adspy.com"]);
        assert!(!list.add_entry("ADSPY.com").unwrap());
        assert!(list.add_entry("NewSpy.io").unwrap());
        assert_eq!(list.list_entries(), vec!["adspy.com", "newspy.io"]);
        assert!(matches!(list.add_entry(""), Err(BlocklistError::Blank)));
    }

    #[test]
    fn test_remove() {
        let list = SpyBlocklist::new(["adspy.com", "bigspy.com"]);
        assert!(list.remove_entry("BigSpy.com").unwrap());
        assert!(!list.remove_entry("bigspy.com").unwrap());
        assert_eq!(list.list_entries(), vec!["adspy.com"]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let list = SpyBlocklist::new(["adspy.com"]);
        let before = list.snapshot();
        let mut listed = list.list_entries();
        listed.push("tampered.com".into());

        list.add_entry("bigspy.com").unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(list.len(), 2);
        assert!(!list.list_entries().contains(&"tampered.com".to_string()));
    }

    #[test]
    fn test_new_dedups() {
        let list = SpyBlocklist::new(["a.com", "A.com", "", "b.com"]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spy.json");
        let config = SpyConfig {
            domains: DEFAULT_SPY_DOMAINS.iter().map(|d| d.to_string()).collect(),
            persist_path: Some(path.display().to_string()),
        };

        let list = SpyBlocklist::from_config(&config).unwrap();
        list.add_entry("newspy.io").unwrap();
        list.remove_entry("adspy.com").unwrap();

        let loaded = SpyBlocklist::from_config(&config).unwrap();
        let entries = loaded.list_entries();
        assert!(entries.contains(&"newspy.io".to_string()));
        assert!(!entries.contains(&"adspy.com".to_string()));
        assert_eq!(entries.len(), DEFAULT_SPY_DOMAINS.len());
    }

    #[test]
    fn test_concurrent_readers_see_whole_lists() {
        let list = Arc::new(SpyBlocklist::new(Vec::<String>::new()));
        let writer = {
            let list = list.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    list.add_entry(&format!("spy{}.com", i)).unwrap();
                }
            })
        };

        let mut last = 0;
        for _ in 0..200 {
            let snap = list.snapshot();
            assert!(snap.len() >= last);
            for (i, e) in snap.iter().enumerate() {
                assert_eq!(e.as_str(), format!("spy{}.com", i));
            }
            last = snap.len();
        }
        writer.join().unwrap();
        assert_eq!(list.len(), 200);
    }
}
