//! Short-lived memory of issuer downloads, successes and failures alike.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rustls_pki_types::CertificateDer;
use std::collections::HashMap;
use std::time::Duration;

/// Outcome of an earlier fetch of one URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cached {
    /// The URI served this certificate
    Certificate(CertificateDer<'static>),
    /// The fetch or the decoding failed
    Failed,
}

#[derive(Debug, Clone)]
struct AiaCacheEntry {
    expires_at: DateTime<Utc>,
    outcome: Cached,
}

/// Fetch-URI keyed cache with a fixed time-to-live.
///
/// Entries are never evicted; an expired entry reads as a miss and is
/// overwritten by the next store.
#[derive(Debug)]
pub struct AiaCache {
    ttl: chrono::Duration,
    entries: Mutex<HashMap<String, AiaCacheEntry>>,
}

impl AiaCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::weeks(52));
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Live entry for `uri`, if any.
    pub fn lookup(&self, uri: &str, now: DateTime<Utc>) -> Option<Cached> {
        let entries = self.entries.lock();
        entries
            .get(uri)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.outcome.clone())
    }

    /// Record the outcome of a fetch made at `now`.
    pub fn store(&self, uri: &str, outcome: Cached, now: DateTime<Utc>) {
        let entry = AiaCacheEntry {
            expires_at: now + self.ttl,
            outcome,
        };
        self.entries.lock().insert(uri.to_string(), entry);
    }

    /// Number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
