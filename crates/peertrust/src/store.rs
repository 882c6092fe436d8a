//! Explicit trust decisions, persistent and per-session.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use peertrust_core::{Result, Thumbprint, VerificationScope, TRUST_KEY_PREFIX};

use crate::config::ConfigStore;

/// Allow-list of certificate thumbprints per verification scope.
///
/// The persistent tier is a comma-separated value per scope key in the
/// configuration store, newest first. The session tier lives in memory and
/// dies with this value.
///
/// Updates of the persistent tier are read-modify-write on one key and are
/// serialized by `persist`.
#[derive(Debug)]
pub struct TrustStore {
    config: Arc<dyn ConfigStore>,
    persist: Mutex<()>,
    session: Mutex<HashMap<String, Vec<Thumbprint>>>,
}

impl TrustStore {
    pub fn new(config: Arc<dyn ConfigStore>) -> Self {
        Self {
            config,
            persist: Mutex::new(()),
            session: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the thumbprint was trusted for `scope` in either tier.
    pub fn is_trusted(&self, scope: &VerificationScope, thumbprint: &Thumbprint) -> bool {
        let key = scope.config_key();
        if self.persistent(&key).contains(thumbprint) {
            return true;
        }
        self.session
            .lock()
            .get(&key)
            .is_some_and(|list| list.contains(thumbprint))
    }

    /// Trust across restarts. Already stored thumbprints are left in place.
    pub fn trust_always(&self, scope: &VerificationScope, thumbprint: &Thumbprint) -> Result<()> {
        let key = scope.config_key();
        let _guard = self.persist.lock();
        let mut list = self.persistent(&key);
        if list.contains(thumbprint) {
            debug!(scope = %scope, thumbprint = %thumbprint, "already trusted");
            return Ok(());
        }
        list.insert(0, thumbprint.clone());
        self.config.set_string(&key, &join(&list))?;
        debug!(scope = %scope, thumbprint = %thumbprint, "trusted permanently");
        Ok(())
    }

    /// Trust until this store is dropped.
    pub fn trust_session(&self, scope: &VerificationScope, thumbprint: &Thumbprint) {
        self.session
            .lock()
            .entry(scope.config_key())
            .or_default()
            .push(thumbprint.clone());
        debug!(scope = %scope, thumbprint = %thumbprint, "trusted for this session");
    }

    /// Persistent entries first, then session entries.
    pub fn trusted_thumbprints(&self, scope: &VerificationScope) -> Vec<Thumbprint> {
        let key = scope.config_key();
        let mut list = self.persistent(&key);
        if let Some(session) = self.session.lock().get(&key) {
            list.extend(session.iter().cloned());
        }
        list
    }

    /// Remove a thumbprint from both tiers; `true` if it was present.
    pub fn forget(&self, scope: &VerificationScope, thumbprint: &Thumbprint) -> Result<bool> {
        let key = scope.config_key();
        let mut removed = {
            let _guard = self.persist.lock();
            let mut list = self.persistent(&key);
            let before = list.len();
            list.retain(|tp| tp != thumbprint);
            let changed = list.len() != before;

            if changed {
                if list.is_empty() {
                    self.config.remove(&key)?;
                } else {
                    self.config.set_string(&key, &join(&list))?;
                }
            }
            changed
        };

        if let Some(session) = self.session.lock().get_mut(&key) {
            let before = session.len();
            session.retain(|tp| tp != thumbprint);
            removed |= session.len() != before;
        }
        Ok(removed)
    }

    /// Configuration keys holding persistent trust records.
    pub fn persistent_scopes(&self) -> Vec<String> {
        self.config
            .keys_with_prefix(&format!("{TRUST_KEY_PREFIX}."))
    }

    /// Persistent entries stored under a raw configuration key.
    pub fn persistent(&self, key: &str) -> Vec<Thumbprint> {
        let Some(value) = self.config.get_string(key) else {
            return Vec::new();
        };
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| match s.parse() {
                Ok(tp) => Some(tp),
                Err(e) => {
                    warn!(key, error = %e, "ignoring malformed stored thumbprint");
                    None
                }
            })
            .collect()
    }
}

fn join(list: &[Thumbprint]) -> String {
    list.iter()
        .map(Thumbprint::as_str)
        .collect::<Vec<_>>()
        .join(",")
}
