//! Key/value configuration backing the persistent trust tier and the flags.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use peertrust_core::{Result, TrustError};

/// String-valued configuration store.
pub trait ConfigStore: Send + Sync + fmt::Debug {
    fn get_string(&self, key: &str) -> Option<String>;

    fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key; removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Keys starting with `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;

    /// Boolean view of a key, `default` when absent.
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_string(key)
            .map_or(default, |v| v.trim().eq_ignore_ascii_case("true"))
    }
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    values: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.write().remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        prefixed(&self.values.read(), prefix)
    }
}

/// Store persisted as a flat TOML table.
///
/// The file is read once at open and rewritten on every change. Dotted
/// keys written by hand as nested tables are flattened on load.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileConfigStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let path_str = path.display().to_string();
            let content =
                std::fs::read_to_string(&path).map_err(|e| TrustError::io(&path_str, e))?;
            let table: toml::Table = toml::from_str(&content)
                .map_err(|e| TrustError::Config(format!("{path_str}: {e}")))?;
            let mut values = BTreeMap::new();
            flatten("", &table, &mut values);
            values
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), entries = values.len(), "opened configuration");
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every key and value, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.values
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let path_str = self.path.display().to_string();
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TrustError::io(&path_str, e))?;
        }
        let content =
            toml::to_string_pretty(values).map_err(|e| TrustError::Config(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| TrustError::io(&path_str, e))
    }
}

impl ConfigStore for FileConfigStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set_string(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write();
        let previous = values.insert(key.to_string(), value.to_string());
        if let Err(e) = self.save(&values) {
            restore(&mut values, key, previous);
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write();
        let Some(previous) = values.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.save(&values) {
            restore(&mut values, key, Some(previous));
            return Err(e);
        }
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        prefixed(&self.values.read(), prefix)
    }
}

/// Undo an in-memory change whose write to disk failed.
fn restore(values: &mut BTreeMap<String, String>, key: &str, previous: Option<String>) {
    match previous {
        Some(value) => values.insert(key.to_string(), value),
        None => values.remove(key),
    };
}

fn prefixed(values: &BTreeMap<String, String>, prefix: &str) -> Vec<String> {
    values
        .keys()
        .filter(|k| k.starts_with(prefix))
        .cloned()
        .collect()
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut BTreeMap<String, String>) {
    for (key, value) in table {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(inner) => flatten(&full, inner, out),
            toml::Value::String(s) => {
                out.insert(full, s.clone());
            }
            other => {
                out.insert(full, other.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clones_share_state() {
        let a = MemoryConfigStore::new();
        let b = a.clone();
        a.set_string("x.y", "1").unwrap();
        assert_eq!(b.get_string("x.y").as_deref(), Some("1"));
        b.remove("x.y").unwrap();
        assert_eq!(a.get_string("x.y"), None);
    }

    #[test]
    fn bool_flags() {
        let store = MemoryConfigStore::new();
        assert!(!store.get_bool("flag", false));
        assert!(store.get_bool("flag", true));
        store.set_string("flag", "TRUE").unwrap();
        assert!(store.get_bool("flag", false));
        store.set_string("flag", "no").unwrap();
        assert!(!store.get_bool("flag", true));
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("trust.toml");

        let store = FileConfigStore::open(&path).unwrap();
        store
            .set_string("peertrust.certservice.global", "aa,bb")
            .unwrap();
        store.set_string("peertrust.always_trust", "false").unwrap();
        store.set_string("other", "1").unwrap();
        store.remove("other").unwrap();
        assert!(path.exists());

        let reopened = FileConfigStore::open(&path).unwrap();
        assert_eq!(
            reopened.get_string("peertrust.certservice.global").as_deref(),
            Some("aa,bb")
        );
        assert_eq!(reopened.get_string("other"), None);
        assert_eq!(
            reopened.keys_with_prefix("peertrust.certservice"),
            vec!["peertrust.certservice.global".to_string()]
        );
    }

    #[test]
    fn hand_written_tables_are_flattened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trust.toml");
        std::fs::write(
            &path,
            "[peertrust]\nalways_trust = true\n\n[peertrust.certservice]\nglobal = \"ab\"\n",
        )
        .unwrap();

        let store = FileConfigStore::open(&path).unwrap();
        assert!(store.get_bool("peertrust.always_trust", false));
        assert_eq!(
            store.get_string("peertrust.certservice.global").as_deref(),
            Some("ab")
        );
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trust.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        assert!(matches!(
            FileConfigStore::open(&path),
            Err(TrustError::Config(_))
        ));
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trust.toml");
        let store = FileConfigStore::open(&path).unwrap();
        store.set_string("peertrust.always_trust", "false").unwrap();

        // A directory where the file should be makes every save fail.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.set_string("peertrust.always_trust", "true").is_err());
        assert!(store.set_string("peertrust.certservice.global", "aa").is_err());
        assert!(store.remove("peertrust.always_trust").is_err());

        assert_eq!(
            store.get_string("peertrust.always_trust").as_deref(),
            Some("false")
        );
        assert_eq!(store.get_string("peertrust.certservice.global"), None);
        assert_eq!(store.entries().len(), 1);
    }
}
