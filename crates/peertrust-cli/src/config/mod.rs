//! Configuration file locations and loading.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::Arc;

use peertrust::{FileConfigStore, TrustSettings};

/// Trust store file name inside the config directory.
const TRUST_FILE: &str = "trust.toml";

/// Settings file name, next to the trust store.
const SETTINGS_FILE: &str = "settings.toml";

/// Files used by the CLI.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Flags and stored trust decisions
    pub trust: PathBuf,
    /// Engine settings
    pub settings: PathBuf,
}

impl ConfigPaths {
    /// Paths for an explicit trust file, or the platform defaults.
    pub fn resolve(trust: Option<PathBuf>) -> Result<Self> {
        let trust = match trust {
            Some(path) => path,
            None => default_dir()?.join(TRUST_FILE),
        };
        let settings = trust.with_file_name(SETTINGS_FILE);
        Ok(Self { trust, settings })
    }

    /// Load engine settings, defaults when the file is absent.
    pub fn load_settings(&self) -> Result<TrustSettings> {
        TrustSettings::load(&self.settings)
            .with_context(|| format!("loading {}", self.settings.display()))
    }

    /// Open the trust store.
    pub fn open_store(&self) -> Result<Arc<FileConfigStore>> {
        let store = FileConfigStore::open(&self.trust)
            .with_context(|| format!("opening {}", self.trust.display()))?;
        Ok(Arc::new(store))
    }
}

fn default_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("org", "peertrust", "peertrust")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(dirs.config_dir().to_path_buf())
}
