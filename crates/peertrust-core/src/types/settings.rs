//! Engine settings.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::TrustError;

/// Settings of a trust service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustSettings {
    /// Name shown in prompts and sent as the issuer-fetch user agent.
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Fallback for the `peertrust.always_trust` configuration flag.
    #[serde(default)]
    pub always_trust: bool,

    /// Fallback for the `peertrust.no_user_interaction` configuration flag.
    #[serde(default)]
    pub no_user_interaction: bool,

    /// Digest used for thumbprints (SHA1, SHA256, SHA384, SHA512).
    #[serde(default = "default_thumbprint_algorithm")]
    pub thumbprint_algorithm: String,

    /// AIA chain completion.
    #[serde(default)]
    pub aia: AiaSettings,
}

/// Bounds for AIA chain completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiaSettings {
    /// Maximum lookup iterations per completion.
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    /// Lifetime of a cached fetch result (seconds).
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// HTTP request timeout (seconds).
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for TrustSettings {
    fn default() -> Self {
        Self {
            application_name: default_application_name(),
            always_trust: false,
            no_user_interaction: false,
            thumbprint_algorithm: default_thumbprint_algorithm(),
            aia: AiaSettings::default(),
        }
    }
}

impl Default for AiaSettings {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            cache_ttl_secs: default_cache_ttl(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl AiaSettings {
    /// Cache TTL as a duration.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Fetch timeout as a duration.
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl TrustSettings {
    /// Load settings from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| TrustError::io(path.display().to_string(), e))?;
            toml::from_str(&content).map_err(|e| TrustError::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }
}

// Default value functions for serde.
fn default_application_name() -> String {
    String::from("peertrust")
}

fn default_thumbprint_algorithm() -> String {
    String::from("SHA1")
}

const fn default_max_hops() -> usize {
    10
}

const fn default_cache_ttl() -> u64 {
    600
}

const fn default_fetch_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = TrustSettings::default();
        assert_eq!(settings.application_name, "peertrust");
        assert_eq!(settings.thumbprint_algorithm, "SHA1");
        assert_eq!(settings.aia.max_hops, 10);
        assert_eq!(settings.aia.cache_ttl(), Duration::from_secs(600));
        assert!(!settings.always_trust);
        assert!(!settings.no_user_interaction);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: TrustSettings = toml::from_str(
            r#"
            application_name = "softphone"
            no_user_interaction = true

            [aia]
            max_hops = 4
            "#,
        )
        .unwrap();
        assert_eq!(settings.application_name, "softphone");
        assert!(settings.no_user_interaction);
        assert_eq!(settings.aia.max_hops, 4);
        assert_eq!(settings.aia.cache_ttl_secs, 600);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = TrustSettings::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, TrustSettings::default());
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "aia = 3").unwrap();
        tmp.flush().unwrap();
        assert!(matches!(
            TrustSettings::load(tmp.path()),
            Err(TrustError::Config(_))
        ));
    }
}
