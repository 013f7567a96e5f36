//! # Configuration
//!
//! Settings are layered, later layers winning:
//! 1. Built-in defaults
//! 2. TOML file (`--config`)
//! 3. Environment: `CARTOGRAPH_MAP_DIR`, `CARTOGRAPH_PROFILE`
//! 4. Command-line flags
//!
//! ```toml
//! map_dir = "data/gs"
//! profile = "gemstone"
//! save_format = "json"
//! keep_files = 10
//! ```

use cartograph_core::{MapDirectory, MapFormat, MapStore, NavError, profile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Maximum size of a configuration file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Environment variable overriding `map_dir`.
pub const ENV_MAP_DIR: &str = "CARTOGRAPH_MAP_DIR";

/// Environment variable overriding `profile`.
pub const ENV_PROFILE: &str = "CARTOGRAPH_PROFILE";

/// Resolved CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CartographConfig {
    /// Directory holding `map-<ts>.<ext>` files.
    pub map_dir: PathBuf,
    /// Game profile name (`gemstone`, `dragonrealms`).
    pub profile: String,
    /// Format written by saves and conversions without an explicit target.
    pub save_format: MapFormat,
    /// Map files kept after a save; 0 disables pruning.
    pub keep_files: usize,
}

impl Default for CartographConfig {
    fn default() -> Self {
        Self {
            map_dir: PathBuf::from("data"),
            profile: "gemstone".to_string(),
            save_format: MapFormat::Json,
            keep_files: 0,
        }
    }
}

impl CartographConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, NavError> {
        toml::from_str(text).map_err(|e| NavError::Config(e.to_string()))
    }

    /// Read a TOML file, or return the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, NavError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let metadata = std::fs::metadata(path).map_err(|e| {
            NavError::Config(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(NavError::Config(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Apply `CARTOGRAPH_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_MAP_DIR).filter(|v| !v.trim().is_empty()) {
            self.map_dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup(ENV_PROFILE).filter(|v| !v.trim().is_empty()) {
            self.profile = name;
        }
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> Result<(), NavError> {
        profile::by_name(&self.profile)?;
        if !self.save_format.is_writable() {
            return Err(NavError::Config(format!(
                "save_format {} is read-only",
                self.save_format
            )));
        }
        Ok(())
    }

    /// Build the map store these settings describe.
    pub fn build_store(&self) -> Result<MapStore, NavError> {
        self.validate()?;
        let profile = profile::by_name(&self.profile)?;
        tracing::debug!(
            map_dir = %self.map_dir.display(),
            profile = profile.name(),
            save_format = %self.save_format,
            "Opening map store"
        );
        Ok(MapStore::new(MapDirectory::new(&self.map_dir), profile)
            .with_save_format(self.save_format)
            .with_keep_files(self.keep_files))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CartographConfig::default();
        assert_eq!(config.map_dir, PathBuf::from("data"));
        assert_eq!(config.profile, "gemstone");
        assert_eq!(config.save_format, MapFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = CartographConfig::from_toml_str("profile = \"dragonrealms\"\nkeep_files = 3\n")
            .expect("parse");
        assert_eq!(config.profile, "dragonrealms");
        assert_eq!(config.keep_files, 3);
        assert_eq!(config.map_dir, PathBuf::from("data"));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(matches!(
            CartographConfig::from_toml_str("colour = \"blue\""),
            Err(NavError::Config(_))
        ));
    }

    #[test]
    fn env_overrides_file() {
        let mut config = CartographConfig::from_toml_str("map_dir = \"from-file\"").expect("parse");
        config.apply_env_from(|key| match key {
            ENV_MAP_DIR => Some("from-env".to_string()),
            ENV_PROFILE => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.map_dir, PathBuf::from("from-env"));
        assert_eq!(config.profile, "gemstone");
    }

    #[test]
    fn legacy_save_format_invalid() {
        let config = CartographConfig::from_toml_str("save_format = \"legacy\"").expect("parse");
        assert!(matches!(config.validate(), Err(NavError::Config(_))));
    }

    #[test]
    fn unknown_profile_invalid() {
        let config = CartographConfig {
            profile: "zork".to_string(),
            ..CartographConfig::default()
        };
        assert!(config.build_store().is_err());
    }

    #[test]
    fn missing_file_is_config_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let result = CartographConfig::load(Some(&tmp.path().join("nope.toml")));
        assert!(matches!(result, Err(NavError::Config(_))));
    }
}
