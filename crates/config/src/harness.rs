//! Top-level harness configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ClusterConfig, ConfigError, LaunchConfig, TimingConfig};

/// Filesystem surface of the system under test.
///
/// The key directories and the block directory are the harness's reset
/// surface: cleared and recreated before every scenario so each run starts
/// from an empty, known baseline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathsConfig {
    /// Working directory external processes are launched from.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Directory the external system writes committed block records into.
    #[serde(default = "default_blocks_dir")]
    pub blocks_dir: PathBuf,

    /// Private key material directory.
    #[serde(default = "default_priv_keys_dir")]
    pub priv_keys_dir: PathBuf,

    /// Public key material directory.
    #[serde(default = "default_pub_keys_dir")]
    pub pub_keys_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            blocks_dir: default_blocks_dir(),
            priv_keys_dir: default_priv_keys_dir(),
            pub_keys_dir: default_pub_keys_dir(),
        }
    }
}

impl PathsConfig {
    /// Resolve a configured path against the root when it is relative.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.root.join(path)
        }
    }

    /// Absolute block directory.
    pub fn blocks(&self) -> PathBuf {
        self.resolve(&self.blocks_dir)
    }

    /// The two key-material directories, absolute.
    pub fn key_dirs(&self) -> [PathBuf; 2] {
        [self.resolve(&self.priv_keys_dir), self.resolve(&self.pub_keys_dir)]
    }
}

/// Complete harness configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Filesystem surface.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Launch templates for external processes.
    #[serde(default)]
    pub launch: LaunchConfig,

    /// Timing knobs.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Cluster shape.
    #[serde(default)]
    pub cluster: ClusterConfig,
}

impl HarnessConfig {
    /// Load configuration from a file path, auto-detecting format by extension.
    ///
    /// If the path is `None`, returns the default configuration.
    /// Supported extensions: `.json` for JSON, all others default to TOML.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(
            || Ok(Self::default()),
            |p| {
                let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("toml");
                match ext {
                    "json" => Self::from_json_file(p),
                    _ => Self::from_toml_file(p),
                }
            },
        )
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read { path: path.into(), source: e })?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read { path: path.into(), source: e })?;
        Self::from_json(&contents)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Serialize configuration to a JSON string.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_blocks_dir() -> PathBuf {
    PathBuf::from("src/main/resources/blocks")
}

fn default_priv_keys_dir() -> PathBuf {
    PathBuf::from("src/main/resources/priv_keys")
}

fn default_pub_keys_dir() -> PathBuf {
    PathBuf::from("src/main/resources/pub_keys")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.cluster.participants.len(), 4);
        assert_eq!(config.paths.blocks_dir, PathBuf::from("src/main/resources/blocks"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = HarnessConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = HarnessConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = HarnessConfig::default();
        let json_str = config.to_json().unwrap();
        let parsed = HarnessConfig::from_json(&json_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_load_none_returns_default() {
        let config = HarnessConfig::load(None).unwrap();
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.toml");
        std::fs::write(&path, "[timing]\nsettle_delay_ms = 5\n").unwrap();

        let loaded = HarnessConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.timing.settle_delay_ms, 5);
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.json");
        std::fs::write(&path, r#"{"cluster": {"fault_tolerance": 2}}"#).unwrap();

        let loaded = HarnessConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.cluster.fault_tolerance, 2);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nonexistent.toml");
        assert!(HarnessConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_resolve_relative_paths() {
        let paths = PathsConfig { root: PathBuf::from("/work"), ..Default::default() };
        assert_eq!(paths.blocks(), PathBuf::from("/work/src/main/resources/blocks"));

        let absolute = PathBuf::from("/elsewhere/blocks");
        assert_eq!(paths.resolve(&absolute), absolute);
    }
}
