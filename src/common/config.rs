//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::Result;

/// Pinned minimal Debian image the remote command runs in
pub const DEFAULT_CONTAINER_IMAGE: &str = "docker://docker.io/library/debian@sha256:82bab30ed448b8e2509aabe21f40f0607d905b7fd0dec72802627a20274eba55";

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory template overrides
    #[serde(default)]
    pub paths: PathsConfig,

    /// Remote execution platform settings
    #[serde(default)]
    pub platform: PlatformConfig,
}

/// Directory templates used when the matching CLI flag is absent
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    pub reclient_cfgs_dir: Option<String>,
    pub reclient_dir: Option<String>,
}

/// Platform descriptor for the remote command
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Container image reference, normally pinned by digest
    #[serde(default = "default_container_image")]
    pub container_image: String,

    /// OS family reported to the remote backend
    #[serde(default = "default_os_family")]
    pub os_family: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            container_image: default_container_image(),
            os_family: default_os_family(),
        }
    }
}

impl PlatformConfig {
    /// Render the value of rewrapper's `--platform` flag
    pub fn descriptor(&self) -> String {
        format!(
            "container-image={},OSFamily={}",
            self.container_image, self.os_family
        )
    }
}

fn default_container_image() -> String {
    DEFAULT_CONTAINER_IMAGE.to_string()
}

fn default_os_family() -> String {
    "linux".to_string()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_or_default(config_path())
    }

    /// Load `path` when it exists, otherwise fall back to defaults
    pub fn load_or_default(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}
