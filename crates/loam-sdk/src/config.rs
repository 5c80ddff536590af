use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SdkError, SdkResult};

/// File name of the optional engine configuration inside the metadata directory.
pub const ENGINE_CONFIG_FILE: &str = "loam.toml";

/// Settings every component is wired with.
///
/// Missing keys in a TOML file fall back to [`EngineConfig::default`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Branch created by `init`.
    pub default_branch: String,
    /// Author recorded on commits when none is given.
    pub author: String,
    /// Name of the metadata directory at the repository root.
    pub metadata_dir: String,
    /// Name of the ignore file at the repository root.
    pub ignore_file: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_branch: "main".into(),
            author: "loam".into(),
            metadata_dir: ".loam".into(),
            ignore_file: ".loamignore".into(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load from `path`.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|e| SdkError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load from `path`, or the defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> SdkResult<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text).map_err(|e| SdkError::Config {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Identity of one repository, stored as `<meta>/config.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    pub version: String,
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl RepoConfig {
    /// A fresh identity for a repository created now.
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            id: Uuid::now_v7(),
            created_at: Utc::now(),
        }
    }
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self::new()
    }
}
