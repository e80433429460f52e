use std::path::{Path, PathBuf};

use blobstage_types::Algorithm;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Configuration for a [`FileStore`](crate::FileStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base directory every relative path resolves under.
    pub root: PathBuf,
    /// Refuse to open a writer when the target file already exists.
    pub disable_overwrite: bool,
    /// Skip the check that keeps write targets inside `root`.
    pub allow_path_traversal_on_write: bool,
    /// Digest algorithm used when hashing added files and written content.
    pub algorithm: Algorithm,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            disable_overwrite: false,
            allow_path_traversal_on_write: false,
            algorithm: Algorithm::CANONICAL,
        }
    }
}

impl StoreConfig {
    /// Default configuration rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn with_disable_overwrite(mut self, disable: bool) -> Self {
        self.disable_overwrite = disable;
        self
    }

    pub fn with_allow_path_traversal_on_write(mut self, allow: bool) -> Self {
        self.allow_path_traversal_on_write = allow;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StoreError::io(format!("read config {}", path.display()), e))?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> StoreResult<String> {
        toml::to_string_pretty(self).map_err(|e| StoreError::Config(e.to_string()))
    }
}
