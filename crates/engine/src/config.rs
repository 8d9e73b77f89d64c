//! Store configuration via `arbor.toml`
//!
//! On first open, a default `arbor.toml` is written to the data directory.
//! To change settings, edit the file and reopen the directory.

use arbor_core::{Error, Limits, Result};
use arbor_storage::{files, RelationConsistency};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name placed in the data directory.
pub const CONFIG_FILE_NAME: &str = "arbor.toml";

/// Backend tag used when the config does not name one.
pub const DEFAULT_BACKEND: &str = "file";

/// Store configuration loaded from `arbor.toml`.
///
/// # Example
///
/// ```toml
/// backend = "file"
/// relation_consistency = "eventual"
///
/// [limits]
/// max_path_length = 1024
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend tag for newly initialized models.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Coordination of the two-file relation updates.
    #[serde(default)]
    pub relation_consistency: RelationConsistency,
    /// Size limits handed to every backend.
    #[serde(default)]
    pub limits: Limits,
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            relation_consistency: RelationConsistency::default(),
            limits: Limits::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# ArborDB store configuration
#
# Backend for newly initialized models: "file" (default) or "memory".
# Existing models keep the backend recorded in their model.json.
backend = "file"

# Relation index consistency: "eventual" (default) or "locked"
#   "eventual" = outbound and inbound files are written independently
#   "locked"   = both endpoints are locked for the whole update (in-process only)
relation_consistency = "eventual"

[limits]
max_path_length = 1024
max_relation_name_length = 255
max_serialized_record_length = 16777216
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// `ServiceUnavailable` if the file cannot be read, `RequestInvalid` if
    /// it does not parse.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("failed to read config file {}", path.display()), e))?;
        let config: StoreConfig = toml::from_str(&content).map_err(|e| {
            Error::invalid(format!(
                "failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no backend could honor.
    pub fn validate(&self) -> Result<()> {
        if self.backend.trim().is_empty() {
            return Err(Error::invalid("backend tag must not be empty"));
        }
        let limits = &self.limits;
        if limits.max_path_length == 0
            || limits.max_relation_name_length == 0
            || limits.max_serialized_record_length == 0
        {
            return Err(Error::invalid("limits must be greater than zero"));
        }
        Ok(())
    }

    /// Write the default config file if it does not already exist.
    ///
    /// The file is written atomically, so a crash never leaves a truncated config.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            files::write_atomic(path, Self::default_toml().as_bytes())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it atomically to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::unavailable(format!("failed to serialize config: {}", e)))?;
        files::write_atomic(path, content.as_bytes())
    }
}
