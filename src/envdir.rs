//! Environment directory reading
//!
//! The platform hands configuration to the build as a directory with one
//! file per variable: the file name is the key, the file contents the
//! value. Read once at startup; all decisions take the resulting value
//! explicitly instead of touching process state.

use crate::error::{NodepackError, NodepackResult};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Toggle disabling cache restore and save when set to false
pub const CACHE_TOGGLE: &str = "NODE_MODULES_CACHE";

/// Toggle producing a dependency listing after a successful install
pub const VERBOSE_TOGGLE: &str = "NODE_VERBOSE";

/// Optional override for the platform stack identifier
pub const STACK_VAR: &str = "STACK";

/// Parsed environment directory
#[derive(Debug, Clone, Default)]
pub struct EnvDir {
    vars: HashMap<String, String>,
}

impl EnvDir {
    /// Read every regular file in `path` into a key/value map
    pub async fn read(path: &Path) -> NodepackResult<Self> {
        if !path.exists() {
            return Err(NodepackError::PathNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(NodepackError::PathNotDirectory(path.to_path_buf()));
        }

        let mut vars = HashMap::new();
        let mut entries = fs::read_dir(path).await.map_err(|e| NodepackError::EnvDirRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| NodepackError::EnvDirRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })? {
            let entry_path = entry.path();
            if !entry_path.is_file() {
                debug!("Skipping non-file env entry: {}", entry_path.display());
                continue;
            }
            let Some(key) = entry.file_name().to_str().map(str::to_string) else {
                debug!("Skipping non-UTF8 env entry: {}", entry_path.display());
                continue;
            };
            let value = fs::read_to_string(&entry_path)
                .await
                .map_err(|e| NodepackError::EnvDirRead {
                    path: entry_path.clone(),
                    reason: e.to_string(),
                })?;
            vars.insert(key, value.trim_end().to_string());
        }

        debug!("Read {} environment variables", vars.len());
        Ok(Self { vars })
    }

    /// Construct from an in-memory map (tests)
    pub fn from_map(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    /// Raw value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Interpret a variable as a boolean flag
    ///
    /// "false", "0" and "no" (any case) disable; "true", "1" and "yes"
    /// enable; anything else falls back to the default.
    pub fn bool_flag(&self, key: &str, default: bool) -> bool {
        match self.get(key).map(|v| v.to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "false" | "0" | "no") => false,
            Some(v) if matches!(v.as_str(), "true" | "1" | "yes") => true,
            _ => default,
        }
    }

    /// Whether cache restore/save is enabled (default: enabled)
    pub fn cache_enabled(&self) -> bool {
        self.bool_flag(CACHE_TOGGLE, true)
    }

    /// Whether to produce a dependency listing on success (default: off)
    pub fn verbose_listing(&self) -> bool {
        self.bool_flag(VERBOSE_TOGGLE, false)
    }

    /// Platform stack identifier, defaulting to os-arch of this binary
    pub fn stack(&self) -> String {
        self.get(STACK_VAR)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH))
    }
}
