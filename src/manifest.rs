//! Project manifest parsing
//!
//! Reads the fields of `package.json` that drive installation decisions:
//! engine version ranges, the optional cache directory list, and declared
//! lifecycle scripts. Parsed once; read-only afterwards.

use crate::error::{NodepackError, NodepackResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

/// Manifest file name
pub const MANIFEST_FILE: &str = "package.json";

/// Script run before dependency installation, if declared
pub const PREBUILD_SCRIPT: &str = "nodepack-prebuild";

/// Script run after dependency installation, if declared
pub const POSTBUILD_SCRIPT: &str = "nodepack-postbuild";

/// Parsed view of package.json
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyManifest {
    /// Project name
    #[serde(default)]
    pub name: Option<String>,

    /// Declared engine version ranges
    #[serde(default)]
    pub engines: Engines,

    /// Explicit cache directory list, overriding the default pair
    #[serde(default)]
    pub cache_directories: Option<Vec<String>>,

    /// Lifecycle scripts by name
    #[serde(default)]
    pub scripts: HashMap<String, String>,
}

/// Engine version ranges from the manifest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Engines {
    /// Node.js range (e.g. "22.x", ">=20 <23")
    #[serde(default)]
    pub node: Option<String>,

    /// npm range, applied after the runtime is installed
    #[serde(default)]
    pub npm: Option<String>,
}

impl DependencyManifest {
    /// Load and parse `package.json` from a project directory
    pub async fn from_dir(project_dir: &Path) -> NodepackResult<Self> {
        let path = project_dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Err(NodepackError::ManifestMissing(project_dir.to_path_buf()));
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| NodepackError::io(format!("reading {}", path.display()), e))?;

        Self::parse(&content).map_err(|reason| NodepackError::ManifestInvalid { path, reason })
    }

    /// Parse manifest content from a JSON string
    pub fn parse(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| e.to_string())
    }

    /// Whether a lifecycle script with this name is declared
    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    /// Project name for operator output
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("node")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FULL_MANIFEST: &str = r#"{
        "name": "web-shop",
        "engines": { "node": "22.x", "npm": "10.x" },
        "cacheDirectories": ["node_modules", ".cache/assets"],
        "scripts": {
            "nodepack-prebuild": "node scripts/prepare.js",
            "test": "jest"
        }
    }"#;

    #[test]
    fn parse_full_manifest() {
        let manifest = DependencyManifest::parse(FULL_MANIFEST).unwrap();

        assert_eq!(manifest.display_name(), "web-shop");
        assert_eq!(manifest.engines.node.as_deref(), Some("22.x"));
        assert_eq!(manifest.engines.npm.as_deref(), Some("10.x"));
        assert_eq!(
            manifest.cache_directories.as_deref(),
            Some(&["node_modules".to_string(), ".cache/assets".to_string()][..])
        );
        assert!(manifest.has_script(PREBUILD_SCRIPT));
        assert!(!manifest.has_script(POSTBUILD_SCRIPT));
    }

    #[test]
    fn parse_minimal_manifest() {
        let manifest = DependencyManifest::parse("{}").unwrap();

        assert_eq!(manifest.display_name(), "node");
        assert!(manifest.engines.node.is_none());
        assert!(manifest.cache_directories.is_none());
        assert!(manifest.scripts.is_empty());
    }

    #[test]
    fn parse_rejects_invalid_json() {
        assert!(DependencyManifest::parse("{not json").is_err());
    }

    #[tokio::test]
    async fn from_dir_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let err = DependencyManifest::from_dir(dir.path()).await.unwrap_err();
        assert!(matches!(err, NodepackError::ManifestMissing(_)));
    }

    #[tokio::test]
    async fn from_dir_invalid_manifest() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "{oops").unwrap();

        let err = DependencyManifest::from_dir(dir.path()).await.unwrap_err();
        assert!(matches!(err, NodepackError::ManifestInvalid { .. }));
    }

    #[tokio::test]
    async fn from_dir_parses_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), FULL_MANIFEST).unwrap();

        let manifest = DependencyManifest::from_dir(dir.path()).await.unwrap();
        assert_eq!(manifest.display_name(), "web-shop");
    }
}
