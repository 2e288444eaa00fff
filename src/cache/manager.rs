//! Cache trust and lifecycle
//!
//! Owns the decision of whether a stored cache can be reused, and the
//! restore/save pair around it. Restore happens before installation and
//! only when the stored signature matches; save happens after a fully
//! successful pipeline.

use crate::cache::signature::Signature;
use crate::cache::store::{CacheRecord, CacheStore};
use crate::context::BuildContext;
use crate::error::NodepackResult;
use crate::manifest::DependencyManifest;
use chrono::Utc;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Default cached directories when the manifest declares none
pub const DEFAULT_CACHE_DIRECTORIES: [&str; 2] = ["node_modules", ".npm"];

/// Trust status of the stored cache for the current build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Stored signature matches the current toolchain
    Valid,
    /// A cache exists but was saved under a different toolchain
    Invalid,
    /// No cache from a previous build
    Absent,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid => write!(f, "invalid"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

/// Resolve the effective cache directory set for a build
///
/// The manifest's explicit `cacheDirectories` wins; otherwise the default
/// pair. Restore and save both go through this function, so the set never
/// drifts between the two phases of one build.
pub fn cache_directories(manifest: &DependencyManifest) -> Vec<String> {
    match &manifest.cache_directories {
        Some(dirs) => dirs.clone(),
        None => DEFAULT_CACHE_DIRECTORIES.iter().map(|s| s.to_string()).collect(),
    }
}

/// Restores and saves named cache directories
pub struct CacheManager {
    store: CacheStore,
}

impl CacheManager {
    /// Open the cache under a cache directory
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            store: CacheStore::new(cache_dir),
        }
    }

    /// Compare the stored signature against the freshly computed one
    pub async fn status(&self, signature: &Signature) -> CacheStatus {
        match self.store.read_record().await {
            None => CacheStatus::Absent,
            Some(record) => {
                let stored = Signature::from_stored(&record.signature);
                if stored == *signature {
                    CacheStatus::Valid
                } else {
                    debug!(
                        "Cache signature mismatch: stored {}, current {}",
                        stored.digest(),
                        signature.digest()
                    );
                    CacheStatus::Invalid
                }
            }
        }
    }

    /// Copy stored directories into the build dir
    ///
    /// Names missing from the store are skipped: a warm cache from a
    /// previous build may not have contained every requested directory.
    /// Returns the names actually restored.
    pub async fn restore(
        &self,
        ctx: &BuildContext,
        names: &[String],
    ) -> NodepackResult<Vec<String>> {
        let mut restored = Vec::new();
        for name in names {
            if !self.store.has_dir(name) {
                debug!("Cache has no entry for {}, skipping", name);
                continue;
            }
            let target = ctx.build_dir.join(name);
            self.store.restore_dir(name, &target).await?;
            restored.push(name.clone());
        }
        Ok(restored)
    }

    /// Persist the named directories and the fresh signature
    ///
    /// The previous store is cleared first so nothing stale survives.
    /// Persisting is best-effort per directory: one failed copy is a
    /// warning, not a build failure, and the record lists only the
    /// directories that were actually stored.
    pub async fn save(
        &self,
        ctx: &BuildContext,
        names: &[String],
        signature: &Signature,
    ) -> NodepackResult<Vec<String>> {
        self.store.clear().await?;

        let mut stored = Vec::new();
        for name in names {
            let source = ctx.build_dir.join(name);
            if !source.is_dir() {
                debug!("Build dir has no {} to cache, skipping", name);
                continue;
            }
            match self.store.store_dir(name, &source).await {
                Ok(()) => stored.push(name.clone()),
                Err(e) => warn!("Failed to cache {}: {}", name, e),
            }
        }

        let record = CacheRecord {
            signature: signature.as_str().to_string(),
            digest: signature.digest(),
            saved_at: Utc::now(),
            build_id: ctx.build_id,
            directories: stored.clone(),
        };
        self.store.write_record(&record).await?;

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envdir::EnvDir;
    use crate::runtime::Toolchain;
    use tempfile::TempDir;

    fn toolchain() -> Toolchain {
        Toolchain {
            node_version: "22.11.0".to_string(),
            npm_version: "10.9.0".to_string(),
            yarn_version: None,
            stack: "sandbox-24".to_string(),
        }
    }

    fn context(build: &TempDir, cache: &TempDir, envd: &TempDir) -> BuildContext {
        BuildContext::discover(build.path(), cache.path(), envd.path(), &EnvDir::default()).unwrap()
    }

    #[test]
    fn directory_resolution_prefers_manifest() {
        let manifest = DependencyManifest::parse(
            r#"{"cacheDirectories": ["node_modules", ".cache/assets"]}"#,
        )
        .unwrap();
        assert_eq!(
            cache_directories(&manifest),
            vec!["node_modules".to_string(), ".cache/assets".to_string()]
        );

        let bare = DependencyManifest::parse("{}").unwrap();
        assert_eq!(cache_directories(&bare), vec!["node_modules", ".npm"]);
    }

    #[tokio::test]
    async fn status_absent_without_record() {
        let cache = TempDir::new().unwrap();
        let manager = CacheManager::new(cache.path());
        let sig = Signature::compute(&toolchain());

        assert_eq!(manager.status(&sig).await, CacheStatus::Absent);
    }

    #[tokio::test]
    async fn status_valid_then_invalid_on_toolchain_change() {
        let (build, cache, envd) = (
            TempDir::new().unwrap(),
            TempDir::new().unwrap(),
            TempDir::new().unwrap(),
        );
        std::fs::create_dir(build.path().join("node_modules")).unwrap();
        let ctx = context(&build, &cache, &envd);

        let manager = CacheManager::new(cache.path());
        let sig = Signature::compute(&toolchain());
        let names = vec!["node_modules".to_string()];
        manager.save(&ctx, &names, &sig).await.unwrap();

        assert_eq!(manager.status(&sig).await, CacheStatus::Valid);

        let mut upgraded = toolchain();
        upgraded.node_version = "24.0.0".to_string();
        let new_sig = Signature::compute(&upgraded);
        assert_eq!(manager.status(&new_sig).await, CacheStatus::Invalid);
    }

    #[tokio::test]
    async fn save_restore_roundtrip() {
        let (build, cache, envd) = (
            TempDir::new().unwrap(),
            TempDir::new().unwrap(),
            TempDir::new().unwrap(),
        );
        let a = build.path().join("A");
        let b = build.path().join("B");
        std::fs::create_dir_all(a.join("nested")).unwrap();
        std::fs::create_dir(&b).unwrap();
        std::fs::write(a.join("nested/one.txt"), "one").unwrap();
        std::fs::write(b.join("two.txt"), "two").unwrap();
        // A directory outside the cached set
        let other = build.path().join("untouched");
        std::fs::create_dir(&other).unwrap();
        std::fs::write(other.join("keep.txt"), "keep").unwrap();

        let ctx = context(&build, &cache, &envd);
        let manager = CacheManager::new(cache.path());
        let sig = Signature::compute(&toolchain());
        let names = vec!["A".to_string(), "B".to_string()];

        let stored = manager.save(&ctx, &names, &sig).await.unwrap();
        assert_eq!(stored, names);

        // Wipe the originals, then restore
        std::fs::remove_dir_all(&a).unwrap();
        std::fs::remove_dir_all(&b).unwrap();

        let restored = manager.restore(&ctx, &names).await.unwrap();
        assert_eq!(restored, names);
        assert_eq!(std::fs::read_to_string(a.join("nested/one.txt")).unwrap(), "one");
        assert_eq!(std::fs::read_to_string(b.join("two.txt")).unwrap(), "two");
        assert_eq!(std::fs::read_to_string(other.join("keep.txt")).unwrap(), "keep");
    }

    #[tokio::test]
    async fn save_twice_is_idempotent() {
        let (build, cache, envd) = (
            TempDir::new().unwrap(),
            TempDir::new().unwrap(),
            TempDir::new().unwrap(),
        );
        let modules = build.path().join("node_modules");
        std::fs::create_dir(&modules).unwrap();
        std::fs::write(modules.join("pkg.js"), "ok").unwrap();

        let ctx = context(&build, &cache, &envd);
        let manager = CacheManager::new(cache.path());
        let sig = Signature::compute(&toolchain());
        let names = vec!["node_modules".to_string()];

        let first = manager.save(&ctx, &names, &sig).await.unwrap();
        let second = manager.save(&ctx, &names, &sig).await.unwrap();

        assert_eq!(first, second);
        let store = CacheStore::new(cache.path());
        assert!(store.dir_path("node_modules").join("pkg.js").exists());
        assert_eq!(manager.status(&sig).await, CacheStatus::Valid);
    }

    #[tokio::test]
    async fn save_clears_stale_entries() {
        let (build, cache, envd) = (
            TempDir::new().unwrap(),
            TempDir::new().unwrap(),
            TempDir::new().unwrap(),
        );
        let old = build.path().join("old_dir");
        std::fs::create_dir(&old).unwrap();
        let ctx = context(&build, &cache, &envd);
        let manager = CacheManager::new(cache.path());
        let sig = Signature::compute(&toolchain());

        manager
            .save(&ctx, &["old_dir".to_string()], &sig)
            .await
            .unwrap();
        let store = CacheStore::new(cache.path());
        assert!(store.has_dir("old_dir"));

        // Next save with a different set must not keep old_dir around
        let modules = build.path().join("node_modules");
        std::fs::create_dir(&modules).unwrap();
        manager
            .save(&ctx, &["node_modules".to_string()], &sig)
            .await
            .unwrap();

        assert!(!store.has_dir("old_dir"));
        assert!(store.has_dir("node_modules"));
    }

    #[tokio::test]
    async fn restore_skips_missing_entries() {
        let (build, cache, envd) = (
            TempDir::new().unwrap(),
            TempDir::new().unwrap(),
            TempDir::new().unwrap(),
        );
        let ctx = context(&build, &cache, &envd);
        let manager = CacheManager::new(cache.path());

        let restored = manager
            .restore(&ctx, &["node_modules".to_string(), ".npm".to_string()])
            .await
            .unwrap();
        assert!(restored.is_empty());
    }

    #[tokio::test]
    async fn save_skips_directories_absent_from_build() {
        let (build, cache, envd) = (
            TempDir::new().unwrap(),
            TempDir::new().unwrap(),
            TempDir::new().unwrap(),
        );
        let modules = build.path().join("node_modules");
        std::fs::create_dir(&modules).unwrap();

        let ctx = context(&build, &cache, &envd);
        let manager = CacheManager::new(cache.path());
        let sig = Signature::compute(&toolchain());

        let stored = manager
            .save(
                &ctx,
                &["node_modules".to_string(), ".npm".to_string()],
                &sig,
            )
            .await
            .unwrap();

        assert_eq!(stored, vec!["node_modules"]);
        let record = CacheStore::new(cache.path()).read_record().await.unwrap();
        assert_eq!(record.directories, vec!["node_modules"]);
    }
}
