//! On-disk cache layout
//!
//! Everything lives under `<cache_dir>/nodepack/`: a JSON record with the
//! signature and save metadata, plus one subdirectory per cached
//! directory name under `store/`. The layout is internal; nothing outside
//! this crate reads it.

use crate::error::{NodepackError, NodepackResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Subdirectory of the cache dir owned by nodepack
const CACHE_ROOT: &str = "nodepack";

/// Record file name under the cache root
const RECORD_FILE: &str = "record.json";

/// Directory holding the cached content, keyed by name
const STORE_DIR: &str = "store";

/// Metadata persisted with every saved cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Serialized toolchain signature at save time
    pub signature: String,
    /// Short digest of the signature, for logs
    pub digest: String,
    /// When the cache was saved
    pub saved_at: DateTime<Utc>,
    /// Build that produced the cache
    pub build_id: Uuid,
    /// Directory names actually stored
    pub directories: Vec<String>,
}

/// Filesystem handle for the cache layout
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Open the store under a cache directory
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            root: cache_dir.join(CACHE_ROOT),
        }
    }

    /// Path of the record file
    pub fn record_path(&self) -> PathBuf {
        self.root.join(RECORD_FILE)
    }

    /// Path of a stored directory by name
    pub fn dir_path(&self, name: &str) -> PathBuf {
        self.root.join(STORE_DIR).join(name)
    }

    /// Whether a directory with this name is stored
    pub fn has_dir(&self, name: &str) -> bool {
        self.dir_path(name).is_dir()
    }

    /// Read the record from a previous build, if any
    ///
    /// A corrupt record is treated as absent: the cache is untrusted and
    /// will be overwritten by the next save.
    pub async fn read_record(&self) -> Option<CacheRecord> {
        let path = self.record_path();
        let content = match fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(_) => return None,
        };
        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Ignoring corrupt cache record {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write the record for the cache just saved
    pub async fn write_record(&self, record: &CacheRecord) -> NodepackResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| NodepackError::io(format!("creating {}", self.root.display()), e))?;

        let content = serde_json::to_string_pretty(record)?;
        let path = self.record_path();
        fs::write(&path, content)
            .await
            .map_err(|e| NodepackError::io(format!("writing {}", path.display()), e))?;
        debug!("Wrote cache record {}", path.display());
        Ok(())
    }

    /// Remove all stored content and the record
    pub async fn clear(&self) -> NodepackResult<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)
                .await
                .map_err(|e| NodepackError::io(format!("clearing {}", self.root.display()), e))?;
        }
        Ok(())
    }

    /// Copy a named directory from the build dir into the store
    pub async fn store_dir(&self, name: &str, source: &Path) -> NodepackResult<()> {
        let target = self.dir_path(name);
        copy_dir(source, &target).await
    }

    /// Copy a stored directory into the build dir, replacing any existing
    /// directory of the same name
    pub async fn restore_dir(&self, name: &str, target: &Path) -> NodepackResult<()> {
        if target.exists() {
            fs::remove_dir_all(target)
                .await
                .map_err(|e| NodepackError::io(format!("replacing {}", target.display()), e))?;
        }
        copy_dir(&self.dir_path(name), target).await
    }
}

/// Recursively copy a directory tree
///
/// Symlinks are recreated rather than followed, so dependency trees with
/// `.bin` links survive the round trip.
pub async fn copy_dir(source: &Path, target: &Path) -> NodepackResult<()> {
    let mut worklist = vec![(source.to_path_buf(), target.to_path_buf())];

    while let Some((src, dst)) = worklist.pop() {
        fs::create_dir_all(&dst)
            .await
            .map_err(|e| NodepackError::io(format!("creating {}", dst.display()), e))?;

        let mut entries = fs::read_dir(&src)
            .await
            .map_err(|e| NodepackError::io(format!("reading {}", src.display()), e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| NodepackError::io(format!("reading {}", src.display()), e))?
        {
            let from = entry.path();
            let to = dst.join(entry.file_name());
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| NodepackError::io(format!("inspecting {}", from.display()), e))?;

            if file_type.is_dir() {
                worklist.push((from, to));
            } else if file_type.is_symlink() {
                let link = fs::read_link(&from)
                    .await
                    .map_err(|e| NodepackError::io(format!("reading link {}", from.display()), e))?;
                #[cfg(unix)]
                fs::symlink(&link, &to)
                    .await
                    .map_err(|e| NodepackError::io(format!("linking {}", to.display()), e))?;
                #[cfg(not(unix))]
                debug!("Skipping symlink {} -> {}", from.display(), link.display());
            } else {
                fs::copy(&from, &to)
                    .await
                    .map_err(|e| NodepackError::io(format!("copying {}", from.display()), e))?;
            }
        }
    }

    Ok(())
}
