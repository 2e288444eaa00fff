//! Build context
//!
//! One value describing the build inputs, created at pipeline start and
//! passed explicitly to every operation. No component reads ambient
//! process state to make a decision.

use crate::envdir::EnvDir;
use crate::error::{NodepackError, NodepackResult};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Yarn lockfile name
pub const YARN_LOCKFILE: &str = "yarn.lock";

/// npm lockfile names, either of which counts as an npm lock
pub const NPM_LOCKFILES: [&str; 2] = ["package-lock.json", "npm-shrinkwrap.json"];

/// Dependency directory produced by installs
pub const MODULES_DIR: &str = "node_modules";

/// Internal directory created inside the build dir for the runtime
pub const INTERNAL_DIR: &str = ".nodepack";

/// Immutable description of one build
///
/// The only mutation after discovery is [`BuildContext::clear_prebuilt_modules`],
/// recorded when the pipeline deletes a checked-in `node_modules`.
#[derive(Debug)]
pub struct BuildContext {
    /// Application source directory
    pub build_dir: PathBuf,
    /// Directory persisted between builds
    pub cache_dir: PathBuf,
    /// Directory holding configuration variables
    pub env_dir: PathBuf,
    /// Unique id for this build run
    pub build_id: Uuid,
    /// Platform stack identifier
    pub stack: String,
    /// Whether cache restore/save is enabled
    pub cache_enabled: bool,
    /// Whether to produce a dependency listing on success
    pub verbose_listing: bool,
    has_prebuilt_modules: bool,
    uses_yarn_lock: bool,
    uses_npm_lock: bool,
}

impl BuildContext {
    /// Inspect the build directory and assemble the context
    ///
    /// Fatal preconditions checked here, before any mutation:
    /// both lockfiles present, or a checked-in internal directory.
    pub fn discover(
        build_dir: &Path,
        cache_dir: &Path,
        env_dir: &Path,
        env: &EnvDir,
    ) -> NodepackResult<Self> {
        validate_dir(build_dir)?;
        validate_dir(cache_dir)?;

        let nested = build_dir.join(INTERNAL_DIR);
        if nested.exists() {
            return Err(NodepackError::NestedBuildDir(nested));
        }

        let uses_yarn_lock = build_dir.join(YARN_LOCKFILE).is_file();
        let uses_npm_lock = NPM_LOCKFILES.iter().any(|f| build_dir.join(f).is_file());

        if uses_yarn_lock && uses_npm_lock {
            return Err(NodepackError::ConflictingLockfiles);
        }

        let has_prebuilt_modules = build_dir.join(MODULES_DIR).is_dir();
        let build_id = Uuid::new_v4();

        debug!(
            "Build {}: yarn_lock={}, npm_lock={}, prebuilt={}",
            build_id, uses_yarn_lock, uses_npm_lock, has_prebuilt_modules
        );

        Ok(Self {
            build_dir: build_dir.to_path_buf(),
            cache_dir: cache_dir.to_path_buf(),
            env_dir: env_dir.to_path_buf(),
            build_id,
            stack: env.stack(),
            cache_enabled: env.cache_enabled(),
            verbose_listing: env.verbose_listing(),
            has_prebuilt_modules,
            uses_yarn_lock,
            uses_npm_lock,
        })
    }

    /// Whether a yarn lockfile is present
    pub fn uses_yarn_lock(&self) -> bool {
        self.uses_yarn_lock
    }

    /// Whether an npm lockfile is present
    pub fn uses_npm_lock(&self) -> bool {
        self.uses_npm_lock
    }

    /// Whether a dependency directory already exists in the build dir
    pub fn has_prebuilt_modules(&self) -> bool {
        self.has_prebuilt_modules
    }

    /// Record that the pipeline removed the prebuilt dependency directory
    pub fn clear_prebuilt_modules(&mut self) {
        self.has_prebuilt_modules = false;
    }

    /// The internal directory for this build
    pub fn internal_dir(&self) -> PathBuf {
        self.build_dir.join(INTERNAL_DIR)
    }

    /// Where the Node.js runtime is installed
    pub fn node_home(&self) -> PathBuf {
        self.internal_dir().join("node")
    }

    /// The runtime bin directory, prepended to PATH for subprocesses
    pub fn node_bin(&self) -> PathBuf {
        self.node_home().join("bin")
    }
}

fn validate_dir(path: &Path) -> NodepackResult<()> {
    if !path.exists() {
        return Err(NodepackError::PathNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(NodepackError::PathNotDirectory(path.to_path_buf()));
    }
    Ok(())
}
