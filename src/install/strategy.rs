//! Installation strategy selection
//!
//! A pure decision over the project state observed at discovery time.
//! Evaluated once per build; the pipeline executes whatever was chosen.

use std::fmt;

/// One of the mutually exclusive installation procedures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStrategy {
    /// Yarn lockfile present: install with yarn against the lockfile
    YarnInstall,
    /// Dependency directory already present: rebuild it in place
    NpmRebuild,
    /// Fresh install from the manifest
    NpmInstall,
}

impl InstallStrategy {
    /// Choose the strategy for a build
    ///
    /// A yarn lockfile takes strict priority over a prebuilt dependency
    /// directory: a project with both always installs with yarn (and the
    /// prebuilt directory is discarded by the pipeline).
    pub fn select(uses_yarn_lock: bool, has_prebuilt_modules: bool) -> Self {
        if uses_yarn_lock {
            Self::YarnInstall
        } else if has_prebuilt_modules {
            Self::NpmRebuild
        } else {
            Self::NpmInstall
        }
    }

    /// One-line description for operator output
    pub fn describe(&self) -> &'static str {
        match self {
            Self::YarnInstall => "installing from yarn.lock",
            Self::NpmRebuild => "rebuilding existing node_modules",
            Self::NpmInstall => "installing from package.json",
        }
    }
}

impl fmt::Display for InstallStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::YarnInstall => write!(f, "yarn install"),
            Self::NpmRebuild => write!(f, "npm rebuild"),
            Self::NpmInstall => write!(f, "npm install"),
        }
    }
}
