//! Error types for Nodepack
//!
//! All modules use `NodepackResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Nodepack operations
pub type NodepackResult<T> = Result<T, NodepackError>;

/// All errors that can occur in Nodepack
#[derive(Error, Debug)]
pub enum NodepackError {
    // Precondition errors - checked before any build directory mutation
    #[error("Two different lockfiles found: yarn.lock and package-lock.json")]
    ConflictingLockfiles,

    #[error("No package.json found in {0}")]
    ManifestMissing(PathBuf),

    #[error("Unable to parse package.json: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    #[error("Found a .nodepack directory checked into the build directory: {0}")]
    NestedBuildDir(PathBuf),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    PathNotDirectory(PathBuf),

    // Environment directory errors
    #[error("Failed to read environment directory {path}: {reason}")]
    EnvDirRead { path: PathBuf, reason: String },

    // Runtime installation errors
    #[error("No Node.js release satisfies the requested range {constraint}")]
    RuntimeResolve { constraint: String },

    #[error("Invalid engine range {field} = \"{value}\": {reason}")]
    EngineRangeInvalid {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    // Pipeline errors
    #[error("Build step `{stage}` failed: {command} exited with code {exit_code}")]
    StepFailed {
        stage: String,
        command: String,
        exit_code: i32,
    },

    // Process errors
    #[error("Command failed to start: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Process terminated by signal: {command}")]
    ProcessSignaled { command: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NodepackError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Whether this error was detected before any build directory mutation
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::ConflictingLockfiles
                | Self::ManifestMissing(_)
                | Self::ManifestInvalid { .. }
                | Self::NestedBuildDir(_)
                | Self::PathNotFound(_)
                | Self::PathNotDirectory(_)
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConflictingLockfiles => {
                Some("Commit exactly one lockfile and delete the other")
            }
            Self::ManifestMissing(_) => {
                Some("A package.json at the project root is required")
            }
            Self::NestedBuildDir(_) => {
                Some("Remove .nodepack from source control; it is recreated on every build")
            }
            Self::RuntimeResolve { .. } => {
                Some("Check the engines.node range in package.json against published releases")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = NodepackError::ConflictingLockfiles;
        assert!(err.to_string().contains("Two different lockfiles"));
    }

    #[test]
    fn error_hint() {
        let err = NodepackError::ConflictingLockfiles;
        assert_eq!(
            err.hint(),
            Some("Commit exactly one lockfile and delete the other")
        );
    }

    #[test]
    fn error_precondition() {
        assert!(NodepackError::ConflictingLockfiles.is_precondition());
        assert!(NodepackError::ManifestMissing(PathBuf::from("/app")).is_precondition());
        assert!(!NodepackError::StepFailed {
            stage: "install".to_string(),
            command: "npm install".to_string(),
            exit_code: 1,
        }
        .is_precondition());
    }

    #[test]
    fn step_failed_display() {
        let err = NodepackError::StepFailed {
            stage: "install".to_string(),
            command: "npm install".to_string(),
            exit_code: 137,
        };
        let msg = err.to_string();
        assert!(msg.contains("install"));
        assert!(msg.contains("137"));
    }
}
