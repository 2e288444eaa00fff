//! Subprocess runner abstraction
//!
//! The pipeline never spawns processes directly; it describes the
//! invocation with a [`CommandSpec`] and hands it to a [`ProcessRunner`].
//! Production uses [`crate::process::SystemRunner`]; tests use a
//! scripted fake.

use crate::error::NodepackResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A fully described subprocess invocation
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program to execute
    pub program: String,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Working directory
    pub cwd: PathBuf,
    /// Extra environment variables layered over the inherited ones
    pub env: Vec<(String, String)>,
    /// Directory to prepend to PATH (toolchain bin dir)
    pub path_prepend: Option<PathBuf>,
    /// Whether captured lines are echoed to the operator as they arrive
    pub echo: bool,
}

impl CommandSpec {
    /// Describe an invocation of `program` with `args` in `cwd`
    pub fn new<I, S>(program: &str, args: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.to_path_buf(),
            env: Vec::new(),
            path_prepend: None,
            echo: false,
        }
    }

    /// Add an environment variable override
    pub fn env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.env.push((key.to_string(), value.into()));
        self
    }

    /// Prepend a directory to PATH for this invocation
    pub fn prepend_path(mut self, dir: &Path) -> Self {
        self.path_prepend = Some(dir.to_path_buf());
        self
    }

    /// Echo captured output to the operator while it is collected
    pub fn echoed(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Human-readable command line for logs and error messages
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured result of a completed subprocess
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code reported by the process
    pub exit_code: i32,
    /// Interleaved stdout and stderr lines, in arrival order
    pub lines: Vec<String>,
}

impl ProcessOutput {
    /// Build an output record
    pub fn new(exit_code: i32, lines: Vec<String>) -> Self {
        Self { exit_code, lines }
    }

    /// Whether the process exited zero
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// First captured line, trimmed (for version probes)
    pub fn first_line(&self) -> Option<&str> {
        self.lines.first().map(|l| l.trim())
    }
}

/// Abstract subprocess runner
///
/// Implementations block until the process exits and report the exit
/// code together with all captured output lines.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the described command to completion
    async fn run(&self, spec: &CommandSpec) -> NodepackResult<ProcessOutput>;
}
