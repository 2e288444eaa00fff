//! Real subprocess execution on top of tokio
//!
//! Captures stdout and stderr line by line into a single ordered list,
//! optionally echoing each line to the operator with the standard build
//! output indent.

use crate::error::{NodepackError, NodepackResult};
use crate::process::runner::{CommandSpec, ProcessOutput, ProcessRunner};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Indent applied to echoed subprocess output
const OUTPUT_INDENT: &str = "       ";

/// Runner that spawns real processes
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new system runner
    pub fn new() -> Self {
        Self
    }

    fn build_path(spec: &CommandSpec) -> Option<String> {
        let prepend = spec.path_prepend.as_ref()?;
        let inherited = std::env::var("PATH").unwrap_or_default();
        if inherited.is_empty() {
            Some(prepend.display().to_string())
        } else {
            Some(format!("{}:{}", prepend.display(), inherited))
        }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain a child stream into the shared line sink
async fn drain<R: AsyncRead + Unpin>(stream: R, sink: Arc<Mutex<Vec<String>>>, echo: bool) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if echo {
            println!("{}{}", OUTPUT_INDENT, line);
        }
        if let Ok(mut sink) = sink.lock() {
            sink.push(line);
        }
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> NodepackResult<ProcessOutput> {
        debug!("Executing: {} (cwd: {})", spec.display(), spec.cwd.display());

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for (key, value) in &spec.env {
            command.env(key, value);
        }
        if let Some(path) = Self::build_path(spec) {
            command.env("PATH", path);
        }

        let mut child = command
            .spawn()
            .map_err(|e| NodepackError::command_failed(spec.display(), e))?;

        let sink = Arc::new(Mutex::new(Vec::new()));
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let out_task = stdout.map(|s| drain(s, Arc::clone(&sink), spec.echo));
        let err_task = stderr.map(|s| drain(s, Arc::clone(&sink), spec.echo));

        match (out_task, err_task) {
            (Some(o), Some(e)) => {
                tokio::join!(o, e);
            }
            (Some(o), None) => o.await,
            (None, Some(e)) => e.await,
            (None, None) => {}
        }

        let status = child
            .wait()
            .await
            .map_err(|e| NodepackError::command_failed(spec.display(), e))?;

        let exit_code = status.code().ok_or_else(|| NodepackError::ProcessSignaled {
            command: spec.display(),
        })?;

        let lines = sink.lock().map(|s| s.clone()).unwrap_or_default();
        debug!(
            "Completed: {} (exit {}, {} lines)",
            spec.display(),
            exit_code,
            lines.len()
        );

        Ok(ProcessOutput::new(exit_code, lines))
    }
}
