//! Installation pipeline
//!
//! Sequential state machine around the chosen install strategy and the
//! user-declared lifecycle hooks. Fail-fast: the first non-zero exit
//! moves to `Failed` and nothing later runs. The pipeline collects all
//! subprocess output into the build log but never classifies failures;
//! that is the driver's job.

use crate::context::{BuildContext, MODULES_DIR};
use crate::error::{NodepackError, NodepackResult};
use crate::install::strategy::InstallStrategy;
use crate::manifest::{DependencyManifest, POSTBUILD_SCRIPT, PREBUILD_SCRIPT};
use crate::process::{CommandSpec, LogBuffer, ProcessRunner};
use crate::ui;
use tokio::fs;
use tracing::debug;

/// Pipeline states, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    PreHook,
    Install,
    PostHook,
    Done,
    /// Terminal state reachable from any non-terminal state
    Failed,
}

/// Executes one build's installation steps
pub struct InstallPipeline<'a, R: ProcessRunner> {
    ctx: &'a mut BuildContext,
    manifest: &'a DependencyManifest,
    strategy: InstallStrategy,
    runner: &'a R,
    log: LogBuffer,
    state: PipelineState,
}

impl<'a, R: ProcessRunner> InstallPipeline<'a, R> {
    /// Assemble a pipeline for the chosen strategy
    pub fn new(
        ctx: &'a mut BuildContext,
        manifest: &'a DependencyManifest,
        strategy: InstallStrategy,
        runner: &'a R,
    ) -> Self {
        Self {
            ctx,
            manifest,
            strategy,
            runner,
            log: LogBuffer::new(),
            state: PipelineState::Start,
        }
    }

    /// Run all stages to completion or first failure
    pub async fn run(&mut self) -> NodepackResult<()> {
        match self.drive().await {
            Ok(()) => {
                self.transition(PipelineState::Done);
                Ok(())
            }
            Err(e) => {
                self.transition(PipelineState::Failed);
                Err(e)
            }
        }
    }

    /// The accumulated build log
    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    /// Current pipeline state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    async fn drive(&mut self) -> NodepackResult<()> {
        self.transition(PipelineState::PreHook);
        self.run_hook(PREBUILD_SCRIPT, "prebuild").await?;

        self.transition(PipelineState::Install);
        self.install().await?;

        self.transition(PipelineState::PostHook);
        self.run_hook(POSTBUILD_SCRIPT, "postbuild").await?;

        Ok(())
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("Pipeline: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    async fn run_hook(&mut self, script: &str, stage: &str) -> NodepackResult<()> {
        if !self.manifest.has_script(script) {
            debug!("No {} script declared, skipping", script);
            return Ok(());
        }
        ui::step(&format!("Running {} script", script));
        self.exec(stage, CommandSpec::new("npm", ["run", script], &self.ctx.build_dir))
            .await
    }

    async fn install(&mut self) -> NodepackResult<()> {
        match self.strategy {
            InstallStrategy::YarnInstall => {
                if self.ctx.has_prebuilt_modules() {
                    ui::warn("node_modules is checked into source control; removing it for a clean yarn install");
                    let modules = self.ctx.build_dir.join(MODULES_DIR);
                    fs::remove_dir_all(&modules).await.map_err(|e| {
                        NodepackError::io(format!("removing {}", modules.display()), e)
                    })?;
                    self.ctx.clear_prebuilt_modules();
                }
                self.exec(
                    "install",
                    CommandSpec::new(
                        "yarn",
                        ["install", "--frozen-lockfile"],
                        &self.ctx.build_dir,
                    )
                    .env(
                        "YARN_CACHE_FOLDER",
                        self.ctx.build_dir.join(".yarn-cache").display().to_string(),
                    ),
                )
                .await
            }
            InstallStrategy::NpmRebuild => {
                self.exec(
                    "install",
                    CommandSpec::new("npm", ["rebuild"], &self.ctx.build_dir),
                )
                .await
            }
            InstallStrategy::NpmInstall => {
                self.exec(
                    "install",
                    CommandSpec::new("npm", ["install", "--no-audit"], &self.ctx.build_dir),
                )
                .await
            }
        }
    }

    async fn exec(&mut self, stage: &str, spec: CommandSpec) -> NodepackResult<()> {
        let spec = spec
            .env(
                "npm_config_cache",
                self.ctx.build_dir.join(".npm").display().to_string(),
            )
            .prepend_path(&self.ctx.node_bin())
            .echoed();

        let output = self.runner.run(&spec).await?;
        let exit_code = output.exit_code;
        self.log.extend(output.lines);

        if exit_code != 0 {
            return Err(NodepackError::StepFailed {
                stage: stage.to_string(),
                command: spec.display(),
                exit_code,
            });
        }
        Ok(())
    }
}
