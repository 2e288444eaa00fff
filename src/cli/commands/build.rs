//! Build command - install dependencies with cache reuse
//!
//! The single orchestrator composing discovery, runtime installation,
//! cache trust, strategy selection, the install pipeline, and failure
//! classification. Fatal precondition checks all run before anything
//! mutates the build directory.

use crate::cache::{cache_directories, CacheManager, CacheStatus, Signature};
use crate::cli::args::BuildArgs;
use crate::context::BuildContext;
use crate::diagnose;
use crate::envdir::EnvDir;
use crate::error::NodepackResult;
use crate::install::{InstallPipeline, InstallStrategy};
use crate::manifest::DependencyManifest;
use crate::process::{CommandSpec, LogBuffer, ProcessRunner, SystemRunner};
use crate::runtime::RuntimeInstaller;
use crate::ui;
use tracing::{debug, info};

/// Execute the build command
pub async fn execute(args: BuildArgs) -> NodepackResult<()> {
    ui::section("Preparing build");
    let env = EnvDir::read(&args.env_dir).await?;
    let manifest = DependencyManifest::from_dir(&args.build_dir).await?;
    let mut ctx = BuildContext::discover(&args.build_dir, &args.cache_dir, &args.env_dir, &env)?;

    info!("Build {} for {}", ctx.build_id, manifest.display_name());
    ui::step_detail("Project detected", manifest.display_name());

    // Strategy is decided on the state observed at discovery, before any
    // cache content lands in the build directory.
    let strategy = InstallStrategy::select(ctx.uses_yarn_lock(), ctx.has_prebuilt_modules());
    if ctx.has_prebuilt_modules() && !ctx.uses_yarn_lock() {
        ui::warn("node_modules already present in the build directory; rebuilding in place");
    }

    ui::section("Installing Node.js runtime");
    let runner = SystemRunner::new();
    let toolchain = RuntimeInstaller::new(&runner).install(&ctx, &manifest).await?;
    ui::step_detail(
        "Runtime ready",
        &format!("node {} / npm {}", toolchain.node_version, toolchain.npm_version),
    );

    let signature = Signature::compute(&toolchain);
    debug!("Toolchain signature: {} ({})", signature, signature.digest());

    let cache = CacheManager::new(&ctx.cache_dir);
    let names = cache_directories(&manifest);

    ui::section("Restoring cache");
    match cache.status(&signature).await {
        CacheStatus::Valid => {
            let restored = cache.restore(&ctx, &names).await?;
            if restored.is_empty() {
                ui::step("Cache is valid but empty (warming up)");
            } else {
                ui::step_detail("Cache restored", &restored.join(", "));
            }
        }
        CacheStatus::Invalid => {
            ui::warn("Cache invalidated (toolchain changed since it was saved)");
        }
        CacheStatus::Absent => {
            ui::step("No cache available (first build)");
        }
    }

    ui::section(&format!("Installing dependencies ({})", strategy));
    debug!("Strategy: {}", strategy.describe());
    {
        let mut pipeline = InstallPipeline::new(&mut ctx, &manifest, strategy, &runner);
        if let Err(e) = pipeline.run().await {
            report_failure(pipeline.log());
            return Err(e);
        }
    }
    ui::step("Dependencies installed");

    if ctx.verbose_listing {
        ui::section("Installed dependencies");
        let listing = CommandSpec::new("npm", ["ls", "--depth=0"], &ctx.build_dir)
            .prepend_path(&ctx.node_bin())
            .echoed();
        // Best effort: npm ls exits non-zero on peer dependency gripes
        if let Err(e) = runner.run(&listing).await {
            debug!("Dependency listing failed: {}", e);
        }
    }

    if ctx.cache_enabled {
        ui::section("Caching build artifacts");
        let stored = cache.save(&ctx, &names, &signature).await?;
        ui::step_detail(
            &format!("Cached {} directories", stored.len()),
            &signature.digest(),
        );
    } else {
        ui::warn("Cache save disabled (NODE_MODULES_CACHE=false)");
    }

    ui::done(&format!("Build complete for {}", manifest.display_name()));
    Ok(())
}

/// Classify the captured log and render diagnostics before the failure
/// itself is surfaced by the caller
fn report_failure(log: &LogBuffer) {
    let diagnostics = diagnose::classify(log);
    ui::section("Build failed");
    if diagnostics.is_empty() {
        ui::fail("No known failure pattern matched; the last output lines were:");
        for line in log.tail(10) {
            println!("         {}", line);
        }
        return;
    }
    for diag in &diagnostics {
        ui::diagnostic(diag);
    }
}
