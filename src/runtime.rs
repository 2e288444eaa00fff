//! Node.js runtime installation
//!
//! Resolves the manifest's engine range against the published release
//! index, downloads the matching runtime into the build directory, and
//! probes the resulting toolchain versions. Mechanical by design; all
//! trust decisions based on the toolchain live in the cache module.

use crate::context::BuildContext;
use crate::error::{NodepackError, NodepackResult};
use crate::manifest::DependencyManifest;
use crate::process::{CommandSpec, ProcessRunner};
use crate::ui;
use semver::{Version, VersionReq};
use serde::Deserialize;
use tokio::fs;
use tracing::debug;

/// Published release index
pub const NODE_DIST_INDEX: &str = "https://nodejs.org/dist/index.json";

/// Range used when the manifest pins no engines.node
pub const DEFAULT_NODE_RANGE: &str = "22.x";

/// Resolved toolchain versions for one build
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Installed Node.js version (no leading `v`)
    pub node_version: String,
    /// Installed npm version
    pub npm_version: String,
    /// Installed yarn version, when the project uses yarn
    pub yarn_version: Option<String>,
    /// Platform stack identifier
    pub stack: String,
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    version: String,
}

/// Parse the release index into sorted versions, newest first
pub fn parse_release_index(json: &str) -> NodepackResult<Vec<Version>> {
    let entries: Vec<IndexEntry> = serde_json::from_str(json)?;
    let mut versions: Vec<Version> = entries
        .iter()
        .filter_map(|e| Version::parse(e.version.trim_start_matches('v')).ok())
        .collect();
    versions.sort_unstable_by(|a, b| b.cmp(a));
    Ok(versions)
}

/// Parse an engine range, accepting npm's space-separated comparator form
pub fn parse_range(field: &str, raw: &str) -> NodepackResult<VersionReq> {
    if let Ok(req) = VersionReq::parse(raw) {
        return Ok(req);
    }
    // npm writes ">=20 <23"; the semver crate wants comma separators
    let rejoined = raw.split_whitespace().collect::<Vec<_>>().join(", ");
    VersionReq::parse(&rejoined).map_err(|e| NodepackError::EngineRangeInvalid {
        field: field.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Highest version satisfying the range
pub fn max_satisfying(versions: &[Version], req: &VersionReq) -> Option<Version> {
    versions.iter().find(|v| req.matches(v)).cloned()
}

/// Resolve an engine range against release index JSON
pub fn resolve_node_version(index_json: &str, range: &str) -> NodepackResult<Version> {
    let versions = parse_release_index(index_json)?;
    let req = parse_range("engines.node", range)?;
    max_satisfying(&versions, &req).ok_or_else(|| NodepackError::RuntimeResolve {
        constraint: range.to_string(),
    })
}

/// Tarball URL for a resolved version on this platform
pub fn tarball_url(version: &Version) -> String {
    let (os, arch) = platform_pair();
    format!("https://nodejs.org/dist/v{version}/node-v{version}-{os}-{arch}.tar.gz")
}

fn platform_pair() -> (&'static str, &'static str) {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        other => other,
    };
    (os, arch)
}

fn fetch_string(url: &str) -> NodepackResult<String> {
    let mut response = ureq::get(url).call().map_err(|e| NodepackError::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    response
        .body_mut()
        .read_to_string()
        .map_err(|e| NodepackError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

fn fetch_bytes(url: &str) -> NodepackResult<Vec<u8>> {
    let mut response = ureq::get(url).call().map_err(|e| NodepackError::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    response
        .body_mut()
        .read_to_vec()
        .map_err(|e| NodepackError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// Downloads and installs the toolchain for one build
pub struct RuntimeInstaller<'a, R: ProcessRunner> {
    runner: &'a R,
}

impl<'a, R: ProcessRunner> RuntimeInstaller<'a, R> {
    /// Create an installer using the given runner for subprocesses
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Install the runtime and return the probed toolchain
    pub async fn install(
        &self,
        ctx: &BuildContext,
        manifest: &DependencyManifest,
    ) -> NodepackResult<Toolchain> {
        let range = match manifest.engines.node.as_deref() {
            Some(range) => range.to_string(),
            None => {
                ui::warn(&format!(
                    "No engines.node pinned in package.json; defaulting to {}",
                    DEFAULT_NODE_RANGE
                ));
                DEFAULT_NODE_RANGE.to_string()
            }
        };

        let index = fetch_blocking(NODE_DIST_INDEX.to_string(), fetch_string).await?;
        let version = resolve_node_version(&index, &range)?;
        ui::step(&format!("Resolved Node.js {} (requested {})", version, range));

        self.download_and_unpack(ctx, &version).await?;

        if let Some(npm_range) = manifest.engines.npm.as_deref() {
            // Validate the range before handing it to npm
            parse_range("engines.npm", npm_range)?;
            ui::step(&format!("Pinning npm to {}", npm_range));
            let pin = format!("npm@{}", npm_range);
            self.toolchain_exec(ctx, "npm", &["install", "-g", pin.as_str()])
                .await?;
        }

        if ctx.uses_yarn_lock() && self.probe(ctx, "yarn").await.is_none() {
            ui::step("Installing yarn");
            self.toolchain_exec(ctx, "npm", &["install", "-g", "yarn"]).await?;
        }

        let node_version = self.probe_required(ctx, "node").await?;
        let npm_version = self.probe_required(ctx, "npm").await?;
        let yarn_version = if ctx.uses_yarn_lock() {
            self.probe(ctx, "yarn").await
        } else {
            None
        };

        write_profile(ctx).await?;

        Ok(Toolchain {
            node_version,
            npm_version,
            yarn_version,
            stack: ctx.stack.clone(),
        })
    }

    async fn download_and_unpack(
        &self,
        ctx: &BuildContext,
        version: &Version,
    ) -> NodepackResult<()> {
        let url = tarball_url(version);
        debug!("Downloading {}", url);
        let spinner = ui::BuildSpinner::start(&format!("Downloading Node.js v{}", version));
        let fetched = fetch_blocking(url, fetch_bytes).await;
        spinner.finish();
        let bytes = fetched?;

        let node_home = ctx.node_home();
        fs::create_dir_all(&node_home)
            .await
            .map_err(|e| NodepackError::io(format!("creating {}", node_home.display()), e))?;

        let tarball = ctx.internal_dir().join("node.tar.gz");
        fs::write(&tarball, &bytes)
            .await
            .map_err(|e| NodepackError::io(format!("writing {}", tarball.display()), e))?;

        let tarball_arg = tarball.display().to_string();
        let dest_arg = node_home.display().to_string();
        let spec = CommandSpec::new(
            "tar",
            [
                "-xzf",
                tarball_arg.as_str(),
                "-C",
                dest_arg.as_str(),
                "--strip-components=1",
            ],
            &ctx.build_dir,
        );
        let output = self.runner.run(&spec).await?;
        if !output.success() {
            return Err(NodepackError::StepFailed {
                stage: "runtime".to_string(),
                command: spec.display(),
                exit_code: output.exit_code,
            });
        }

        fs::remove_file(&tarball)
            .await
            .map_err(|e| NodepackError::io(format!("removing {}", tarball.display()), e))?;
        Ok(())
    }

    async fn toolchain_exec(
        &self,
        ctx: &BuildContext,
        program: &str,
        args: &[&str],
    ) -> NodepackResult<()> {
        let spec = CommandSpec::new(program, args.iter().copied(), &ctx.build_dir)
            .prepend_path(&ctx.node_bin());
        let output = self.runner.run(&spec).await?;
        if !output.success() {
            return Err(NodepackError::StepFailed {
                stage: "runtime".to_string(),
                command: spec.display(),
                exit_code: output.exit_code,
            });
        }
        Ok(())
    }

    /// Probe `<program> --version`, returning the trimmed version
    async fn probe(&self, ctx: &BuildContext, program: &str) -> Option<String> {
        let spec = CommandSpec::new(program, ["--version"], &ctx.build_dir)
            .prepend_path(&ctx.node_bin());
        match self.runner.run(&spec).await {
            Ok(out) if out.success() => out
                .first_line()
                .map(|l| l.trim_start_matches('v').to_string()),
            _ => None,
        }
    }

    async fn probe_required(&self, ctx: &BuildContext, program: &str) -> NodepackResult<String> {
        self.probe(ctx, program).await.ok_or_else(|| {
            NodepackError::Internal(format!("installed toolchain has no working {}", program))
        })
    }
}

async fn fetch_blocking<T, F>(url: String, fetch: F) -> NodepackResult<T>
where
    T: Send + 'static,
    F: FnOnce(&str) -> NodepackResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || fetch(&url))
        .await
        .map_err(|e| NodepackError::Internal(format!("download task failed: {}", e)))?
}

/// Write the profile script exporting the runtime onto PATH at run time
async fn write_profile(ctx: &BuildContext) -> NodepackResult<()> {
    let profile_dir = ctx.build_dir.join(".profile.d");
    fs::create_dir_all(&profile_dir)
        .await
        .map_err(|e| NodepackError::io(format!("creating {}", profile_dir.display()), e))?;

    let script = profile_dir.join("nodepack.sh");
    let content = "export NODE_HOME=\"$HOME/.nodepack/node\"\nexport PATH=\"$NODE_HOME/bin:$PATH\"\n";
    fs::write(&script, content)
        .await
        .map_err(|e| NodepackError::io(format!("writing {}", script.display()), e))
}
