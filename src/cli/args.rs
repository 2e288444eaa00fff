//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Nodepack - Reproducible Node.js Dependency Installs
///
/// Prepares a runnable dependency tree for a JavaScript project inside
/// an ephemeral build sandbox, with cache reuse across builds.
#[derive(Parser, Debug)]
#[command(name = "nodepack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install project dependencies into the build directory
    Build(BuildArgs),

    /// Check whether a directory is a Node.js project
    Detect(DetectArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Directory containing the application source
    pub build_dir: PathBuf,

    /// Directory persisted between builds
    pub cache_dir: PathBuf,

    /// Directory holding one file per configuration variable
    pub env_dir: PathBuf,
}

/// Arguments for the detect command
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Directory containing the application source
    pub build_dir: PathBuf,
}
