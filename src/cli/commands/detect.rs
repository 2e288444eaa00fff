//! Detect command - check whether a directory is a Node.js project

use crate::cli::args::DetectArgs;
use crate::error::NodepackResult;
use crate::manifest::DependencyManifest;

/// Execute the detect command
///
/// Succeeds (and prints the project name) when the directory carries a
/// parseable package.json; fails otherwise, which tells the platform to
/// try another builder.
pub async fn execute(args: DetectArgs) -> NodepackResult<()> {
    let manifest = DependencyManifest::from_dir(&args.build_dir).await?;
    println!("{}", manifest.display_name());
    Ok(())
}
