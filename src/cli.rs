use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// buildprep - fail-fast dependency bootstrap for build pipelines
#[derive(Parser)]
#[command(name = "buildprep")]
#[command(about = "Fail-fast dependency bootstrap for build pipelines")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: log the commands that would run without executing them.
    ///
    /// The install sequence is walked stage by stage, but the installer is
    /// never spawned; each step reports a synthetic success.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full install sequence (the default when no command is given)
    Run,
    /// Validate the dependency manifest without installing anything
    Validate {
        /// Path to the manifest (defaults to requirements.txt)
        manifest: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
