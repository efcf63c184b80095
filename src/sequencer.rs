//! Installer Sequencer
//!
//! Runs the three install operations in strict order, aborting immediately
//! on the first non-zero exit:
//!
//! 1. Upgrade the package installer (`pip install --upgrade pip`)
//! 2. Install the pinned dependency in isolation (`--no-deps`)
//! 3. Install the dependency manifest with full resolution
//!
//! There is no retry, no rollback, and no partial-success reporting. The
//! failed step's exit code becomes the process exit code.

use std::path::PathBuf;

use crate::error::{BuildPrepError, Result};
use crate::manifest::Manifest;
use crate::notify::WebhookNotifier;
use crate::preflight;
use crate::runner::run_command_safe;
use crate::stage::SequencerContext;
use crate::step_traits::{enable_dry_run, InstallerArgs};
use crate::steps::pip::{IsolatedInstallArgs, ManifestInstallArgs, SelfUpgradeArgs, MANIFEST_PATH};

/// Options for a sequence run.
#[derive(Debug, Clone, Default)]
pub struct SequenceOptions {
    /// Log the commands without executing the installer.
    pub dry_run: bool,
}

/// Run the full install sequence.
///
/// Performs preflight checks (exiting early if the environment is unusable),
/// executes the three steps fail-fast, and delivers the outcome notification.
/// On failure the returned error carries the failed step's exit code.
pub fn run_sequence(opts: &SequenceOptions) -> Result<()> {
    let manifest_path = PathBuf::from(MANIFEST_PATH);

    preflight::run_preflight_checks(&manifest_path);

    if opts.dry_run {
        enable_dry_run();
        log::info!("Dry-run mode: commands will be logged, not executed");
    }

    // Entry count is informational only; the installer owns manifest
    // semantics and will re-read the file itself
    match Manifest::load_from_file(&manifest_path) {
        Ok(manifest) => log::info!(
            "Manifest {} lists {} package(s)",
            manifest.path.display(),
            manifest.len()
        ),
        Err(e) => log::warn!("Could not parse manifest for reporting: {:#}", e),
    }

    let upgrade = SelfUpgradeArgs;
    let isolated = IsolatedInstallArgs::default();
    let from_manifest = ManifestInstallArgs {
        manifest: manifest_path,
    };
    let steps: [&dyn InstallerArgs; 3] = [&upgrade, &isolated, &from_manifest];

    let notifier = WebhookNotifier::from_env();
    let mut ctx = SequencerContext::new();

    match run_steps(&mut ctx, &steps) {
        Ok(()) => {
            log::info!("Install sequence complete: {}", ctx.current_stage());
            notifier.notify_success();
            Ok(())
        }
        Err(e) => {
            log::error!(
                "Install sequence aborted at '{}': {}",
                ctx.failed_at()
                    .map(|s| s.description())
                    .unwrap_or("Not started"),
                e
            );
            notifier.notify_failure(&e.to_string());
            Err(e)
        }
    }
}

/// Execute steps in order against a stage context, fail-fast.
///
/// Each successful step advances the context by exactly one stage, so the
/// step list must match the stage chain in length. A failing step marks the
/// context failed and returns an error carrying the child's exit code
/// (signal-terminated children map to 1); later steps never execute.
pub fn run_steps(ctx: &mut SequencerContext, steps: &[&dyn InstallerArgs]) -> Result<()> {
    for step in steps {
        log::info!("Starting step: {}", step.description());
        println!("==> {}", step.description());

        let output = match run_command_safe(*step) {
            Ok(output) => output,
            Err(e) => {
                let _ = ctx.fail();
                return Err(BuildPrepError::general(format!(
                    "{}: {:#}",
                    step.description(),
                    e
                )));
            }
        };

        if !output.success {
            let code = output.exit_code.unwrap_or(1);
            let _ = ctx.fail();
            return Err(BuildPrepError::step(step.description(), code));
        }

        let stage = ctx.advance()?;
        log::info!("Stage reached: {} ({}%)", stage, stage.progress_percent());
    }

    Ok(())
}
