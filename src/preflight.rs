//! Pre-flight sanity checks for the build environment
//!
//! This module verifies the environment before the install sequence starts:
//! - Required runtime binaries are present on PATH
//! - The dependency manifest exists
//!
//! If any check fails, the program exits with a clear error message before
//! anything is installed.

use crate::process_guard::CommandProcessGroup;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Result of environment verification
#[derive(Debug)]
pub struct PreflightResult {
    pub missing_binaries: Vec<String>,
    pub missing_manifest: Option<PathBuf>,
}

impl PreflightResult {
    /// Returns true if all checks passed
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty() && self.missing_manifest.is_none()
    }
}

/// Required runtime binaries for the install sequence
const REQUIRED_BINARIES: &[&str] = &[
    "pip", // The package installer every step invokes
];

/// Optional binaries (log if missing but don't fail)
const OPTIONAL_BINARIES: &[&str] = &[
    "python3", // Only needed to sanity-check the runtime by hand
];

/// Check if a binary is available in PATH
fn binary_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .in_new_process_group()
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Perform all sanity checks and return the result
pub fn verify_environment(manifest: &Path) -> PreflightResult {
    let mut missing = Vec::new();

    for binary in REQUIRED_BINARIES {
        if !binary_exists(binary) {
            missing.push((*binary).to_string());
        }
    }

    for binary in OPTIONAL_BINARIES {
        if !binary_exists(binary) {
            log::debug!("Optional binary not found: {}", binary);
        }
    }

    let missing_manifest = if manifest.is_file() {
        None
    } else {
        Some(manifest.to_path_buf())
    };

    PreflightResult {
        missing_binaries: missing,
        missing_manifest,
    }
}

/// Print a clear error report to stderr and exit.
/// Called before any install step runs, so stderr is still a plain log.
pub fn print_error_and_exit(result: &PreflightResult) -> ! {
    eprintln!();
    eprintln!("✗ buildprep pre-flight check failed");
    eprintln!();

    if !result.missing_binaries.is_empty() {
        eprintln!("Missing required binaries:");
        for binary in &result.missing_binaries {
            eprintln!("  • {} (install: {})", binary, get_install_hint(binary));
        }
        eprintln!();
    }

    if let Some(path) = &result.missing_manifest {
        eprintln!("Dependency manifest not found: {}", path.display());
        eprintln!("  The manifest must sit at the repository root.");
        eprintln!();
    }

    eprintln!("Fix the above issues and re-run the build.");
    eprintln!();

    std::process::exit(1);
}

/// Map binary names to an install hint for the build image
fn get_install_hint(binary: &str) -> &'static str {
    match binary {
        "pip" => "python3-pip",
        "python3" => "python3",
        _ => "unknown",
    }
}

/// Main entry point: verify environment and exit if checks fail.
/// Call this before the first install step.
pub fn run_preflight_checks(manifest: &Path) {
    log::debug!("Running pre-flight sanity checks...");

    if should_skip_preflight() {
        log::warn!("Pre-flight checks skipped (BUILDPREP_SKIP_PREFLIGHT=1)");
        return;
    }

    let result = verify_environment(manifest);

    if !result.is_ok() {
        print_error_and_exit(&result);
    }

    log::info!("Pre-flight checks passed: installer and manifest present");
}

/// Skip preflight checks (for development/testing).
/// Set BUILDPREP_SKIP_PREFLIGHT=1 to skip.
pub fn should_skip_preflight() -> bool {
    env_flag_enabled(std::env::var("BUILDPREP_SKIP_PREFLIGHT").ok().as_deref())
}

/// True when an env-flag value means "enabled"
fn env_flag_enabled(value: Option<&str>) -> bool {
    value
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}
