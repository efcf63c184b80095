//! Type-safe installer invocation contracts.
//!
//! This module provides the `InstallerArgs` trait for ensuring compile-time
//! correctness of external installer invocations. Instead of raw string
//! vectors assembled ad hoc, Rust structs implement this trait to produce
//! validated CLI arguments and environment variables.
//!
//! # Design Goals
//!
//! 1. **Compile-Time Safety**: flag mismatches (e.g., `--no-deps` vs
//!    `--nodeps`) are caught where the struct is defined, not at runtime.
//! 2. **Single Source of Truth**: the struct definition IS the contract.
//! 3. **Object Safety**: the sequencer drives steps through `&dyn
//!    InstallerArgs`, so the trait only takes `&self`.

use std::sync::atomic::{AtomicBool, Ordering};

/// Trait for typed installer arguments.
///
/// Implementors define the mapping between Rust struct fields and the
/// installer's CLI flags and environment variables.
///
/// # Contract
///
/// - `program()`: the executable to invoke (resolved via PATH).
/// - `to_cli_args()`: CLI arguments exactly as the installer expects them.
/// - `get_env_vars()`: environment variables required by the invocation.
/// - `description()`: short human-readable step name for logs and errors.
pub trait InstallerArgs {
    /// The executable to invoke (e.g., `"pip"`).
    fn program(&self) -> &'static str;

    /// Convert struct fields to CLI arguments.
    ///
    /// Returns a vector of strings exactly as they should be passed to the
    /// installer. Example: `["install", "--upgrade", "pip"]`
    fn to_cli_args(&self) -> Vec<String>;

    /// Get required environment variables.
    ///
    /// Returns key-value pairs for environment variables the invocation
    /// requires. Most steps need none.
    fn get_env_vars(&self) -> Vec<(String, String)>;

    /// Short step name used in the build log and in failure errors.
    fn description(&self) -> &'static str;
}

/// Global dry-run flag.
///
/// When set, the command runner logs what it would execute and reports a
/// synthetic success instead of spawning the installer.
static DRY_RUN: AtomicBool = AtomicBool::new(false);

/// Enable dry-run mode for the rest of the process
pub fn enable_dry_run() {
    DRY_RUN.store(true, Ordering::SeqCst);
}

/// Disable dry-run mode
pub fn disable_dry_run() {
    DRY_RUN.store(false, Ordering::SeqCst);
}

/// Returns true if dry-run mode is enabled
pub fn is_dry_run() -> bool {
    DRY_RUN.load(Ordering::SeqCst)
}
