//! Type-safe arguments for the three pip operations.
//!
//! This module provides one typed argument struct per install step:
//! - `SelfUpgradeArgs` for `pip install --upgrade pip`
//! - `IsolatedInstallArgs` for `pip install <name>==<version> --no-deps`
//! - `ManifestInstallArgs` for `pip install -r <manifest>`
//!
//! # Why This Exists
//!
//! The isolated step MUST pass `--no-deps` and the manifest step MUST NOT;
//! getting that wrong silently pulls a platform-incompatible dependency onto
//! the build image. Typed structs make the flag sets explicit and testable.

use std::path::PathBuf;

use crate::step_traits::InstallerArgs;

/// The package installer invoked by every step.
pub const PIP_PROGRAM: &str = "pip";

/// The dependency installed in isolation, pinned to an exact version.
///
/// Its declared dependency closure contains a package that does not build on
/// the hosting platform, so the closure is suppressed with `--no-deps`.
pub const PINNED_PACKAGE: &str = "discord.py";

/// Exact version of the isolated dependency.
pub const PINNED_VERSION: &str = "1.7.3";

/// Fixed relative path of the dependency manifest.
pub const MANIFEST_PATH: &str = "requirements.txt";

// ============================================================================
// Installer Self-Upgrade
// ============================================================================

/// Arguments for the installer's self-upgrade (`pip install --upgrade pip`).
///
/// The step has no inputs beyond the installer's own identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfUpgradeArgs;

impl InstallerArgs for SelfUpgradeArgs {
    fn program(&self) -> &'static str {
        PIP_PROGRAM
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "install".to_string(),
            "--upgrade".to_string(),
            "pip".to_string(),
        ]
    }

    fn get_env_vars(&self) -> Vec<(String, String)> {
        vec![]
    }

    fn description(&self) -> &'static str {
        "installer upgrade"
    }
}

// ============================================================================
// Isolated Install
// ============================================================================

/// Arguments for the isolated install of the pinned dependency.
///
/// # Field to Flag Mapping
///
/// | Rust Field | CLI form                 | Notes |
/// |------------|--------------------------|-------|
/// | `package`  | `<package>==<version>`   | exact-version specifier |
/// | `version`  | (part of the specifier)  | |
/// | n/a        | `--no-deps`              | always present |
///
/// `--no-deps` is the whole point of this step: the package's declared
/// dependencies are never resolved or installed.
#[derive(Debug, Clone)]
pub struct IsolatedInstallArgs {
    /// Package identifier (e.g., `discord.py`).
    pub package: String,
    /// Exact version to pin (e.g., `1.7.3`).
    pub version: String,
}

impl Default for IsolatedInstallArgs {
    fn default() -> Self {
        Self {
            package: PINNED_PACKAGE.to_string(),
            version: PINNED_VERSION.to_string(),
        }
    }
}

impl IsolatedInstallArgs {
    /// The exact-version specifier passed to the installer.
    pub fn specifier(&self) -> String {
        format!("{}=={}", self.package, self.version)
    }
}

impl InstallerArgs for IsolatedInstallArgs {
    fn program(&self) -> &'static str {
        PIP_PROGRAM
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "install".to_string(),
            self.specifier(),
            "--no-deps".to_string(),
        ]
    }

    fn get_env_vars(&self) -> Vec<(String, String)> {
        vec![]
    }

    fn description(&self) -> &'static str {
        "isolated dependency install"
    }
}

// ============================================================================
// Manifest Install
// ============================================================================

/// Arguments for installing the manifest (`pip install -r <path>`).
///
/// Runs in normal mode: every listed package is installed with its full
/// transitive dependency closure. `--no-deps` must never appear here.
#[derive(Debug, Clone)]
pub struct ManifestInstallArgs {
    /// Path to the dependency manifest.
    pub manifest: PathBuf,
}

impl Default for ManifestInstallArgs {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from(MANIFEST_PATH),
        }
    }
}

impl InstallerArgs for ManifestInstallArgs {
    fn program(&self) -> &'static str {
        PIP_PROGRAM
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "install".to_string(),
            "-r".to_string(),
            self.manifest.display().to_string(),
        ]
    }

    fn get_env_vars(&self) -> Vec<(String, String)> {
        vec![]
    }

    fn description(&self) -> &'static str {
        "manifest install"
    }
}
