//! buildprep library
//!
//! Core functionality for the fail-fast dependency bootstrap: the install
//! sequencer, its stage machine, typed step arguments, the sanctioned
//! command runner, and the surrounding environment checks and notification.

pub mod cli;
pub mod error;
pub mod manifest;
pub mod notify;
pub mod preflight;
pub mod process_guard;
pub mod runner;
pub mod sequencer;
pub mod stage;
pub mod step_traits;
pub mod steps;

// Re-export main types for convenience
pub use error::BuildPrepError;
pub use manifest::{Manifest, Requirement, RequirementError};
pub use notify::WebhookNotifier;
pub use process_guard::{ChildRegistry, CommandProcessGroup, ProcessGuard};
pub use runner::{run_command_safe, CommandOutput};
pub use sequencer::{run_sequence, run_steps, SequenceOptions};
pub use stage::{BuildStage, SequencerContext, StageTransitionError};
pub use step_traits::{disable_dry_run, enable_dry_run, is_dry_run, InstallerArgs};
pub use steps::pip::{
    IsolatedInstallArgs, ManifestInstallArgs, SelfUpgradeArgs, MANIFEST_PATH, PINNED_PACKAGE,
    PINNED_VERSION,
};
