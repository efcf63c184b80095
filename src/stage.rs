//! Build Stage State Machine
//!
//! This module provides an authoritative, Rust-side source of truth for the
//! install sequence's progress. It enforces valid state transitions and makes
//! it impossible to skip steps programmatically.
//!
//! # Design Principles
//!
//! - **Single Source of Truth**: the `SequencerContext` owns the current stage
//! - **Validated Transitions**: only forward transitions to the next stage are allowed
//! - **No Global State**: state is owned by `SequencerContext`, not global/static
//! - **Fail Fast**: invalid transitions return errors immediately
//!
//! # Stage Flow
//!
//! ```text
//! NotStarted
//!     ↓
//! UpgradedInstaller
//!     ↓
//! IsolatedDepInstalled
//!     ↓
//! ManifestInstalled
//!
//! (Any non-terminal stage can transition to Failed)
//! ```

use std::fmt;
use thiserror::Error;

/// Stages of the install sequence, in order.
///
/// Each stage records that one external install operation has completed.
/// Stages are ordered and can only progress forward (except for failure
/// transitions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BuildStage {
    /// Nothing has run yet
    NotStarted = 0,

    /// Step 1 done: the package installer upgraded itself
    UpgradedInstaller = 1,

    /// Step 2 done: the pinned dependency installed without its own
    /// dependency closure
    IsolatedDepInstalled = 2,

    /// Step 3 done: every manifest entry installed with full resolution
    /// (terminal success state)
    ManifestInstalled = 3,

    /// The sequence aborted (terminal state).
    /// The context records the stage at which failure occurred.
    Failed = 255,
}

impl BuildStage {
    /// Returns the numeric order of this stage (0-3, 255 for Failed)
    #[inline]
    pub const fn order(self) -> u8 {
        self as u8
    }

    /// Returns true if this is a terminal state (ManifestInstalled or Failed)
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ManifestInstalled | Self::Failed)
    }

    /// Returns the next stage in the sequence, or None if at a terminal state
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::UpgradedInstaller),
            Self::UpgradedInstaller => Some(Self::IsolatedDepInstalled),
            Self::IsolatedDepInstalled => Some(Self::ManifestInstalled),
            Self::ManifestInstalled | Self::Failed => None,
        }
    }

    /// Returns the previous stage in the sequence, or None at NotStarted or Failed
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::UpgradedInstaller => Some(Self::NotStarted),
            Self::IsolatedDepInstalled => Some(Self::UpgradedInstaller),
            Self::ManifestInstalled => Some(Self::IsolatedDepInstalled),
            Self::NotStarted | Self::Failed => None,
        }
    }

    /// Returns a human-readable description of this stage
    pub const fn description(self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::UpgradedInstaller => "Installer upgraded",
            Self::IsolatedDepInstalled => "Isolated dependency installed",
            Self::ManifestInstalled => "All dependencies installed",
            Self::Failed => "Bootstrap failed",
        }
    }

    /// Returns the approximate progress percentage for this stage
    pub const fn progress_percent(self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::UpgradedInstaller => 33,
            Self::IsolatedDepInstalled => 66,
            Self::ManifestInstalled => 100,
            Self::Failed => 0, // Progress is meaningless for failed state
        }
    }

    /// Returns all stages in order (excluding Failed)
    pub const fn all_stages() -> &'static [Self] {
        &[
            Self::NotStarted,
            Self::UpgradedInstaller,
            Self::IsolatedDepInstalled,
            Self::ManifestInstalled,
        ]
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur during stage transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageTransitionError {
    /// Attempted to skip one or more stages
    #[error("Cannot skip from {from} to {to} (must transition through intermediate stages)")]
    SkippedStage { from: BuildStage, to: BuildStage },

    /// Attempted to go backwards (not allowed)
    #[error("Cannot go backwards from {from} to {to} (the sequence is forward-only)")]
    BackwardTransition { from: BuildStage, to: BuildStage },

    /// Attempted to transition from a terminal state
    #[error("Cannot transition from terminal state {from}")]
    FromTerminalState { from: BuildStage },

    /// Attempted to transition to the same state
    #[error("Already at stage {stage}")]
    AlreadyAtStage { stage: BuildStage },
}

/// Context for tracking sequence state.
///
/// This struct owns the current stage and provides validated transition
/// methods. It ensures that stages cannot be skipped and that transitions
/// only move forward (except for failure).
///
/// # Example
///
/// ```
/// use buildprep::stage::{BuildStage, SequencerContext};
///
/// let mut ctx = SequencerContext::new();
/// assert_eq!(ctx.current_stage(), BuildStage::NotStarted);
///
/// // Advance to next stage
/// ctx.advance().unwrap();
/// assert_eq!(ctx.current_stage(), BuildStage::UpgradedInstaller);
///
/// // Cannot skip stages
/// assert!(ctx.transition_to(BuildStage::ManifestInstalled).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct SequencerContext {
    /// Current stage
    current: BuildStage,

    /// Stage at which failure occurred (if any)
    failed_at: Option<BuildStage>,

    /// History of completed stages with timestamps (stage, unix timestamp).
    /// Allows debugging and progress reporting without global state.
    stage_history: Vec<(BuildStage, u64)>,
}

impl Default for SequencerContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SequencerContext {
    /// Create a new context in the NotStarted state
    pub fn new() -> Self {
        Self {
            current: BuildStage::NotStarted,
            failed_at: None,
            stage_history: Vec::with_capacity(BuildStage::all_stages().len()),
        }
    }

    /// Returns the current stage
    #[inline]
    pub fn current_stage(&self) -> BuildStage {
        self.current
    }

    /// Returns the stage at which failure occurred, if any
    #[inline]
    pub fn failed_at(&self) -> Option<BuildStage> {
        self.failed_at
    }

    /// Returns true if the sequence has completed successfully
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.current == BuildStage::ManifestInstalled
    }

    /// Returns true if the sequence has failed
    #[inline]
    pub fn is_failed(&self) -> bool {
        self.current == BuildStage::Failed
    }

    /// Returns true if the sequence is in progress (not terminal)
    #[inline]
    pub fn is_in_progress(&self) -> bool {
        !self.current.is_terminal() && self.current != BuildStage::NotStarted
    }

    /// Returns the current progress percentage (0-100)
    #[inline]
    pub fn progress_percent(&self) -> u8 {
        self.current.progress_percent()
    }

    /// Returns the stage history as a slice of (stage, timestamp) pairs
    pub fn stage_history(&self) -> &[(BuildStage, u64)] {
        &self.stage_history
    }

    /// Advance to the next stage in sequence.
    ///
    /// # Errors
    ///
    /// - `FromTerminalState` if already at ManifestInstalled or Failed
    pub fn advance(&mut self) -> Result<BuildStage, StageTransitionError> {
        if self.current.is_terminal() {
            return Err(StageTransitionError::FromTerminalState { from: self.current });
        }

        // SAFETY: next() only returns None for terminal states, checked above
        let next_stage = self
            .current
            .next()
            .expect("INTERNAL ERROR: non-terminal stage returned None from next()");

        self.record_stage_transition(next_stage);
        self.current = next_stage;

        Ok(next_stage)
    }

    /// Transition to a specific stage (must be the next stage in sequence).
    ///
    /// This is stricter than `advance()` - it validates that you're moving to
    /// the expected stage, preventing logic errors.
    ///
    /// # Errors
    ///
    /// - `AlreadyAtStage` if target is the current stage
    /// - `BackwardTransition` if target is before current
    /// - `SkippedStage` if target is not the immediate next stage
    /// - `FromTerminalState` if current is a terminal state
    pub fn transition_to(
        &mut self,
        target: BuildStage,
    ) -> Result<BuildStage, StageTransitionError> {
        if self.current.is_terminal() {
            return Err(StageTransitionError::FromTerminalState { from: self.current });
        }

        if target == self.current {
            return Err(StageTransitionError::AlreadyAtStage { stage: target });
        }

        // Failed is reached via fail(), never via transition_to
        if target == BuildStage::Failed {
            return Err(StageTransitionError::SkippedStage {
                from: self.current,
                to: target,
            });
        }

        if target.order() < self.current.order() {
            return Err(StageTransitionError::BackwardTransition {
                from: self.current,
                to: target,
            });
        }

        if self.current.next() != Some(target) {
            return Err(StageTransitionError::SkippedStage {
                from: self.current,
                to: target,
            });
        }

        self.record_stage_transition(target);
        self.current = target;

        Ok(target)
    }

    /// Mark the sequence as failed.
    ///
    /// This can be called from any non-terminal state and records which stage
    /// the failure occurred at.
    ///
    /// # Errors
    ///
    /// - `FromTerminalState` if already at ManifestInstalled or Failed
    pub fn fail(&mut self) -> Result<(), StageTransitionError> {
        if self.current.is_terminal() {
            return Err(StageTransitionError::FromTerminalState { from: self.current });
        }

        self.failed_at = Some(self.current);
        self.record_stage_transition(BuildStage::Failed);
        self.current = BuildStage::Failed;

        Ok(())
    }

    /// Record a stage transition in the history
    fn record_stage_transition(&mut self, stage: BuildStage) {
        // Seconds since UNIX_EPOCH is enough resolution for a build log
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        self.stage_history.push((stage, timestamp));
    }

    /// Reset the context to NotStarted state, clearing history
    pub fn reset(&mut self) {
        self.current = BuildStage::NotStarted;
        self.failed_at = None;
        self.stage_history.clear();
    }
}

// Convert StageTransitionError to the main BuildPrepError type
impl From<StageTransitionError> for crate::error::BuildPrepError {
    fn from(err: StageTransitionError) -> Self {
        crate::error::BuildPrepError::StageTransition(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // BuildStage Tests
    // =========================================================================

    #[test]
    fn test_stage_order_is_sequential() {
        let stages = BuildStage::all_stages();
        for (i, stage) in stages.iter().enumerate() {
            assert_eq!(
                stage.order() as usize,
                i,
                "Stage {:?} should have order {}",
                stage,
                i
            );
        }
    }

    #[test]
    fn test_stage_next_forms_chain() {
        let mut current = BuildStage::NotStarted;
        let mut count = 0;

        while let Some(next) = current.next() {
            current = next;
            count += 1;
            assert!(count < 10, "Infinite loop detected in stage chain");
        }

        assert_eq!(current, BuildStage::ManifestInstalled);
        assert_eq!(count, 3); // NotStarted -> ManifestInstalled is 3 transitions
    }

    #[test]
    fn test_stage_previous_forms_reverse_chain() {
        let mut current = BuildStage::ManifestInstalled;
        let mut count = 0;

        while let Some(prev) = current.previous() {
            current = prev;
            count += 1;
            assert!(count < 10, "Infinite loop detected in stage chain");
        }

        assert_eq!(current, BuildStage::NotStarted);
        assert_eq!(count, 3);
    }

    #[test]
    fn test_terminal_states() {
        assert!(BuildStage::ManifestInstalled.is_terminal());
        assert!(BuildStage::Failed.is_terminal());
        assert!(!BuildStage::NotStarted.is_terminal());
        assert!(!BuildStage::UpgradedInstaller.is_terminal());
        assert!(!BuildStage::IsolatedDepInstalled.is_terminal());
    }

    #[test]
    fn test_progress_percent_increases() {
        let stages = BuildStage::all_stages();
        let mut last_progress = 0u8;

        for stage in stages {
            let progress = stage.progress_percent();
            assert!(
                progress >= last_progress,
                "Progress should not decrease: {:?} has {}% after {}%",
                stage,
                progress,
                last_progress
            );
            last_progress = progress;
        }

        assert_eq!(BuildStage::ManifestInstalled.progress_percent(), 100);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(BuildStage::NotStarted.to_string(), "Not started");
        assert_eq!(
            BuildStage::IsolatedDepInstalled.to_string(),
            "Isolated dependency installed"
        );
        assert_eq!(
            BuildStage::ManifestInstalled.to_string(),
            "All dependencies installed"
        );
    }

    // =========================================================================
    // SequencerContext Tests
    // =========================================================================

    #[test]
    fn test_context_starts_at_not_started() {
        let ctx = SequencerContext::new();
        assert_eq!(ctx.current_stage(), BuildStage::NotStarted);
        assert!(!ctx.is_in_progress());
        assert!(!ctx.is_complete());
        assert!(!ctx.is_failed());
    }

    #[test]
    fn test_advance_through_all_stages() {
        let mut ctx = SequencerContext::new();

        let mut count = 0;
        while ctx.advance().is_ok() {
            count += 1;
            assert!(count < 10, "Infinite loop detected");
        }

        assert_eq!(ctx.current_stage(), BuildStage::ManifestInstalled);
        assert!(ctx.is_complete());
        assert_eq!(count, 3);
    }

    #[test]
    fn test_cannot_advance_from_complete() {
        let mut ctx = SequencerContext::new();

        while ctx.current_stage() != BuildStage::ManifestInstalled {
            ctx.advance().expect("Should advance");
        }

        let err = ctx.advance().unwrap_err();
        assert!(matches!(
            err,
            StageTransitionError::FromTerminalState { .. }
        ));
    }

    #[test]
    fn test_cannot_advance_from_failed() {
        let mut ctx = SequencerContext::new();
        ctx.advance().expect("Should advance to UpgradedInstaller");
        ctx.fail().expect("Should fail");

        let err = ctx.advance().unwrap_err();
        assert!(matches!(
            err,
            StageTransitionError::FromTerminalState { .. }
        ));
    }

    #[test]
    fn test_cannot_skip_stages() {
        let mut ctx = SequencerContext::new();

        // Try to skip from NotStarted straight to the end
        let err = ctx
            .transition_to(BuildStage::ManifestInstalled)
            .unwrap_err();
        assert!(matches!(err, StageTransitionError::SkippedStage { .. }));

        // Advance normally
        ctx.advance().expect("Should advance");
        assert_eq!(ctx.current_stage(), BuildStage::UpgradedInstaller);

        // Still cannot skip
        let err = ctx
            .transition_to(BuildStage::ManifestInstalled)
            .unwrap_err();
        assert!(matches!(err, StageTransitionError::SkippedStage { .. }));
    }

    #[test]
    fn test_cannot_go_backwards() {
        let mut ctx = SequencerContext::new();

        ctx.advance().expect("UpgradedInstaller");
        ctx.advance().expect("IsolatedDepInstalled");

        let err = ctx.transition_to(BuildStage::UpgradedInstaller).unwrap_err();
        assert!(matches!(
            err,
            StageTransitionError::BackwardTransition { .. }
        ));
    }

    #[test]
    fn test_cannot_transition_to_same_stage() {
        let mut ctx = SequencerContext::new();
        ctx.advance().expect("UpgradedInstaller");

        let err = ctx.transition_to(BuildStage::UpgradedInstaller).unwrap_err();
        assert!(matches!(err, StageTransitionError::AlreadyAtStage { .. }));
    }

    #[test]
    fn test_cannot_transition_to_failed_directly() {
        let mut ctx = SequencerContext::new();

        let err = ctx.transition_to(BuildStage::Failed).unwrap_err();
        assert!(matches!(err, StageTransitionError::SkippedStage { .. }));
    }

    #[test]
    fn test_fail_records_failed_at_stage() {
        let mut ctx = SequencerContext::new();

        ctx.advance().expect("UpgradedInstaller");
        ctx.advance().expect("IsolatedDepInstalled");

        ctx.fail().expect("Should fail");

        assert!(ctx.is_failed());
        assert_eq!(ctx.failed_at(), Some(BuildStage::IsolatedDepInstalled));
    }

    #[test]
    fn test_cannot_fail_from_terminal_state() {
        let mut ctx = SequencerContext::new();

        while ctx.current_stage() != BuildStage::ManifestInstalled {
            ctx.advance().expect("Should advance");
        }

        let err = ctx.fail().unwrap_err();
        assert!(matches!(
            err,
            StageTransitionError::FromTerminalState { .. }
        ));
    }

    #[test]
    fn test_stage_history_is_recorded() {
        let mut ctx = SequencerContext::new();

        assert!(ctx.stage_history().is_empty());

        ctx.advance().expect("UpgradedInstaller");
        assert_eq!(ctx.stage_history().len(), 1);
        assert_eq!(ctx.stage_history()[0].0, BuildStage::UpgradedInstaller);

        ctx.advance().expect("IsolatedDepInstalled");
        assert_eq!(ctx.stage_history().len(), 2);
        assert_eq!(ctx.stage_history()[1].0, BuildStage::IsolatedDepInstalled);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut ctx = SequencerContext::new();

        ctx.advance().expect("UpgradedInstaller");
        ctx.fail().expect("Should fail");
        ctx.reset();

        assert_eq!(ctx.current_stage(), BuildStage::NotStarted);
        assert!(ctx.stage_history().is_empty());
        assert!(ctx.failed_at().is_none());
    }

    #[test]
    fn test_transition_to_validates_exact_next_stage() {
        let mut ctx = SequencerContext::new();

        // Valid: NotStarted -> UpgradedInstaller
        ctx.transition_to(BuildStage::UpgradedInstaller)
            .expect("Should transition");

        // Invalid: UpgradedInstaller -> ManifestInstalled (skips a stage)
        let err = ctx
            .transition_to(BuildStage::ManifestInstalled)
            .unwrap_err();
        assert!(matches!(err, StageTransitionError::SkippedStage { .. }));
    }

    // =========================================================================
    // Error Display Tests
    // =========================================================================

    #[test]
    fn test_error_display() {
        let err = StageTransitionError::SkippedStage {
            from: BuildStage::NotStarted,
            to: BuildStage::ManifestInstalled,
        };
        let msg = err.to_string();
        assert!(msg.contains("Cannot skip"));
        assert!(msg.contains("Not started"));
        assert!(msg.contains("All dependencies installed"));
    }

    #[test]
    fn test_backward_error_display() {
        let err = StageTransitionError::BackwardTransition {
            from: BuildStage::IsolatedDepInstalled,
            to: BuildStage::UpgradedInstaller,
        };
        let msg = err.to_string();
        assert!(msg.contains("Cannot go backwards"));
    }
}
