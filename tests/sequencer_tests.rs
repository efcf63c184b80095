//! Integration tests for the install sequencer
//!
//! These tests drive `run_steps` with real child processes (bash stubs that
//! append markers to a log file), verifying:
//! - strict ordering of steps
//! - fail-fast: after step k fails, steps k+1.. never execute
//! - exit-code propagation from the failed step

use std::fs;
use std::path::{Path, PathBuf};

use buildprep::error::BuildPrepError;
use buildprep::sequencer::run_steps;
use buildprep::stage::{BuildStage, SequencerContext};
use buildprep::step_traits::InstallerArgs;

/// A stub step that appends a marker to a log file and exits with a fixed
/// code, standing in for an installer invocation.
struct StubStep {
    desc: &'static str,
    script: String,
}

impl StubStep {
    fn marker(desc: &'static str, log: &Path, tag: &str, exit: i32) -> Self {
        Self {
            desc,
            script: format!("echo {} >> '{}'; exit {}", tag, log.display(), exit),
        }
    }
}

impl InstallerArgs for StubStep {
    fn program(&self) -> &'static str {
        "bash"
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["-c".to_string(), self.script.clone()]
    }

    fn get_env_vars(&self) -> Vec<(String, String)> {
        vec![]
    }

    fn description(&self) -> &'static str {
        self.desc
    }
}

fn marker_log(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("markers.log")
}

fn markers(log: &Path) -> Vec<String> {
    match fs::read_to_string(log) {
        Ok(content) => content.split_whitespace().map(str::to_string).collect(),
        Err(_) => vec![],
    }
}

#[test]
fn test_all_steps_succeed_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = marker_log(&dir);

    let one = StubStep::marker("installer upgrade", &log, "one", 0);
    let two = StubStep::marker("isolated dependency install", &log, "two", 0);
    let three = StubStep::marker("manifest install", &log, "three", 0);
    let steps: [&dyn InstallerArgs; 3] = [&one, &two, &three];

    let mut ctx = SequencerContext::new();
    run_steps(&mut ctx, &steps).expect("sequence should succeed");

    assert_eq!(markers(&log), vec!["one", "two", "three"]);
    assert!(ctx.is_complete());
    assert_eq!(ctx.current_stage(), BuildStage::ManifestInstalled);
    assert_eq!(ctx.stage_history().len(), 3);
}

#[test]
fn test_failure_at_step_two_skips_step_three() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = marker_log(&dir);

    let one = StubStep::marker("installer upgrade", &log, "one", 0);
    let two = StubStep::marker("isolated dependency install", &log, "two", 7);
    let three = StubStep::marker("manifest install", &log, "three", 0);
    let steps: [&dyn InstallerArgs; 3] = [&one, &two, &three];

    let mut ctx = SequencerContext::new();
    let err = run_steps(&mut ctx, &steps).expect_err("sequence should abort");

    // Step three never ran
    assert_eq!(markers(&log), vec!["one", "two"]);

    // The failed step's exit code is propagated
    match &err {
        BuildPrepError::Step { step, code } => {
            assert_eq!(step, "isolated dependency install");
            assert_eq!(*code, 7);
        }
        other => panic!("Expected Step error, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 7);

    // Failure recorded against the stage the sequence had reached
    assert!(ctx.is_failed());
    assert_eq!(ctx.failed_at(), Some(BuildStage::UpgradedInstaller));
}

#[test]
fn test_failure_at_step_one_skips_everything_else() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = marker_log(&dir);

    let one = StubStep::marker("installer upgrade", &log, "one", 2);
    let two = StubStep::marker("isolated dependency install", &log, "two", 0);
    let three = StubStep::marker("manifest install", &log, "three", 0);
    let steps: [&dyn InstallerArgs; 3] = [&one, &two, &three];

    let mut ctx = SequencerContext::new();
    let err = run_steps(&mut ctx, &steps).expect_err("sequence should abort");

    assert_eq!(markers(&log), vec!["one"]);
    assert_eq!(err.exit_code(), 2);
    assert_eq!(ctx.failed_at(), Some(BuildStage::NotStarted));
}

#[test]
fn test_signal_terminated_step_maps_to_exit_code_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = marker_log(&dir);

    let one = StubStep::marker("installer upgrade", &log, "one", 0);
    let killed = StubStep {
        desc: "isolated dependency install",
        script: "kill -KILL $$".to_string(),
    };
    let three = StubStep::marker("manifest install", &log, "three", 0);
    let steps: [&dyn InstallerArgs; 3] = [&one, &killed, &three];

    let mut ctx = SequencerContext::new();
    let err = run_steps(&mut ctx, &steps).expect_err("sequence should abort");

    // No exit code from a signal-terminated child: falls back to 1
    assert_eq!(err.exit_code(), 1);
    assert_eq!(markers(&log), vec!["one"]);
    assert!(ctx.is_failed());
}

#[test]
fn test_missing_program_aborts_without_running_later_steps() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log = marker_log(&dir);

    struct MissingProgram;
    impl InstallerArgs for MissingProgram {
        fn program(&self) -> &'static str {
            "buildprep-test-program-that-does-not-exist"
        }
        fn to_cli_args(&self) -> Vec<String> {
            vec![]
        }
        fn get_env_vars(&self) -> Vec<(String, String)> {
            vec![]
        }
        fn description(&self) -> &'static str {
            "installer upgrade"
        }
    }

    let missing = MissingProgram;
    let two = StubStep::marker("isolated dependency install", &log, "two", 0);
    let steps: [&dyn InstallerArgs; 2] = [&missing, &two];

    let mut ctx = SequencerContext::new();
    let err = run_steps(&mut ctx, &steps).expect_err("spawn failure should abort");

    assert!(markers(&log).is_empty(), "later steps must not run");
    assert_eq!(err.exit_code(), 1);
    assert!(ctx.is_failed());
}
