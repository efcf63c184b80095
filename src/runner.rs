//! Type-Safe Command Execution
//!
//! This module provides the ONLY sanctioned way to execute installer
//! commands. All step execution MUST go through `run_command_safe` to ensure:
//!
//! - Process group isolation (cleanup on build cancellation)
//! - Proper PID registration for the global registry
//! - Type-safe argument passing via the `InstallerArgs` trait
//! - Streaming of child stdout into the build log as it arrives
//!
//! # Architecture Rule
//!
//! `run_command_safe` is the execution gatekeeper. Using `Command::new`
//! directly for installer steps bypasses the death pact and is forbidden.

use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use crate::step_traits::{is_dry_run, InstallerArgs};
use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};
use std::thread;

/// Execute an installer step with type-safe arguments.
///
/// Spawns the step's program in a new process group, registers the child PID
/// with `ChildRegistry::global()`, streams stdout to the build log line by
/// line, and waits for completion.
///
/// In dry-run mode the command is logged and skipped with a synthetic
/// success.
///
/// # Returns
///
/// - `Ok(output)` - the child ran to completion (its exit status may still be
///   non-zero; check `output.success`)
/// - `Err` - the program could not be spawned or waited on
pub fn run_command_safe<T: InstallerArgs + ?Sized>(args: &T) -> Result<CommandOutput> {
    let program = args.program();
    let cli_args = args.to_cli_args();
    let env_vars = args.get_env_vars();

    // Log the exact command and environment for transparency
    log::info!(
        "run_command_safe: {} {:?} env={:?}",
        program,
        cli_args,
        env_vars
    );

    if is_dry_run() {
        let rendered = format!("{} {}", program, cli_args.join(" "));
        println!("[DRY RUN] Skipped: {}", rendered);
        log::info!("[DRY RUN] Skipped: {}", rendered);
        return Ok(CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(0),
            success: true,
            dry_run: true,
        });
    }

    // Build the command with process group isolation
    let mut cmd = Command::new(program);
    cmd.args(&cli_args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // Steps are non-interactive; never let the installer prompt
        .stdin(Stdio::null())
        .in_new_process_group();

    for (key, value) in &env_vars {
        cmd.env(key, value);
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to spawn {} for {}", program, args.description()))?;
    let pid = child.id();

    // Register PID for cleanup on parent exit
    {
        let registry = ChildRegistry::global();
        let mut guard = registry.lock().expect("ChildRegistry mutex poisoned");
        guard.register(pid);
    }

    // Drain stderr on a side thread so neither pipe can fill up and stall
    // the child
    let stderr_handle = child.stderr.take().map(|stderr| {
        thread::spawn(move || {
            let mut collected = String::new();
            for line in BufReader::new(stderr).lines().map_while(|line| line.ok()) {
                collected.push_str(&line);
                collected.push('\n');
            }
            collected
        })
    });

    // Stream stdout into the build log as it arrives, keeping a copy
    let mut stdout_collected = String::new();
    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines().map_while(|line| line.ok()) {
            println!("{}", line);
            stdout_collected.push_str(&line);
            stdout_collected.push('\n');
        }
    }

    let status = child
        .wait()
        .with_context(|| format!("Failed waiting for {}", args.description()))?;

    // Unregister PID after completion
    {
        let registry = ChildRegistry::global();
        let mut guard = registry.lock().expect("ChildRegistry mutex poisoned");
        guard.unregister(pid);
    }

    let stderr_collected = stderr_handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default();

    let exit_code = status.code();

    if status.success() {
        log::info!("Step {} completed successfully", args.description());
    } else {
        log::error!(
            "Step {} failed with exit code {:?}",
            args.description(),
            exit_code
        );
    }

    Ok(CommandOutput {
        stdout: stdout_collected,
        stderr: stderr_collected,
        exit_code,
        success: status.success(),
        dry_run: false,
    })
}

/// Output from an installer step execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output from the step (also streamed to the build log).
    pub stdout: String,
    /// Standard error from the step.
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    /// Whether the step exited successfully (exit code 0).
    pub success: bool,
    /// Whether execution was skipped by dry-run mode.
    pub dry_run: bool,
}

impl CommandOutput {
    /// Check that the step succeeded and return an error if not.
    pub fn ensure_success(&self, context: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            let code = self.exit_code.unwrap_or(-1);
            anyhow::bail!(
                "{} failed (exit code {}): {}",
                context,
                code,
                self.stderr.trim()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_output_success() {
        let output = CommandOutput {
            stdout: "Successfully installed".to_string(),
            stderr: String::new(),
            exit_code: Some(0),
            success: true,
            dry_run: false,
        };

        assert!(output.success);
        assert!(output.ensure_success("installer upgrade").is_ok());
    }

    #[test]
    fn test_command_output_failure() {
        let output = CommandOutput {
            stdout: String::new(),
            stderr: "No matching distribution found".to_string(),
            exit_code: Some(1),
            success: false,
            dry_run: false,
        };

        let result = output.ensure_success("manifest install");
        assert!(result.is_err());

        let msg = format!("{}", result.unwrap_err());
        assert!(msg.contains("manifest install"));
        assert!(msg.contains("No matching distribution found") || msg.contains("exit code"));
    }

    #[test]
    fn test_command_output_signal_termination() {
        let output = CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None, // Terminated by signal
            success: false,
            dry_run: false,
        };

        assert!(!output.success);
        assert!(output.exit_code.is_none());

        let msg = format!("{}", output.ensure_success("installer upgrade").unwrap_err());
        assert!(msg.contains("-1"), "signal termination reported as -1");
    }
}
