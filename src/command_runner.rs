//! Guarded external command execution
//!
//! `run_command_safe` is the single place jarvis-setup spawns processes:
//!
//! - Process group isolation and PID registration for interrupt cleanup
//! - Exact argv and environment logged before spawning
//! - Dry-run honoured for destructive commands

use crate::command_traits::{is_dry_run, CommandArgs};
use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use anyhow::{Context, Result};
use std::process::{Command, Stdio};
use tracing::{info, warn};

/// Execute a typed command and wait for it to finish.
///
/// # Returns
///
/// - `Ok(output)` - the process ran; check `output.success` for its exit status
/// - `Err` - the process could not be spawned or waited on (program missing,
///   permission denied)
///
/// A non-zero exit is NOT an error at this layer: callers decide whether a
/// failure is fatal (venv creation) or recorded (package groups).
pub fn run_command_safe<T: CommandArgs + ?Sized>(args: &T) -> Result<CommandOutput> {
    let program = args.program();
    let cli_args = args.to_cli_args();
    let env_vars = args.get_env_vars();

    if args.is_destructive() && is_dry_run() {
        info!("[dry-run] skipping: {}", args.command_line());
        return Ok(CommandOutput::skipped());
    }

    info!("run_command_safe: {} args={:?} env={:?}", program, cli_args, env_vars);

    let (out, err) = if args.streams_output() {
        (Stdio::inherit(), Stdio::inherit())
    } else {
        (Stdio::piped(), Stdio::piped())
    };

    let mut cmd = Command::new(program);
    cmd.args(&cli_args)
        .envs(env_vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(out)
        .stderr(err)
        .in_new_process_group();

    let child = cmd
        .spawn()
        .with_context(|| format!("Failed to spawn: {}", args.command_line()))?;
    let pid = child.id();

    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.register(pid);
    }

    let waited = child
        .wait_with_output()
        .with_context(|| format!("Failed waiting for: {}", program));

    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.unregister(pid);
    }

    let output = waited?;
    let exit_code = output.status.code();
    let success = output.status.success();

    if success {
        info!("{} exited successfully", program);
    } else {
        warn!("{} failed with exit code {}", program, exit_code.unwrap_or(-1));
    }

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code,
        success,
        dry_run: false,
    })
}

/// Output from a command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output (empty when streamed)
    pub stdout: String,
    /// Standard error (empty when streamed)
    pub stderr: String,
    /// Exit code (None if terminated by signal)
    pub exit_code: Option<i32>,
    /// Whether the command exited successfully (exit code 0)
    pub success: bool,
    /// Whether the command was skipped by dry-run
    pub dry_run: bool,
}

impl CommandOutput {
    /// Output recorded for a destructive command skipped in dry-run mode
    pub fn skipped() -> Self {
        Self {
            exit_code: Some(0),
            success: true,
            dry_run: true,
            ..Self::default()
        }
    }

    /// stdout followed by stderr. Some interpreters print their version on stderr.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// Check if the command succeeded and return an error if not.
    pub fn ensure_success(&self, context: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            let code = self.exit_code.unwrap_or(-1);
            let stderr = self.stderr.trim();
            // Streamed commands already showed their stderr to the operator
            if stderr.is_empty() {
                anyhow::bail!("{} failed (exit code {})", context, code)
            }
            anyhow::bail!("{} failed (exit code {}): {}", context, code, stderr)
        }
    }
}
