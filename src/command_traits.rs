//! Type-safe external command contracts.
//!
//! Every external program jarvis-setup invokes (interpreter version query,
//! `venv`, `pip`, import checks, PATH lookups) is described by a struct that
//! implements `CommandArgs`. The runner never receives a raw argv vector.
//!
//! # Dry-Run
//!
//! A process-wide dry-run flag is set once from the CLI. Destructive commands
//! are logged and skipped while it is on; read-only commands still run so the
//! preview reflects the real environment.

use std::sync::atomic::{AtomicBool, Ordering};

static DRY_RUN: AtomicBool = AtomicBool::new(false);

/// Turn dry-run mode on for the rest of the process
pub fn enable_dry_run() {
    DRY_RUN.store(true, Ordering::SeqCst);
}

/// Returns true if destructive commands should be skipped
pub fn is_dry_run() -> bool {
    DRY_RUN.load(Ordering::SeqCst)
}

/// Trait for typed command arguments.
///
/// # Contract
///
/// - `program()`: executable to spawn (resolved through PATH by the OS).
/// - `to_cli_args()`: arguments exactly as the program expects them.
/// - `get_env_vars()`: extra environment variables for the child.
/// - `is_destructive()`: true if the command modifies the filesystem.
/// - `streams_output()`: true if the operator should see output live.
pub trait CommandArgs {
    /// Executable name or path
    fn program(&self) -> &str;

    /// Convert struct fields to CLI arguments.
    fn to_cli_args(&self) -> Vec<String>;

    /// Environment variables the command requires.
    fn get_env_vars(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Whether the command changes state on disk. Skipped in dry-run mode.
    fn is_destructive(&self) -> bool {
        false
    }

    /// Whether stdout/stderr are inherited instead of captured.
    fn streams_output(&self) -> bool {
        false
    }

    /// Full command line for logs and operator messages
    fn command_line(&self) -> String {
        let mut line = self.program().to_string();
        for arg in self.to_cli_args() {
            line.push(' ');
            if arg.contains(' ') {
                line.push('"');
                line.push_str(&arg);
                line.push('"');
            } else {
                line.push_str(&arg);
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(Vec<&'static str>);

    impl CommandArgs for Echo {
        fn program(&self) -> &str {
            "echo"
        }

        fn to_cli_args(&self) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    #[test]
    fn test_command_line_quotes_spaces() {
        let cmd = Echo(vec!["hello", "big world"]);
        assert_eq!(cmd.command_line(), "echo hello \"big world\"");
    }

    #[test]
    fn test_defaults() {
        let cmd = Echo(vec![]);
        assert!(!cmd.is_destructive());
        assert!(!cmd.streams_output());
        assert!(cmd.get_env_vars().is_empty());
    }
}
