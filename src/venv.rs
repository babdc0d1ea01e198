//! Virtual environment management
//!
//! All packages go into a venv next to the application so the system
//! interpreter is never touched.

use crate::command_runner::run_command_safe;
use crate::commands::python::{PythonCommand, VenvCreateArgs};
use crate::error::{Result, SetupError};
use std::path::{Path, PathBuf};
use tracing::info;

/// A virtual environment rooted at `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualEnv {
    root: PathBuf,
}

impl VirtualEnv {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Interpreter inside the venv (`Scripts\python.exe` or `bin/python`)
    pub fn python_path(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("Scripts").join("python.exe")
        } else {
            self.root.join("bin").join("python")
        }
    }

    /// Activation script sourced by the launchers
    pub fn activate_path(&self) -> PathBuf {
        if cfg!(windows) {
            self.root.join("Scripts").join("activate.bat")
        } else {
            self.root.join("bin").join("activate")
        }
    }

    /// Interpreter invocation for pip and import checks
    pub fn python(&self) -> PythonCommand {
        PythonCommand::from_path(&self.python_path())
    }

    /// Returns true if the venv already has an interpreter
    pub fn exists(&self) -> bool {
        self.python_path().is_file()
    }

    /// Create the venv with `base`, unless it already exists.
    ///
    /// In dry-run mode the command is logged and nothing is created.
    pub fn create(&self, base: &PythonCommand) -> Result<()> {
        if self.exists() {
            info!("Reusing virtual environment at {}", self.root.display());
            println!("♻️  Reusing existing virtual environment: {}", self.root.display());
            return Ok(());
        }

        println!("🐍 Creating virtual environment: {}", self.root.display());
        let args = VenvCreateArgs {
            python: base.clone(),
            dir: self.root.clone(),
        };
        let output = run_command_safe(&args)
            .map_err(|e| SetupError::venv(format!("could not run {}: {:#}", base, e)))?;

        if !output.success {
            let code = output
                .exit_code
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            let reason = output.stderr.trim();
            return Err(SetupError::venv(if reason.is_empty() {
                format!("{} -m venv exited with {}", base, code)
            } else {
                format!("{} -m venv exited with {}: {}", base, code, reason)
            }));
        }

        if !output.dry_run && !self.exists() {
            return Err(SetupError::venv(format!(
                "venv created but {} is missing",
                self.python_path().display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_python_path_layout() {
        let venv = VirtualEnv::new("venv");
        if cfg!(windows) {
            assert_eq!(venv.python_path(), PathBuf::from("venv\\Scripts\\python.exe"));
        } else {
            assert_eq!(venv.python_path(), PathBuf::from("venv/bin/python"));
            assert_eq!(venv.activate_path(), PathBuf::from("venv/bin/activate"));
        }
    }

    #[test]
    fn test_existing_venv_is_reused() {
        let dir = TempDir::new().unwrap();
        let venv = VirtualEnv::new(dir.path().join("venv"));
        assert!(!venv.exists());

        let python = venv.python_path();
        fs::create_dir_all(python.parent().unwrap()).unwrap();
        fs::write(&python, b"").unwrap();
        assert!(venv.exists());

        // Would fail if it tried to spawn this interpreter
        let bogus = PythonCommand::parse("this_python_does_not_exist_12345").unwrap();
        venv.create(&bogus).unwrap();
    }

    #[test]
    fn test_create_with_missing_interpreter_is_venv_error() {
        let dir = TempDir::new().unwrap();
        let venv = VirtualEnv::new(dir.path().join("venv"));
        let bogus = PythonCommand::parse("this_python_does_not_exist_12345").unwrap();
        let err = venv.create(&bogus).unwrap_err();
        assert!(matches!(err, SetupError::Venv(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_create_nonzero_exit_is_venv_error() {
        let dir = TempDir::new().unwrap();
        let venv = VirtualEnv::new(dir.path().join("venv"));
        let err = venv.create(&PythonCommand::parse("false").unwrap()).unwrap_err();
        assert!(err.to_string().contains("exited with 1"));
    }
}
