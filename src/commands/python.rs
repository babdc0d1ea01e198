//! Type-safe arguments for Python interpreter invocations.
//!
//! - `VersionQueryArgs` for `python --version`
//! - `VenvCreateArgs` for `python -m venv <dir>`
//! - `PipInstallArgs` for `python -m pip install ...`
//! - `ImportCheckArgs` for `python -c "import <module>"`

use crate::command_traits::CommandArgs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// How to invoke an interpreter: a program plus fixed leading arguments.
///
/// The Windows launcher needs `py -3`; everything else is a bare program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PythonCommand {
    pub program: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefix_args: Vec<String>,
}

impl PythonCommand {
    /// Parse a whitespace-separated invocation such as `py -3`.
    ///
    /// Returns None for an empty string. Paths containing spaces must use
    /// `from_path` instead.
    pub fn parse(invocation: &str) -> Option<Self> {
        let mut parts = invocation.split_whitespace();
        let program = parts.next()?.to_string();
        Some(Self {
            program,
            prefix_args: parts.map(str::to_string).collect(),
        })
    }

    /// Invoke an interpreter by exact path (e.g. the one inside a venv)
    pub fn from_path(path: &Path) -> Self {
        Self {
            program: path.to_string_lossy().into_owned(),
            prefix_args: Vec::new(),
        }
    }

    /// Interpreter invocations tried when none is configured, in order
    pub fn candidates() -> Vec<Self> {
        let mut list = vec!["python3", "python"];
        if cfg!(windows) {
            list.push("py -3");
        }
        list.into_iter().filter_map(Self::parse).collect()
    }

    fn with_args<I, S>(&self, rest: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefix_args
            .iter()
            .cloned()
            .chain(rest.into_iter().map(Into::into))
            .collect()
    }
}

impl fmt::Display for PythonCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.prefix_args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

// ============================================================================
// Version Query
// ============================================================================

/// Type-safe arguments for `python --version`.
#[derive(Debug, Clone)]
pub struct VersionQueryArgs {
    pub python: PythonCommand,
}

impl CommandArgs for VersionQueryArgs {
    fn program(&self) -> &str {
        &self.python.program
    }

    fn to_cli_args(&self) -> Vec<String> {
        self.python.with_args(["--version"])
    }
}

// ============================================================================
// Virtual Environment Creation
// ============================================================================

/// Type-safe arguments for `python -m venv <dir>`.
#[derive(Debug, Clone)]
pub struct VenvCreateArgs {
    pub python: PythonCommand,
    pub dir: PathBuf,
}

impl CommandArgs for VenvCreateArgs {
    fn program(&self) -> &str {
        &self.python.program
    }

    fn to_cli_args(&self) -> Vec<String> {
        self.python
            .with_args(["-m".to_string(), "venv".to_string(), self.dir.to_string_lossy().into_owned()])
    }

    /// Creates a directory tree.
    fn is_destructive(&self) -> bool {
        true
    }
}

// ============================================================================
// pip install
// ============================================================================

/// Type-safe arguments for `python -m pip install`.
#[derive(Debug, Clone)]
pub struct PipInstallArgs {
    pub python: PythonCommand,
    /// Distribution names
    pub packages: Vec<String>,
    /// Pass `--upgrade`
    pub upgrade: bool,
    /// Operator-supplied extra arguments (index URL, proxy, ...)
    pub extra_args: Vec<String>,
}

impl CommandArgs for PipInstallArgs {
    fn program(&self) -> &str {
        &self.python.program
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = self.python.with_args(["-m", "pip", "install"]);
        if self.upgrade {
            args.push("--upgrade".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args.extend(self.packages.iter().cloned());
        args
    }

    fn get_env_vars(&self) -> Vec<(String, String)> {
        vec![("PIP_DISABLE_PIP_VERSION_CHECK".to_string(), "1".to_string())]
    }

    /// Writes into the virtual environment.
    fn is_destructive(&self) -> bool {
        true
    }

    /// Installs take minutes; the operator watches pip's own progress.
    fn streams_output(&self) -> bool {
        true
    }
}

// ============================================================================
// Import Check
// ============================================================================

/// Type-safe arguments for `python -c "import <module>"`.
#[derive(Debug, Clone)]
pub struct ImportCheckArgs {
    pub python: PythonCommand,
    pub module: String,
}

impl CommandArgs for ImportCheckArgs {
    fn program(&self) -> &str {
        &self.python.program
    }

    fn to_cli_args(&self) -> Vec<String> {
        self.python
            .with_args(["-c".to_string(), format!("import {}", self.module)])
    }

    /// No bytecode caches are written during verification.
    fn get_env_vars(&self) -> Vec<(String, String)> {
        vec![("PYTHONDONTWRITEBYTECODE".to_string(), "1".to_string())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_python_command() {
        let cmd = PythonCommand::parse("py -3").unwrap();
        assert_eq!(cmd.program, "py");
        assert_eq!(cmd.prefix_args, vec!["-3"]);
        assert_eq!(cmd.to_string(), "py -3");

        assert!(PythonCommand::parse("   ").is_none());
    }

    #[test]
    fn test_candidates_start_with_python3() {
        let candidates = PythonCommand::candidates();
        assert_eq!(candidates[0].program, "python3");
        assert!(candidates.len() >= 2);
    }

    #[test]
    fn test_version_query_args_keep_prefix() {
        let args = VersionQueryArgs {
            python: PythonCommand::parse("py -3").unwrap(),
        };
        assert_eq!(args.program(), "py");
        assert_eq!(args.to_cli_args(), vec!["-3", "--version"]);
        assert!(!args.is_destructive());
    }

    #[test]
    fn test_venv_create_args() {
        let args = VenvCreateArgs {
            python: PythonCommand::parse("python3").unwrap(),
            dir: PathBuf::from("venv"),
        };
        assert_eq!(args.to_cli_args(), vec!["-m", "venv", "venv"]);
        assert!(args.is_destructive());
    }

    #[test]
    fn test_pip_install_args_order() {
        let args = PipInstallArgs {
            python: PythonCommand::from_path(Path::new("/opt/venv/bin/python")),
            packages: vec!["ollama".to_string(), "duckduckgo-search".to_string()],
            upgrade: true,
            extra_args: vec!["--index-url".to_string(), "https://mirror.example/simple".to_string()],
        };
        assert_eq!(args.program(), "/opt/venv/bin/python");
        assert_eq!(
            args.to_cli_args(),
            vec![
                "-m",
                "pip",
                "install",
                "--upgrade",
                "--index-url",
                "https://mirror.example/simple",
                "ollama",
                "duckduckgo-search",
            ]
        );
        assert!(args.is_destructive());
        assert!(args.streams_output());
    }

    #[test]
    fn test_import_check_args() {
        let args = ImportCheckArgs {
            python: PythonCommand::parse("python").unwrap(),
            module: "cv2".to_string(),
        };
        assert_eq!(args.to_cli_args(), vec!["-c", "import cv2"]);
        assert_eq!(args.command_line(), "python -c \"import cv2\"");
        assert!(!args.is_destructive());
    }
}
