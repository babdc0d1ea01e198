//! Pre-flight environment probes
//!
//! Collected once before planning and never mutated afterwards:
//! - Python interpreter presence and version
//! - C++ toolchain presence (needed by packages without prebuilt wheels)
//! - Ollama runtime presence (needed by the Ollama AI backend at runtime)
//!
//! Probes only read the environment, so they run even in dry-run mode.

use crate::command_runner::run_command_safe;
use crate::commands::python::{PythonCommand, VersionQueryArgs};
use crate::commands::system::LocateBinaryArgs;
use crate::logic::planner::PlanError;
use crate::types::PythonVersion;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Compilers accepted as a C++ toolchain, in lookup order
const TOOLCHAIN_BINARIES: &[&str] = &["cl", "c++", "g++", "clang++"];

/// Binary that serves models for the Ollama backend
const OLLAMA_BINARY: &str = "ollama";

/// Result of environment verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentProbe {
    pub python_found: bool,
    pub python_version: PythonVersion,
    pub toolchain_found: bool,
    /// Interpreter invocation that answered the version query
    pub python_command: Option<PythonCommand>,
    /// Compiler binary that satisfied the toolchain probe
    pub toolchain: Option<String>,
    pub ollama_found: bool,
}

impl EnvironmentProbe {
    /// A probe with an interpreter reachable as `python3`.
    ///
    /// Used by callers that already know the environment, such as tests.
    pub fn with_python(version: PythonVersion, toolchain_found: bool) -> Self {
        Self {
            python_found: true,
            python_version: version,
            toolchain_found,
            python_command: PythonCommand::parse("python3"),
            toolchain: toolchain_found.then(|| "c++".to_string()),
            ollama_found: false,
        }
    }

    /// Probe the running system.
    ///
    /// A configured interpreter is the only one probed; the default
    /// candidates are tried only when none is configured.
    pub fn detect(preferred: Option<&PythonCommand>) -> Self {
        let python = detect_python(&interpreter_candidates(preferred));
        let toolchain = TOOLCHAIN_BINARIES
            .iter()
            .find(|bin| binary_exists(bin))
            .map(|bin| bin.to_string());
        let ollama_found = binary_exists(OLLAMA_BINARY);

        let probe = match python {
            Some((command, version)) => Self {
                python_found: true,
                python_version: version,
                toolchain_found: toolchain.is_some(),
                python_command: Some(command),
                toolchain,
                ollama_found,
            },
            None => Self {
                python_found: false,
                python_version: PythonVersion::default(),
                toolchain_found: toolchain.is_some(),
                python_command: None,
                toolchain,
                ollama_found,
            },
        };

        info!("Environment probe: {}", probe);
        probe
    }
}

impl fmt::Display for EnvironmentProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.python_command, self.python_found) {
            (Some(cmd), true) => write!(f, "Python {} ({})", self.python_version, cmd)?,
            _ => write!(f, "Python not found")?,
        }
        match &self.toolchain {
            Some(bin) => write!(f, ", C++ toolchain: {}", bin)?,
            None if self.toolchain_found => write!(f, ", C++ toolchain: yes")?,
            None => write!(f, ", C++ toolchain: none")?,
        }
        write!(f, ", Ollama: {}", if self.ollama_found { "yes" } else { "no" })
    }
}

/// Check if a binary is available in PATH
pub fn binary_exists(name: &str) -> bool {
    run_command_safe(&LocateBinaryArgs::new(name))
        .map(|output| output.success)
        .unwrap_or(false)
}

/// Interpreters to query. An operator's choice is never swapped for another.
fn interpreter_candidates(preferred: Option<&PythonCommand>) -> Vec<PythonCommand> {
    match preferred {
        Some(command) => vec![command.clone()],
        None => PythonCommand::candidates(),
    }
}

/// Query each candidate's version.
///
/// Returns the first candidate with a supported version, otherwise the first
/// one that answered at all so the planner can report it as too old.
fn detect_python(candidates: &[PythonCommand]) -> Option<(PythonCommand, PythonVersion)> {
    let mut first_found: Option<(PythonCommand, PythonVersion)> = None;

    for candidate in candidates {
        let args = VersionQueryArgs { python: candidate.clone() };
        let version = match run_command_safe(&args) {
            Ok(output) if output.success => PythonVersion::parse_version_output(&output.combined()),
            Ok(_) => None,
            Err(e) => {
                debug!("Interpreter candidate {} unavailable: {:#}", candidate, e);
                None
            }
        };

        let Some(version) = version else { continue };
        debug!("Interpreter candidate {} reports {}", candidate, version);

        if version.is_supported() {
            return Some((candidate.clone(), version));
        }
        if first_found.is_none() {
            first_found = Some((candidate.clone(), version));
        }
    }

    first_found
}

/// Print operator guidance for a fatal prerequisite failure to stderr.
pub fn print_prerequisite_error(err: &PlanError) {
    eprintln!();
    eprintln!("╔══════════════════════════════════════════════════════════════════╗");
    eprintln!("║              JARVIS Setup - Pre-flight Check Failed              ║");
    eprintln!("╚══════════════════════════════════════════════════════════════════╝");
    eprintln!();
    eprintln!("❌ ERROR: {}", err);
    eprintln!();
    match err {
        PlanError::PythonNotFound => {
            eprintln!("   No Python interpreter answered `--version`.");
            eprintln!("   Install Python {} or newer and make sure it is on PATH,", PythonVersion::MINIMUM);
            eprintln!("   or point the installer at it with --python <command>.");
        }
        PlanError::InvalidVersion { found } => {
            eprintln!("   Found Python {}, the assistant needs {} or newer.", found, PythonVersion::MINIMUM);
            eprintln!("   Install a newer interpreter and run setup again,");
            eprintln!("   or select one explicitly with --python <command>.");
        }
    }
    eprintln!();
}

/// Print the toolchain warning shown before installation proceeds.
pub fn print_toolchain_warning(native_packages: &[&str]) {
    eprintln!();
    eprintln!("⚠️  WARNING: No C++ toolchain found (looked for {}).", TOOLCHAIN_BINARIES.join(", "));
    if native_packages.is_empty() {
        eprintln!("   Packages without prebuilt wheels may fail to install.");
    } else {
        eprintln!("   These packages may need to compile native code and fail:");
        for pkg in native_packages {
            eprintln!("     • {}", pkg);
        }
    }
    if cfg!(windows) {
        eprintln!("   Install \"Desktop development with C++\" from the Visual Studio Build Tools.");
    } else {
        eprintln!("   Install your distribution's C/C++ compiler package (e.g. build-essential).");
    }
    eprintln!();
}
