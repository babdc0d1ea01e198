//! Configuration file handling for saving and loading setup configs.
//!
//! Every field is optional in the file; missing fields take their defaults.
//! Precedence for each setting: CLI flag, then config file, then environment
//! (interpreter only), then built-in default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::choices::ChoicePreset;
use crate::commands::python::PythonCommand;

/// Environment variable consulted for the base interpreter
pub const PYTHON_ENV_VAR: &str = "JARVIS_SETUP_PYTHON";

/// pip arguments that would install outside the virtual environment
const FORBIDDEN_PIP_ARGS: &[&str] = &["--target", "--prefix", "--user", "-t"];

/// Setup configuration that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// Base interpreter invocation (`python3`, `py -3`, `/usr/bin/python3.11`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,

    /// Virtual environment directory
    pub venv_dir: PathBuf,

    /// Directory holding the JARVIS scripts; launchers are written here
    pub app_dir: PathBuf,

    /// Write launcher scripts after installing
    pub launchers: bool,

    /// Extra arguments for every `pip install` (index URL, proxy, ...)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pip_args: Vec<String>,

    /// Pre-answered choices
    #[serde(flatten)]
    pub choices: ChoicePreset,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            python: None,
            venv_dir: PathBuf::from("venv"),
            app_dir: PathBuf::from("."),
            launchers: true,
            pip_args: Vec::new(),
            choices: ChoicePreset::default(),
        }
    }
}

impl SetupConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.venv_dir.as_os_str().is_empty() {
            anyhow::bail!("venv_dir must not be empty");
        }
        if self.app_dir.as_os_str().is_empty() {
            anyhow::bail!("app_dir must not be empty");
        }

        if let Some(python) = &self.python {
            if python.trim().is_empty() {
                anyhow::bail!("python must not be empty when set");
            }
        }

        for arg in &self.pip_args {
            // `--target=dir` and `--target dir` are both rejected
            let flag = arg.split('=').next().unwrap_or(arg);
            if FORBIDDEN_PIP_ARGS.contains(&flag) {
                anyhow::bail!(
                    "pip argument '{}' would install outside the virtual environment",
                    arg
                );
            }
        }

        Ok(())
    }

    /// Fill `python` from the environment if neither flag nor file set it
    pub fn apply_env_python(&mut self, env_value: Option<String>) {
        if self.python.is_none() {
            self.python = env_value.filter(|v| !v.trim().is_empty());
        }
    }

    /// Base interpreter to try first, if configured
    pub fn python_command(&self) -> Option<PythonCommand> {
        self.python.as_deref().and_then(PythonCommand::parse)
    }
}
