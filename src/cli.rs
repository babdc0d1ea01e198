use crate::choices::ChoicePreset;
use crate::config_file::SetupConfig;
use crate::error::{Result, SetupError};
use crate::types::AiBackend;
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// JARVIS Setup - prepare a Python environment for the JARVIS assistant
#[derive(Parser, Debug)]
#[command(name = "jarvis-setup")]
#[command(about = "Checks prerequisites, installs JARVIS package groups into a virtual environment and writes launchers")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: show what would be executed without making changes.
    ///
    /// Venv creation, pip installs and launcher writes are skipped and
    /// logged. Probes still run so the plan reflects this machine.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Load settings and preset choices from a JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Write the effective configuration, with the chosen features, to a
    /// JSON file (install and plan)
    #[arg(long, global = true)]
    pub save_config: Option<PathBuf>,

    /// Virtual environment directory [default: venv]
    #[arg(long, global = true)]
    pub venv: Option<PathBuf>,

    /// Directory containing jarvis_main.py; launchers are written here [default: .]
    #[arg(long, global = true)]
    pub app_dir: Option<PathBuf>,

    /// Base Python interpreter to use (e.g. python3.11, "py -3")
    #[arg(long, global = true)]
    pub python: Option<String>,

    /// Write the install report as JSON to this file (install only)
    #[arg(long, global = true)]
    pub report: Option<PathBuf>,

    /// Do not write launcher scripts
    #[arg(long, global = true)]
    pub no_launchers: bool,

    /// Accept defaults for every unanswered question
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(flatten)]
    pub choices: ChoiceArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Optional feature choices. Unset choices are asked interactively.
#[derive(Args, Debug, Default, Clone)]
pub struct ChoiceArgs {
    /// AI backend to install
    #[arg(long, value_enum, global = true)]
    pub ai: Option<AiBackend>,

    /// Install camera object recognition (`--vision` or `--vision=false`)
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub vision: Option<bool>,

    /// Install 3D material preview (`--3d` or `--3d=false`)
    #[arg(
        long = "3d",
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub three_d: Option<bool>,
}

impl ChoiceArgs {
    pub fn preset(&self) -> ChoicePreset {
        ChoicePreset {
            ai_backend: self.ai,
            install_vision: self.vision,
            install_3d: self.three_d,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Probe, plan, install and verify (default)
    Install,
    /// Show the installation plan without installing anything
    Plan {
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the environment probe
    Check,
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        file: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Subcommand to run; bare `jarvis-setup` installs
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Install)
    }

    /// Reject output flags the selected subcommand would ignore.
    pub fn check_flag_scope(&self) -> Result<()> {
        let command = self.command();
        if self.report.is_some() && command != Commands::Install {
            return Err(SetupError::config("--report only applies to install"));
        }
        if self.save_config.is_some() && matches!(command, Commands::Check | Commands::Validate { .. }) {
            return Err(SetupError::config("--save-config only applies to install and plan"));
        }
        Ok(())
    }

    /// Overlay flags onto a loaded configuration. Flags win.
    pub fn apply_to(&self, config: &mut SetupConfig) {
        if let Some(python) = &self.python {
            config.python = Some(python.clone());
        }
        if let Some(venv) = &self.venv {
            config.venv_dir = venv.clone();
        }
        if let Some(app_dir) = &self.app_dir {
            config.app_dir = app_dir.clone();
        }
        if self.no_launchers {
            config.launchers = false;
        }
        config.choices = self.choices.preset().or(config.choices);
    }
}
