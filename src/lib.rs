//! JARVIS Setup Library
//!
//! Plans, installs and verifies the Python package groups the JARVIS desktop
//! assistant needs, inside a dedicated virtual environment.

pub mod choices;
pub mod cli;
pub mod command_runner;
pub mod command_traits;
pub mod commands;
pub mod config_file;
pub mod error;
pub mod installer;
pub mod launcher;
pub mod logic;
pub mod package_manager;
pub mod probe;
pub mod process_guard;
pub mod profiles;
pub mod report;
pub mod types;
pub mod venv;

// Re-export main types for convenience
pub use choices::{collect_choices, ChoicePreset, Chooser, DefaultChooser, DialoguerChooser, ScriptedChooser, UserChoices};
pub use command_runner::{run_command_safe, CommandOutput};
pub use command_traits::{enable_dry_run, is_dry_run, CommandArgs};
pub use commands::python::PythonCommand;
pub use config_file::SetupConfig;
pub use error::SetupError;
pub use installer::{execute, upgrade_pip, verify};
pub use launcher::{launcher_status, write_launchers, LauncherFlavor, LauncherStatus};
pub use logic::planner::{plan, InstallPlan, PackageGroup, PlanError, PlanWarning};
pub use package_manager::{PackageManager, PipPackageManager};
pub use probe::EnvironmentProbe;
pub use process_guard::{ChildRegistry, CommandProcessGroup};
pub use profiles::{GroupKind, Package};
pub use report::{GroupOutcome, InstallReport, ReportEntry, ReportTransitionError};
pub use types::{AiBackend, PythonVersion};
pub use venv::VirtualEnv;
