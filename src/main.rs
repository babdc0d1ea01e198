//! JARVIS Setup - Main entry point
//!
//! Probe → choices → plan → venv → install → verify → launchers → report.

use std::fs;
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use jarvis_setup::cli::{Cli, Commands};
use jarvis_setup::config_file::{SetupConfig, PYTHON_ENV_VAR};
use jarvis_setup::error::{Result, SetupError};
use jarvis_setup::logic::planner::{plan, InstallPlan, PlanError, PlanWarning};
use jarvis_setup::probe::{self, EnvironmentProbe};
use jarvis_setup::{
    collect_choices, enable_dry_run, execute, launcher_status, process_guard, upgrade_pip, verify,
    write_launchers, ChoicePreset, Chooser, DefaultChooser, DialoguerChooser, GroupOutcome,
    InstallReport, LauncherFlavor, LauncherStatus, PipPackageManager, UserChoices, VirtualEnv,
};

/// Initialize tracing; `RUST_LOG` overrides the default `warn` level.
///
/// Logs go to stderr so stdout carries only operator output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application entry point
fn main() -> ExitCode {
    init_tracing();
    info!("jarvis-setup starting up");

    // Children (pip, venv) are terminated if we receive SIGINT/SIGTERM
    if let Err(e) = process_guard::init_signal_handlers() {
        warn!("Failed to initialize signal handlers: {}", e);
    }

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed: {:?}", cli);

    if cli.dry_run {
        enable_dry_run();
        println!("🔍 Dry-run mode: nothing will be created or installed.");
    }

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            // Prerequisite failures already printed their own guidance
            if !matches!(e, SetupError::Prerequisite(_)) {
                eprintln!("✗ {}", e);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    cli.check_flag_scope()?;
    match cli.command() {
        Commands::Validate { file } => run_validate(&file),
        Commands::Check => run_check(cli),
        Commands::Plan { json } => run_plan(cli, json),
        Commands::Install => run_install(cli),
    }
}

/// Config file (if any), then flags, then environment.
fn load_config(cli: &Cli) -> Result<SetupConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from: {:?}", path);
            SetupConfig::load_from_file(path).map_err(|e| SetupError::config(format!("{:#}", e)))?
        }
        None => SetupConfig::default(),
    };

    cli.apply_to(&mut config);
    config.apply_env_python(std::env::var(PYTHON_ENV_VAR).ok());
    config
        .validate()
        .map_err(|e| SetupError::config(format!("{:#}", e)))?;

    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Terminal prompts when interactive, defaults otherwise.
fn chooser(yes: bool) -> Box<dyn Chooser> {
    if yes {
        return Box::new(DefaultChooser);
    }
    if !std::io::stdin().is_terminal() {
        warn!("stdin is not a terminal; unanswered choices take their defaults");
        return Box::new(DefaultChooser);
    }
    Box::new(DialoguerChooser::new())
}

fn run_validate(file: &Path) -> Result<ExitCode> {
    info!("Validating configuration file: {:?}", file);
    let config =
        SetupConfig::load_from_file(file).map_err(|e| SetupError::config(format!("{:#}", e)))?;
    config
        .validate()
        .map_err(|e| SetupError::config(format!("{:#}", e)))?;
    println!("✓ Configuration file is valid: {}", file.display());
    Ok(ExitCode::SUCCESS)
}

fn run_check(cli: &Cli) -> Result<ExitCode> {
    let config = load_config(cli)?;
    let probe = EnvironmentProbe::detect(config.python_command().as_ref());

    println!("{}", probe);
    if !probe.python_found {
        probe::print_prerequisite_error(&PlanError::PythonNotFound);
        return Ok(ExitCode::FAILURE);
    }
    if !probe.python_version.is_supported() {
        probe::print_prerequisite_error(&PlanError::InvalidVersion {
            found: probe.python_version,
        });
        return Ok(ExitCode::FAILURE);
    }
    println!("✓ Prerequisites satisfied");
    Ok(ExitCode::SUCCESS)
}

/// Probe and plan, printing guidance if a prerequisite is missing.
fn probe_and_plan(config: &SetupConfig, chooser: &mut dyn Chooser) -> Result<(EnvironmentProbe, UserChoices, InstallPlan)> {
    let probe = EnvironmentProbe::detect(config.python_command().as_ref());
    println!("🔎 {}", probe);

    let choices = collect_choices(config.choices, chooser)?;
    info!("Choices: {:?}", choices);

    let plan = plan(&probe, &choices).inspect_err(probe::print_prerequisite_error)?;
    Ok((probe, choices, plan))
}

#[derive(Serialize)]
struct PlanPreview<'a> {
    probe: &'a EnvironmentProbe,
    choices: &'a UserChoices,
    plan: &'a InstallPlan,
}

fn print_plan(plan: &InstallPlan) {
    println!("📋 Installation plan:");
    for group in plan.groups() {
        println!(
            "  • {:<7} {}{}",
            group.name(),
            group.package_names().join(" "),
            if group.required { " (required)" } else { "" }
        );
    }
    for warning in plan.warnings() {
        println!("  ⚠️  {}", warning);
    }
}

fn run_plan(cli: &Cli, json: bool) -> Result<ExitCode> {
    let config = load_config(cli)?;
    let mut chooser = chooser(cli.yes);
    let (probe, choices, plan) = probe_and_plan(&config, chooser.as_mut())?;

    if json {
        let preview = PlanPreview {
            probe: &probe,
            choices: &choices,
            plan: &plan,
        };
        println!("{}", serde_json::to_string_pretty(&preview)?);
    } else {
        print_plan(&plan);
    }

    save_config(cli, config, choices)?;
    Ok(ExitCode::SUCCESS)
}

/// `--save-config`: the effective configuration with the answered choices
fn save_config(cli: &Cli, config: SetupConfig, choices: UserChoices) -> Result<()> {
    let Some(path) = &cli.save_config else {
        return Ok(());
    };
    let saved = SetupConfig {
        choices: ChoicePreset::from(choices),
        ..config
    };
    saved
        .save_to_file(path)
        .map_err(|e| SetupError::config(format!("{:#}", e)))?;
    println!("💾 Configuration saved to {}", path.display());
    Ok(())
}

fn run_install(cli: &Cli) -> Result<ExitCode> {
    let config = load_config(cli)?;
    let mut chooser = chooser(cli.yes);
    let (probe, choices, plan) = probe_and_plan(&config, chooser.as_mut())?;
    print_plan(&plan);

    for warning in plan.warnings() {
        if let PlanWarning::ToolchainMissing { packages } = warning {
            probe::print_toolchain_warning(packages);
            if !chooser.confirm("Continue without a C++ toolchain?", true)? {
                println!("Setup cancelled. Install a C++ toolchain and run setup again.");
                return Ok(ExitCode::SUCCESS);
            }
        }
    }

    let base_python = probe
        .python_command
        .clone()
        .ok_or(SetupError::Prerequisite(PlanError::PythonNotFound))?;
    let venv = VirtualEnv::new(&config.venv_dir);
    venv.create(&base_python)?;

    let mut pm = PipPackageManager::new(venv.python(), config.pip_args.clone());
    upgrade_pip(&mut pm);

    let report = execute(&plan, &mut pm);
    println!("🔎 Verifying imports...");
    let report = verify(&report, &mut pm);

    if config.launchers {
        match write_launchers(&config.app_dir, &venv, LauncherFlavor::native()) {
            Ok(paths) => {
                for path in paths {
                    println!("🚀 Launcher: {}", path.display());
                }
            }
            Err(e) => {
                warn!("Failed to write launchers: {}", e);
                eprintln!("⚠️  Could not write launchers: {}", e);
            }
        }
    }

    let launchers = launcher_status(&report, &mut pm);
    print_summary(&report, &plan, &launchers);

    if let Some(path) = &cli.report {
        fs::write(path, report.to_json()?)?;
        println!("📝 Report written to {}", path.display());
    }

    save_config(cli, config, choices)?;
    Ok(ExitCode::SUCCESS)
}

fn print_summary(report: &InstallReport, plan: &InstallPlan, launchers: &[LauncherStatus]) {
    println!();
    println!("Installation report:");
    print!("{}", report);

    for warning in plan.warnings() {
        if let PlanWarning::OllamaRuntimeMissing { .. } = warning {
            println!();
            println!("ℹ️  {}", warning);
        }
    }

    println!();
    println!("Launchers:");
    for status in launchers {
        println!("{}", status);
    }

    let failed = report.groups_with(GroupOutcome::Failed);
    let ready = launchers.iter().find(|s| s.is_ready());
    println!();
    if report.required_failed() {
        println!("❌ Core packages are missing; JARVIS will not start until they install.");
    } else if ready.is_none() {
        println!("⚠️  Setup finished, but no launcher can start. Install the modules listed above.");
    } else if let Some(status) = ready.filter(|_| failed.is_empty()) {
        println!("✓ Setup complete. Start JARVIS with {}.", status.launcher.name);
    } else {
        println!(
            "✓ Setup complete with optional features unavailable: {}",
            failed.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        );
    }
}
