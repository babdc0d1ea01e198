//! Launcher scripts
//!
//! Writes `start_jarvis` and `jarvis_chat` into the application directory.
//! Each one switches to its own directory, activates the virtual environment
//! and hands over to the Python entry point.
//!
//! A launcher only works if its entry point can import everything it loads
//! at startup, so `launcher_status` checks those modules after verification.

use crate::command_traits::is_dry_run;
use crate::error::Result;
use crate::package_manager::PackageManager;
use crate::profiles;
use crate::report::{GroupOutcome, InstallReport};
use crate::venv::VirtualEnv;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use strum::Display;
use tracing::{info, warn};

/// Script dialect of a launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LauncherFlavor {
    /// `.bat` for cmd.exe
    Batch,
    /// `.sh` for POSIX shells
    Shell,
}

impl LauncherFlavor {
    /// Flavor for the running platform
    pub fn native() -> Self {
        if cfg!(windows) { Self::Batch } else { Self::Shell }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Batch => "bat",
            Self::Shell => "sh",
        }
    }
}

/// One generated launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Launcher {
    /// File stem (`start_jarvis`)
    pub name: &'static str,
    /// Python entry point relative to the application directory
    pub script: &'static str,
    pub description: &'static str,
    /// Modules the entry point imports at startup
    pub requires: &'static [&'static str],
}

pub const LAUNCHERS: &[Launcher] = &[
    Launcher {
        name: "start_jarvis",
        script: "jarvis_main.py",
        description: "full assistant",
        // GUI (tkinter), camera (cv2), 3D preview (numpy), settings (yaml)
        requires: &["yaml", "numpy", "cv2", "tkinter"],
    },
    Launcher {
        name: "jarvis_chat",
        script: "jarvis_logic.py",
        description: "console chat mode",
        requires: &["yaml"],
    },
];

impl Launcher {
    pub fn file_name(&self, flavor: LauncherFlavor) -> String {
        format!("{}.{}", self.name, flavor.extension())
    }

    /// Script body for `flavor`, sourcing `activate`
    pub fn render(&self, flavor: LauncherFlavor, activate: &Path) -> String {
        let activate = activate.display();
        match flavor {
            LauncherFlavor::Batch => format!(
                "@echo off\r\n\
                 rem JARVIS launcher: {desc}\r\n\
                 cd /d \"%~dp0\"\r\n\
                 call \"{activate}\"\r\n\
                 python \"{script}\" %*\r\n",
                desc = self.description,
                activate = activate,
                script = self.script,
            ),
            LauncherFlavor::Shell => format!(
                "#!/usr/bin/env sh\n\
                 # JARVIS launcher: {desc}\n\
                 cd \"$(dirname \"$0\")\" || exit 1\n\
                 . \"{activate}\"\n\
                 exec python \"{script}\" \"$@\"\n",
                desc = self.description,
                activate = activate,
                script = self.script,
            ),
        }
    }
}

/// Write every launcher into `app_dir`.
///
/// Returns the launcher paths. In dry-run mode nothing is written but the
/// paths that would be written are still returned.
pub fn write_launchers(app_dir: &Path, venv: &VirtualEnv, flavor: LauncherFlavor) -> Result<Vec<PathBuf>> {
    // Launchers cd to their own directory first, so a relative venv path would break
    let activate = std::path::absolute(venv.activate_path())?;
    let mut written = Vec::with_capacity(LAUNCHERS.len());

    for launcher in LAUNCHERS {
        let path = app_dir.join(launcher.file_name(flavor));

        if !app_dir.join(launcher.script).exists() {
            warn!("{} not found in {}", launcher.script, app_dir.display());
        }

        if is_dry_run() {
            info!("[dry-run] skipping launcher {}", path.display());
            written.push(path);
            continue;
        }

        fs::write(&path, launcher.render(flavor, &activate))?;
        if flavor == LauncherFlavor::Shell {
            make_executable(&path)?;
        }
        info!("Wrote launcher {}", path.display());
        written.push(path);
    }

    Ok(written)
}

/// Whether a launcher's entry point can start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherStatus {
    pub launcher: Launcher,
    /// Unavailable modules, each with the reason
    pub missing: Vec<(&'static str, String)>,
}

impl LauncherStatus {
    pub fn is_ready(&self) -> bool {
        self.missing.is_empty()
    }
}

impl fmt::Display for LauncherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ready() {
            return write!(f, "  ✓ {:<13} {}", self.launcher.name, self.launcher.description);
        }
        let missing: Vec<String> = self
            .missing
            .iter()
            .map(|(module, reason)| format!("{} ({})", module, reason))
            .collect();
        write!(f, "  ✗ {:<13} cannot start, missing: {}", self.launcher.name, missing.join(", "))
    }
}

/// Check every launcher's startup imports.
///
/// Modules provided by a planned group follow that group's verified outcome.
/// Anything else (`tkinter`, or `cv2` when vision was declined) is imported
/// directly. Each module is checked once.
pub fn launcher_status<P: PackageManager + ?Sized>(report: &InstallReport, pm: &mut P) -> Vec<LauncherStatus> {
    let mut checked: HashMap<&'static str, Option<String>> = HashMap::new();
    let mut statuses = Vec::with_capacity(LAUNCHERS.len());

    for launcher in LAUNCHERS {
        let mut missing = Vec::new();
        for &module in launcher.requires {
            let reason = match checked.get(module) {
                Some(reason) => reason.clone(),
                None => {
                    let reason = unavailable_reason(report, pm, module);
                    checked.insert(module, reason.clone());
                    reason
                }
            };
            if let Some(reason) = reason {
                missing.push((module, reason));
            }
        }
        if !missing.is_empty() {
            warn!("{} cannot start: {:?}", launcher.name, missing);
        }
        statuses.push(LauncherStatus {
            launcher: *launcher,
            missing,
        });
    }

    statuses
}

/// None if `module` is importable
fn unavailable_reason<P: PackageManager + ?Sized>(report: &InstallReport, pm: &mut P, module: &str) -> Option<String> {
    let provider = report
        .entries()
        .iter()
        .find(|e| e.packages.iter().any(|p| p.module == module));

    match provider {
        Some(entry) if entry.outcome == GroupOutcome::Installed => None,
        Some(entry) => Some(format!("{} group {}", entry.group, entry.outcome)),
        None => match pm.verify_import(module) {
            Ok(()) => None,
            Err(e) => Some(match profiles::group_for_module(module) {
                Some(kind) => format!("{} group not installed", kind),
                None => format!("{:#}", e),
            }),
        },
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
