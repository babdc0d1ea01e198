//! Installation Planner
//!
//! Translates the environment probe and the operator's choices into an
//! ordered list of package groups.
//!
//! # Design
//!
//! - **No hardcoded strings**: package lists come from `profiles` constants
//! - **Deterministic**: the same probe and choices always yield the same plan
//! - **Pure logic**: no I/O, no side effects
//! - **All or nothing**: a failed prerequisite yields an error, never a partial plan
//!
//! # Planning Rules
//!
//! | Condition                      | Group   | Required |
//! |--------------------------------|---------|----------|
//! | always                         | core    | yes      |
//! | `ai_backend != None`           | ai      | no       |
//! | `install_vision`               | vision  | no       |
//! | `install_3d`                   | 3d      | no       |
//! | always                         | tts     | no       |

use crate::choices::UserChoices;
use crate::probe::EnvironmentProbe;
use crate::profiles::{self, ai_packages, GroupKind, Package};
use crate::types::{AiBackend, PythonVersion};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Fatal planning failures. Planning halts and no groups are attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Python interpreter not found")]
    PythonNotFound,

    #[error("Python {found} is too old (requires {} or newer)", PythonVersion::MINIMUM)]
    InvalidVersion { found: PythonVersion },
}

/// Non-fatal conditions the caller must surface before installing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanWarning {
    /// No C++ compiler; lists planned packages that may need one
    ToolchainMissing { packages: Vec<&'static str> },
    /// Ollama backend chosen but the Ollama runtime is not installed
    OllamaRuntimeMissing { model: &'static str },
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolchainMissing { packages } if packages.is_empty() => {
                write!(f, "no C++ toolchain found; packages without wheels may fail to build")
            }
            Self::ToolchainMissing { packages } => write!(
                f,
                "no C++ toolchain found; {} may fail to build",
                packages.join(", ")
            ),
            Self::OllamaRuntimeMissing { model } => write!(
                f,
                "Ollama runtime not found; install it from https://ollama.ai then run `ollama pull {}`",
                model
            ),
        }
    }
}

/// A named set of packages installed and verified as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageGroup {
    pub kind: GroupKind,
    pub packages: Vec<Package>,
    pub required: bool,
}

impl PackageGroup {
    fn new(kind: GroupKind, packages: &[Package], required: bool) -> Self {
        Self {
            kind,
            packages: packages.to_vec(),
            required,
        }
    }

    /// Group name as shown in reports (`core`, `ai`, `3d`, ...)
    pub fn name(&self) -> String {
        self.kind.to_string()
    }

    /// Distribution names passed to the package manager
    pub fn package_names(&self) -> Vec<&'static str> {
        self.packages.iter().map(|p| p.name).collect()
    }
}

/// The ordered, deterministic sequence of groups to install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallPlan {
    groups: Vec<PackageGroup>,
    warnings: Vec<PlanWarning>,
}

impl InstallPlan {
    /// Groups in installation order
    pub fn groups(&self) -> &[PackageGroup] {
        &self.groups
    }

    /// Non-fatal warnings raised while planning
    pub fn warnings(&self) -> &[PlanWarning] {
        &self.warnings
    }

    /// Look up a planned group
    pub fn group(&self, kind: GroupKind) -> Option<&PackageGroup> {
        self.groups.iter().find(|g| g.kind == kind)
    }

    /// Returns true if the group is part of the plan
    pub fn contains(&self, kind: GroupKind) -> bool {
        self.group(kind).is_some()
    }

    /// Group names in order
    pub fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(PackageGroup::name).collect()
    }

    /// Planned packages that may compile native code
    pub fn native_packages(&self) -> Vec<&'static str> {
        self.groups
            .iter()
            .flat_map(|g| g.packages.iter())
            .filter(|p| p.needs_toolchain)
            .map(|p| p.name)
            .collect()
    }

    /// Returns true if a toolchain warning was raised
    pub fn has_toolchain_warning(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, PlanWarning::ToolchainMissing { .. }))
    }
}

/// Build the installation plan.
///
/// # Errors
///
/// - `PythonNotFound` if no interpreter answered the probe
/// - `InvalidVersion` if the interpreter is older than `PythonVersion::MINIMUM`
///
/// Warnings (missing toolchain, missing Ollama runtime) never fail planning;
/// they are attached to the plan for the caller to surface.
pub fn plan(probe: &EnvironmentProbe, choices: &UserChoices) -> Result<InstallPlan, PlanError> {
    if !probe.python_found {
        return Err(PlanError::PythonNotFound);
    }
    if !probe.python_version.is_supported() {
        return Err(PlanError::InvalidVersion {
            found: probe.python_version,
        });
    }

    let mut groups = vec![PackageGroup::new(GroupKind::Core, profiles::CORE, true)];

    let ai_set = match choices.ai_backend {
        AiBackend::None => None,
        AiBackend::Ollama => Some(ai_packages::OLLAMA),
        AiBackend::LocalOffline => Some(ai_packages::LOCAL_OFFLINE),
    };
    if let Some(set) = ai_set {
        groups.push(PackageGroup::new(GroupKind::Ai, set, false));
    }

    if choices.install_vision {
        groups.push(PackageGroup::new(GroupKind::Vision, profiles::VISION, false));
    }
    if choices.install_3d {
        groups.push(PackageGroup::new(GroupKind::ThreeD, profiles::THREE_D, false));
    }

    groups.push(PackageGroup::new(GroupKind::Tts, profiles::TTS, false));

    let mut plan = InstallPlan {
        groups,
        warnings: Vec::new(),
    };

    if !probe.toolchain_found {
        let packages = plan.native_packages();
        warn!("No C++ toolchain; native packages at risk: {:?}", packages);
        plan.warnings.push(PlanWarning::ToolchainMissing { packages });
    }

    if choices.ai_backend == AiBackend::Ollama && !probe.ollama_found {
        warn!("Ollama backend selected but the ollama binary is missing");
        plan.warnings.push(PlanWarning::OllamaRuntimeMissing {
            model: profiles::DEFAULT_OLLAMA_MODEL,
        });
    }

    info!("Planned groups: {:?}", plan.group_names());
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(version: (u32, u32, u32), toolchain: bool) -> EnvironmentProbe {
        EnvironmentProbe::with_python(PythonVersion::new(version.0, version.1, version.2), toolchain)
    }

    fn choices(ai: AiBackend, vision: bool, three_d: bool) -> UserChoices {
        UserChoices {
            ai_backend: ai,
            install_vision: vision,
            install_3d: three_d,
        }
    }

    #[test]
    fn test_minimal_plan_is_core_and_tts() {
        let plan = plan(&probe((3, 11, 4), true), &UserChoices::default()).unwrap();
        assert_eq!(plan.group_names(), vec!["core", "tts"]);
        assert!(plan.warnings().is_empty());
        assert!(plan.group(GroupKind::Core).unwrap().required);
        assert!(!plan.group(GroupKind::Tts).unwrap().required);
    }

    #[test]
    fn test_full_plan_order() {
        let plan = plan(
            &probe((3, 12, 0), true),
            &choices(AiBackend::LocalOffline, true, true),
        )
        .unwrap();
        assert_eq!(plan.group_names(), vec!["core", "ai", "vision", "3d", "tts"]);
    }

    #[test]
    fn test_ai_sets_follow_backend() {
        let ollama = plan(&probe((3, 10, 0), true), &choices(AiBackend::Ollama, false, false)).unwrap();
        assert_eq!(
            ollama.group(GroupKind::Ai).unwrap().package_names(),
            vec!["ollama", "duckduckgo-search"]
        );

        let offline = plan(
            &probe((3, 10, 0), true),
            &choices(AiBackend::LocalOffline, false, false),
        )
        .unwrap();
        assert_eq!(
            offline.group(GroupKind::Ai).unwrap().package_names(),
            vec!["llama-cpp-python", "openai-whisper", "pyaudio"]
        );
    }

    #[test]
    fn test_old_python_is_rejected() {
        let err = plan(&probe((3, 7, 5), true), &UserChoices::default()).unwrap_err();
        assert_eq!(
            err,
            PlanError::InvalidVersion {
                found: PythonVersion::new(3, 7, 5)
            }
        );
        assert_eq!(err.to_string(), "Python 3.7.5 is too old (requires 3.8.0 or newer)");
    }

    #[test]
    fn test_missing_python_is_rejected() {
        let mut p = probe((3, 12, 0), true);
        p.python_found = false;
        assert_eq!(plan(&p, &UserChoices::default()), Err(PlanError::PythonNotFound));
    }

    #[test]
    fn test_toolchain_warning_lists_native_packages() {
        let plan = plan(
            &probe((3, 10, 0), false),
            &choices(AiBackend::LocalOffline, false, false),
        )
        .unwrap();
        assert_eq!(
            plan.warnings(),
            &[PlanWarning::ToolchainMissing {
                packages: vec!["llama-cpp-python", "pyaudio"]
            }]
        );
        assert!(plan.has_toolchain_warning());
    }

    #[test]
    fn test_toolchain_warning_without_native_packages() {
        let plan = plan(&probe((3, 10, 0), false), &UserChoices::default()).unwrap();
        assert!(plan.has_toolchain_warning());
        assert!(plan.warnings()[0].to_string().contains("no C++ toolchain"));
    }

    #[test]
    fn test_ollama_runtime_warning() {
        let mut p = probe((3, 10, 0), true);
        let plan_missing = plan(&p, &choices(AiBackend::Ollama, false, false)).unwrap();
        assert_eq!(
            plan_missing.warnings(),
            &[PlanWarning::OllamaRuntimeMissing { model: "llama3.2" }]
        );

        p.ollama_found = true;
        let plan_present = plan(&p, &choices(AiBackend::Ollama, false, false)).unwrap();
        assert!(plan_present.warnings().is_empty());
    }
}
