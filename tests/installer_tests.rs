//! Tests for plan execution and verification
//!
//! These tests verify:
//! - End-to-end plan → execute → verify scenarios
//! - Best-effort continuation after group failures
//! - Prerequisite failures stop before any group is attempted
//! - Launcher readiness after verification

use anyhow::Result;
use jarvis_setup::{
    execute, launcher_status, plan, verify, AiBackend, EnvironmentProbe, GroupKind, GroupOutcome, Package,
    PackageManager, PlanError, PlanWarning, PythonVersion, UserChoices,
};
use std::collections::HashSet;

/// In-memory stand-in for pip
#[derive(Default)]
struct ScriptedPackageManager {
    failing_packages: HashSet<&'static str>,
    failing_modules: HashSet<&'static str>,
    install_calls: Vec<Vec<&'static str>>,
    import_calls: Vec<String>,
}

impl ScriptedPackageManager {
    fn failing_package(mut self, name: &'static str) -> Self {
        self.failing_packages.insert(name);
        self
    }

    fn failing_module(mut self, module: &'static str) -> Self {
        self.failing_modules.insert(module);
        self
    }
}

impl PackageManager for ScriptedPackageManager {
    fn install(&mut self, packages: &[Package]) -> Result<()> {
        self.install_calls.push(packages.iter().map(|p| p.name).collect());
        if let Some(bad) = packages.iter().find(|p| self.failing_packages.contains(p.name)) {
            anyhow::bail!("pip install {} exited with code 1", bad.name);
        }
        Ok(())
    }

    fn upgrade(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn verify_import(&mut self, module: &str) -> Result<()> {
        self.import_calls.push(module.to_string());
        if self.failing_modules.contains(module) {
            anyhow::bail!("import {} failed: ImportError", module);
        }
        Ok(())
    }
}

fn choices(ai: AiBackend, vision: bool, three_d: bool) -> UserChoices {
    UserChoices {
        ai_backend: ai,
        install_vision: vision,
        install_3d: three_d,
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_ollama_without_toolchain_scenario() {
    let probe = EnvironmentProbe::with_python(PythonVersion::new(3, 10, 0), false);
    let plan = plan(&probe, &choices(AiBackend::Ollama, false, false)).unwrap();

    assert_eq!(plan.group_names(), vec!["core", "ai", "tts"]);
    assert!(plan.has_toolchain_warning());

    let mut pm = ScriptedPackageManager::default().failing_package("ollama");
    let report = execute(&plan, &mut pm);

    assert_eq!(report.outcome(GroupKind::Core), Some(GroupOutcome::Installed));
    assert_eq!(report.outcome(GroupKind::Ai), Some(GroupOutcome::Failed));
    assert_eq!(report.outcome(GroupKind::Tts), Some(GroupOutcome::Installed));
    assert_eq!(pm.install_calls.len(), 3, "every group is attempted");
}

#[test]
fn test_old_python_attempts_nothing() {
    let probe = EnvironmentProbe::with_python(PythonVersion::new(3, 7, 5), true);
    let result = plan(&probe, &choices(AiBackend::LocalOffline, true, true));

    assert_eq!(
        result,
        Err(PlanError::InvalidVersion {
            found: PythonVersion::new(3, 7, 5)
        })
    );
}

#[test]
fn test_minimum_version_is_accepted() {
    let probe = EnvironmentProbe::with_python(PythonVersion::new(3, 8, 0), true);
    assert!(plan(&probe, &UserChoices::default()).is_ok());
}

#[test]
fn test_groups_installed_in_plan_order() {
    let probe = EnvironmentProbe::with_python(PythonVersion::new(3, 12, 1), true);
    let plan = plan(&probe, &choices(AiBackend::LocalOffline, true, true)).unwrap();

    let mut pm = ScriptedPackageManager::default();
    execute(&plan, &mut pm);

    assert_eq!(
        pm.install_calls,
        vec![
            vec!["cryptography", "pyyaml", "numpy"],
            vec!["llama-cpp-python", "openai-whisper", "pyaudio"],
            vec!["opencv-python", "ultralytics"],
            vec!["pyvista", "matplotlib"],
            vec!["pyttsx3"],
        ]
    );
}

#[test]
fn test_ollama_runtime_hint() {
    let mut probe = EnvironmentProbe::with_python(PythonVersion::new(3, 11, 0), true);
    let plan_without = plan(&probe, &choices(AiBackend::Ollama, false, false)).unwrap();
    assert!(plan_without.warnings().iter().any(|w| matches!(
        w,
        PlanWarning::OllamaRuntimeMissing { model: "llama3.2" }
    )));

    probe.ollama_found = true;
    let plan_with = plan(&probe, &choices(AiBackend::Ollama, false, false)).unwrap();
    assert!(plan_with.warnings().is_empty());
}

// =============================================================================
// Verification
// =============================================================================

#[test]
fn test_verify_downgrades_broken_imports_only() {
    let probe = EnvironmentProbe::with_python(PythonVersion::new(3, 10, 0), true);
    let plan = plan(&probe, &choices(AiBackend::None, true, true)).unwrap();

    let mut pm = ScriptedPackageManager::default()
        .failing_package("pyvista")
        .failing_module("ultralytics");
    let report = execute(&plan, &mut pm);
    let verified = verify(&report, &mut pm);

    assert_eq!(verified.outcome(GroupKind::Core), Some(GroupOutcome::Installed));
    assert_eq!(verified.outcome(GroupKind::Vision), Some(GroupOutcome::Failed));
    assert_eq!(verified.outcome(GroupKind::ThreeD), Some(GroupOutcome::Failed));
    assert_eq!(verified.outcome(GroupKind::Tts), Some(GroupOutcome::Installed));

    // The 3d group failed to install, so its modules are never imported
    assert!(!pm.import_calls.iter().any(|m| m == "pyvista"));
    assert!(pm.import_calls.iter().any(|m| m == "cv2"));
}

#[test]
fn test_verify_is_idempotent() {
    let probe = EnvironmentProbe::with_python(PythonVersion::new(3, 10, 0), true);
    let plan = plan(&probe, &choices(AiBackend::Ollama, true, false)).unwrap();

    let mut pm = ScriptedPackageManager::default().failing_module("duckduckgo_search");
    let report = execute(&plan, &mut pm);
    let once = verify(&report, &mut pm);
    let twice = verify(&once, &mut pm);

    assert_eq!(once, twice);
    assert_eq!(once.outcome(GroupKind::Ai), Some(GroupOutcome::Failed));
}

#[test]
fn test_core_failure_does_not_stop_execution() {
    let probe = EnvironmentProbe::with_python(PythonVersion::new(3, 10, 0), true);
    let plan = plan(&probe, &choices(AiBackend::None, true, false)).unwrap();

    let mut pm = ScriptedPackageManager::default().failing_package("numpy");
    let report = execute(&plan, &mut pm);

    assert_eq!(report.outcome(GroupKind::Core), Some(GroupOutcome::Failed));
    assert_eq!(report.outcome(GroupKind::Vision), Some(GroupOutcome::Installed));
    assert!(report.required_failed());
    assert!(report
        .entry(GroupKind::Core)
        .and_then(|e| e.detail.as_deref())
        .unwrap()
        .contains("numpy"));
}

// =============================================================================
// Launcher readiness
// =============================================================================

#[test]
fn test_vision_declined_leaves_only_console_chat() {
    let env = EnvironmentProbe::with_python(PythonVersion::new(3, 11, 0), true);
    let plan = plan(&env, &choices(AiBackend::Ollama, false, false)).unwrap();

    // cv2 is not already present in the venv
    let mut pm = ScriptedPackageManager::default().failing_module("cv2");
    let report = verify(&execute(&plan, &mut pm), &mut pm);
    assert!(report.groups_with(GroupOutcome::Failed).is_empty());

    let statuses = launcher_status(&report, &mut pm);
    let ready: Vec<&str> = statuses
        .iter()
        .filter(|s| s.is_ready())
        .map(|s| s.launcher.name)
        .collect();
    assert_eq!(ready, vec!["jarvis_chat"]);
    assert!(statuses[0].to_string().contains("cv2 (vision group not installed)"));
    assert!(pm.import_calls.iter().any(|m| m == "tkinter"));
}

#[test]
fn test_all_features_make_both_launchers_ready() {
    let env = EnvironmentProbe::with_python(PythonVersion::new(3, 11, 0), true);
    let plan = plan(&env, &choices(AiBackend::Ollama, true, true)).unwrap();

    let mut pm = ScriptedPackageManager::default();
    let report = verify(&execute(&plan, &mut pm), &mut pm);
    assert!(launcher_status(&report, &mut pm).iter().all(|s| s.is_ready()));
}
