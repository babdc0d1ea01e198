//! Installer module
//!
//! Executes an `InstallPlan` group by group and double-checks the result.
//!
//! # Failure Policy
//!
//! Independent, non-blocking, best-effort per group. A failed group is
//! recorded and the next group is attempted. A failed required group gets a
//! loud warning but does not stop the run. Nothing is retried.

use crate::logic::planner::InstallPlan;
use crate::package_manager::PackageManager;
use crate::report::{GroupOutcome, InstallReport};
use tracing::{error, info, warn};

/// Install every planned group in order.
///
/// Total: the returned report holds exactly one non-`Skipped` outcome per
/// planned group, whatever the package manager does.
pub fn execute<P: PackageManager + ?Sized>(plan: &InstallPlan, pm: &mut P) -> InstallReport {
    let mut report = InstallReport::from_plan(plan);
    let total = plan.groups().len();

    for (index, group) in plan.groups().iter().enumerate() {
        println!(
            "📦 [{}/{}] Installing {}: {}",
            index + 1,
            total,
            group.name(),
            group.package_names().join(" ")
        );

        let (outcome, detail) = match pm.install(&group.packages) {
            Ok(()) => {
                info!("Group {} installed", group.name());
                (GroupOutcome::Installed, None)
            }
            Err(e) => {
                let detail = format!("{:#}", e);
                warn!("Group {} failed: {}", group.name(), detail);
                (GroupOutcome::Failed, Some(detail))
            }
        };

        if outcome == GroupOutcome::Failed && group.required {
            error!("Required group {} failed to install", group.name());
            eprintln!();
            eprintln!("❌ REQUIRED packages failed to install: {}", group.package_names().join(", "));
            eprintln!("   JARVIS will not start without them. Continuing with the remaining groups;");
            eprintln!("   fix the error above and run setup again.");
            eprintln!();
        }

        if let Err(e) = report.record_attempt(group.kind, outcome, detail) {
            error!("Report rejected outcome for {}: {}", group.name(), e);
        }
    }

    report
}

/// Import every package of every `Installed` group.
///
/// Groups whose imports fail are downgraded to `Failed`; all other entries are
/// copied unchanged. Verifying a verified report yields the same report.
pub fn verify<P: PackageManager + ?Sized>(report: &InstallReport, pm: &mut P) -> InstallReport {
    let mut verified = report.clone();

    for entry in report.entries() {
        if entry.outcome != GroupOutcome::Installed {
            continue;
        }

        let failures: Vec<String> = entry
            .packages
            .iter()
            .filter_map(|pkg| pm.verify_import(pkg.module).err().map(|e| format!("{:#}", e)))
            .collect();

        if failures.is_empty() {
            info!("Group {} verified", entry.group);
            continue;
        }

        warn!("Group {} failed verification: {:?}", entry.group, failures);
        if let Err(e) = verified.downgrade(entry.group, failures.join("; ")) {
            error!("Report rejected downgrade for {}: {}", entry.group, e);
        }
    }

    verified
}

/// Upgrade pip itself before installing groups.
///
/// Best-effort: an old pip can still install most wheels, so failure is only
/// a warning. Returns whether the upgrade succeeded.
pub fn upgrade_pip<P: PackageManager + ?Sized>(pm: &mut P) -> bool {
    println!("⬆️  Upgrading pip...");
    match pm.upgrade("pip") {
        Ok(()) => true,
        Err(e) => {
            warn!("pip upgrade failed: {:#}", e);
            eprintln!("⚠️  pip could not be upgraded ({:#}); continuing with the bundled version.", e);
            false
        }
    }
}
