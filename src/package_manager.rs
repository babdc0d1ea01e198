//! Package manager seam.
//!
//! The executor and verifier only see the `PackageManager` trait. The
//! production implementation drives `pip` inside the virtual environment;
//! tests substitute an in-memory double.

use crate::command_runner::run_command_safe;
use crate::command_traits::is_dry_run;
use crate::commands::python::{ImportCheckArgs, PipInstallArgs, PythonCommand};
use crate::profiles::Package;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Install packages and check that they load.
pub trait PackageManager {
    /// Install all `packages` in one invocation.
    ///
    /// `Err` describes the failure (non-zero exit, spawn error).
    fn install(&mut self, packages: &[Package]) -> Result<()>;

    /// Upgrade a single package by distribution name.
    fn upgrade(&mut self, name: &str) -> Result<()>;

    /// Import `module` in the target interpreter. Must not modify anything.
    fn verify_import(&mut self, module: &str) -> Result<()>;
}

/// `pip` running inside a virtual environment.
#[derive(Debug, Clone)]
pub struct PipPackageManager {
    python: PythonCommand,
    extra_args: Vec<String>,
    /// Modules whose install was skipped by dry-run
    assumed: HashSet<String>,
}

impl PipPackageManager {
    /// `python` should be the virtual environment's interpreter.
    pub fn new(python: PythonCommand, extra_args: Vec<String>) -> Self {
        Self {
            python,
            extra_args,
            assumed: HashSet::new(),
        }
    }

    pub fn python(&self) -> &PythonCommand {
        &self.python
    }

    /// Returns true if dry-run skipped the install
    fn pip_install(&self, packages: Vec<String>, upgrade: bool) -> Result<bool> {
        let args = PipInstallArgs {
            python: self.python.clone(),
            packages,
            upgrade,
            extra_args: self.extra_args.clone(),
        };
        let output = run_command_safe(&args)?;
        output.ensure_success("pip install")?;
        Ok(output.dry_run)
    }
}

impl PackageManager for PipPackageManager {
    fn install(&mut self, packages: &[Package]) -> Result<()> {
        let names: Vec<String> = packages.iter().map(|p| p.name.to_string()).collect();
        info!("pip install {:?}", names);
        if self.pip_install(names, false)? {
            self.assumed.extend(packages.iter().map(|p| p.module.to_string()));
        }
        Ok(())
    }

    fn upgrade(&mut self, name: &str) -> Result<()> {
        info!("pip install --upgrade {}", name);
        self.pip_install(vec![name.to_string()], true).map(|_| ())
    }

    fn verify_import(&mut self, module: &str) -> Result<()> {
        // Importing a package dry-run never installed proves nothing
        if self.assumed.contains(module) {
            debug!("[dry-run] assuming `import {}` succeeds", module);
            return Ok(());
        }
        if is_dry_run() && !Path::new(&self.python.program).exists() {
            anyhow::bail!("import {} not checked: virtual environment not created (dry-run)", module);
        }

        let args = ImportCheckArgs {
            python: self.python.clone(),
            module: module.to_string(),
        };
        let output = run_command_safe(&args)
            .with_context(|| format!("could not run interpreter for `import {}`", module))?;

        if output.success {
            Ok(())
        } else {
            // Last line of a traceback is the exception itself
            let reason = output
                .stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("unknown error")
                .trim()
                .to_string();
            anyhow::bail!("import {} failed: {}", module, reason)
        }
    }
}
