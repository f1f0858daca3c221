//! Bridge to the external package installer.
//!
//! The engine never performs installs itself: every package operation is
//! delegated to the environment's pip through the [`PackageInstaller`]
//! capability trait. The trait is the seam for test doubles; the real
//! implementation shells out to the project environment's pip binary.

mod env;
mod inspector;

pub use env::{ENV_DIR, MANIFEST_FILE, Project, Provisioner, VirtualenvProvisioner};
pub use inspector::{Inspector, InstalledPackage, OutdatedPackage};

#[cfg(test)]
pub use env::MockProvisioner;

use anyhow::Result;
use log::debug;
use std::path::Path;
use std::process::Command;

use crate::error::PipitError;

/// Narrow capability interface over the external installer.
///
/// Implementations perform the actual install/uninstall/upgrade against
/// the active isolated environment and report non-zero results as
/// `InstallerFailure` with the diagnostic text carried verbatim.
#[cfg_attr(test, mockall::automock)]
pub trait PackageInstaller: Send + Sync {
    /// Installs one requirement string.
    fn install(&self, requirement: &str) -> Result<()>;

    /// Upgrades one requirement to the latest version satisfying it.
    fn upgrade(&self, requirement: &str) -> Result<()>;

    /// Uninstalls one package by name.
    fn uninstall(&self, name: &str) -> Result<()>;

    /// Raw JSON report of installed (or outdated) packages.
    fn list_json(&self, outdated: bool) -> Result<String>;

    /// Version of the environment's interpreter, e.g. `"3.11.4"`.
    fn interpreter_version(&self) -> Result<String>;
}

/// The real installer: the project environment's pip.
pub struct PipInstaller {
    project: Project,
}

impl PipInstaller {
    pub fn new(project: Project) -> Self {
        Self { project }
    }

    fn run(&self, program: &Path, args: &[&str]) -> Result<Vec<u8>> {
        let command = format!(
            "{} {}",
            program
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| program.display().to_string()),
            args.join(" ")
        );
        debug!("Running {}", command);

        let output = Command::new(program)
            .args(args)
            .current_dir(self.project.root())
            .output()
            .map_err(|err| PipitError::InstallerFailure {
                command: command.clone(),
                diagnostic: err.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let diagnostic = if stderr.is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr
            };
            return Err(PipitError::InstallerFailure {
                command,
                diagnostic,
            }
            .into());
        }
        Ok(output.stdout)
    }

    fn run_pip(&self, args: &[&str]) -> Result<Vec<u8>> {
        self.run(&self.project.pip_path(), args)
    }
}

impl PackageInstaller for PipInstaller {
    #[tracing::instrument(skip(self))]
    fn install(&self, requirement: &str) -> Result<()> {
        self.run_pip(&["install", requirement]).map(|_| ())
    }

    #[tracing::instrument(skip(self))]
    fn upgrade(&self, requirement: &str) -> Result<()> {
        self.run_pip(&["install", "-U", requirement]).map(|_| ())
    }

    #[tracing::instrument(skip(self))]
    fn uninstall(&self, name: &str) -> Result<()> {
        self.run_pip(&["uninstall", "-y", name]).map(|_| ())
    }

    #[tracing::instrument(skip(self))]
    fn list_json(&self, outdated: bool) -> Result<String> {
        let mut args = vec!["list", "--format=json"];
        if outdated {
            args.push("--outdated");
        }
        let stdout = self.run_pip(&args)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    #[tracing::instrument(skip(self))]
    fn interpreter_version(&self) -> Result<String> {
        let script = "import sys; print('%d.%d.%d' % sys.version_info[:3])";
        let stdout = self.run(&self.project.python_path(), &["-c", script])?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }
}
