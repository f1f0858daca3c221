//! List use case: a read-only report of the installed environment.

use anyhow::Result;
use log::warn;

use crate::application::require_env;
use crate::pip::{Inspector, PackageInstaller, Project};
use crate::runtime::Runtime;

/// One line of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageStatus {
    pub name: String,
    pub version: String,
    /// Newer version available, when reporting outdated packages.
    pub latest: Option<String>,
}

pub struct ListAction<'a, R: Runtime, I: PackageInstaller> {
    runtime: &'a R,
    installer: &'a I,
    project: Project,
}

impl<'a, R: Runtime, I: PackageInstaller> ListAction<'a, R, I> {
    pub fn new(runtime: &'a R, installer: &'a I, project: Project) -> Self {
        Self {
            runtime,
            installer,
            project,
        }
    }

    /// Lists installed packages; with `outdated_only`, just those the
    /// index reports newer versions for. An unreachable index degrades
    /// the outdated report to empty with a warning instead of failing.
    pub fn run(&self, outdated_only: bool) -> Result<Vec<PackageStatus>> {
        require_env(self.runtime, &self.project)?;
        let inspector = Inspector::new(self.installer);

        if outdated_only {
            let outdated = match inspector.outdated() {
                Ok(outdated) => outdated,
                Err(err) => {
                    warn!("Could not check for outdated packages: {:#}", err);
                    return Ok(Vec::new());
                }
            };
            return Ok(outdated
                .into_iter()
                .map(|package| PackageStatus {
                    name: package.name,
                    version: package.version,
                    latest: Some(package.latest_version),
                })
                .collect());
        }

        Ok(inspector
            .installed()?
            .into_iter()
            .map(|package| PackageStatus {
                name: package.name,
                version: package.version,
                latest: None,
            })
            .collect())
    }
}
