//! Uninstall use case.
//!
//! Uninstalls exactly the named packages and removes them from every
//! manifest group. Never cascades to transitive dependencies: packages
//! pulled in by a removed one are left installed.

use anyhow::Result;
use log::info;

use crate::application::{PackageRequest, require_env};
use crate::manifest::ManifestStore;
use crate::pip::{PackageInstaller, Project};
use crate::planner::{self, Action};
use crate::runtime::Runtime;

pub struct UninstallAction<'a, R: Runtime, I: PackageInstaller> {
    runtime: &'a R,
    installer: &'a I,
    project: Project,
}

impl<'a, R: Runtime, I: PackageInstaller> UninstallAction<'a, R, I> {
    pub fn new(runtime: &'a R, installer: &'a I, project: Project) -> Self {
        Self {
            runtime,
            installer,
            project,
        }
    }

    pub fn run(&self, packages: &[String]) -> Result<()> {
        let store = ManifestStore::new(self.runtime, self.project.manifest_path());
        let mut manifest = store.load()?;

        // Arguments may carry constraints (`pkg==1.0`); only names matter.
        let names = packages
            .iter()
            .map(|arg| arg.parse::<PackageRequest>().map(|request| request.name))
            .collect::<Result<Vec<_>, _>>()?;

        require_env(self.runtime, &self.project)?;

        for action in planner::plan_uninstall(&names) {
            let Action::Uninstall { name } = action else {
                unreachable!("uninstall plans only uninstall");
            };
            println!("Uninstalling {}", name);
            self.installer.uninstall(&name)?;

            if manifest.contains(&name) {
                info!("Removing {} from the manifest", name);
                manifest = manifest.remove(&name);
                store.persist(&manifest)?;
            }
        }
        Ok(())
    }
}
