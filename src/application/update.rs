//! Update use case.
//!
//! Updates installed, outdated manifest entries and rewrites their pins
//! to the newly installed versions. Version-controlled entries are never
//! updated here; changing a ref requires an explicit `install`.

use anyhow::Result;
use log::{info, warn};

use crate::application::{PackageRequest, env_context, require_env};
use crate::error::PipitError;
use crate::manifest::ManifestStore;
use crate::pip::{Inspector, PackageInstaller, Project};
use crate::planner::{self, Action};
use crate::runtime::Runtime;

pub struct UpdateAction<'a, R: Runtime, I: PackageInstaller> {
    runtime: &'a R,
    installer: &'a I,
    project: Project,
}

impl<'a, R: Runtime, I: PackageInstaller> UpdateAction<'a, R, I> {
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

        let names = packages
            .iter()
            .map(|arg| arg.parse::<PackageRequest>().map(|request| request.name))
            .collect::<Result<Vec<_>, _>>()?;

        require_env(self.runtime, &self.project)?;

        let env = env_context(self.runtime, self.installer)?;
        let inspector = Inspector::new(self.installer);
        let installed = inspector.installed_versions()?;
        // An unreachable index aborts here, before any mutation.
        let outdated = inspector
            .outdated()?
            .into_iter()
            .map(|package| package.name)
            .collect();

        let scope = if names.is_empty() {
            None
        } else {
            Some(names.as_slice())
        };
        let plan = planner::plan_update(&manifest, scope, &env, &installed, &outdated)?;

        if plan.actions.is_empty() && plan.unmanaged.is_empty() {
            println!("Everything is up to date.");
        }

        for action in &plan.actions {
            let Action::Update { name, requirement } = action else {
                unreachable!("update plans only update");
            };
            println!("Updating {}", name);
            self.installer.upgrade(requirement)?;

            match Inspector::new(self.installer).installed_versions()?.get(name) {
                Some(concrete) => {
                    let pin = format!("~={}", concrete);
                    info!("Pinning {} = {}", name, pin);
                    manifest = manifest.pin_everywhere(name, &pin);
                    store.persist(&manifest)?;
                }
                None => warn!("{} vanished after update; leaving its pin alone", name),
            }
        }

        if !plan.unmanaged.is_empty() {
            for name in &plan.unmanaged {
                warn!("{} is not managed by the manifest", name);
            }
            return Err(PipitError::PackageNotManaged(plan.unmanaged.join(", ")).into());
        }
        Ok(())
    }
}
