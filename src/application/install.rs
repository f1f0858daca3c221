//! Install use case.
//!
//! Two modes share one entry point: with no packages given, synchronize
//! the environment to the manifest; with packages given, install exactly
//! those and pin them into the manifest. The manifest is persisted after
//! every successful mutating action, so an interruption never loses more
//! than the in-flight action's update.

use anyhow::Result;
use log::{info, warn};

use crate::application::{PackageRequest, env_context, require_env};
use crate::manifest::{Group, Manifest, ManifestStore};
use crate::pip::{Inspector, PackageInstaller, Project};
use crate::planner::{self, Action};
use crate::runtime::Runtime;

pub struct InstallAction<'a, R: Runtime, I: PackageInstaller> {
    runtime: &'a R,
    installer: &'a I,
    project: Project,
}

impl<'a, R: Runtime, I: PackageInstaller> InstallAction<'a, R, I> {
    pub fn new(runtime: &'a R, installer: &'a I, project: Project) -> Self {
        Self {
            runtime,
            installer,
            project,
        }
    }

    pub fn run(&self, packages: &[String], dev: bool) -> Result<()> {
        let store = ManifestStore::new(self.runtime, self.project.manifest_path());
        let manifest = store.load()?;

        // Parse every request up front: a bad argument aborts the whole
        // command before anything is installed.
        let requests = packages
            .iter()
            .map(|arg| arg.parse::<PackageRequest>())
            .collect::<Result<Vec<_>, _>>()?;

        require_env(self.runtime, &self.project)?;

        if requests.is_empty() {
            self.sync(&manifest, dev)
        } else {
            self.install_named(&store, manifest, &requests, dev)
        }
    }

    /// `install` with no packages: bring the environment up to the manifest.
    fn sync(&self, manifest: &Manifest, dev: bool) -> Result<()> {
        let env = env_context(self.runtime, self.installer)?;
        let installed = Inspector::new(self.installer).installed_versions()?;
        let plan = planner::plan_sync(manifest, dev, &env, &installed)?;

        if plan.is_empty() {
            println!("Everything is in sync.");
            return Ok(());
        }

        for action in plan {
            match action {
                Action::Install { requirement, .. } => {
                    println!("Installing {}", requirement);
                    self.installer.install(&requirement)?;
                }
                Action::Update { requirement, .. } => {
                    println!("Updating {}", requirement);
                    self.installer.upgrade(&requirement)?;
                }
                Action::Uninstall { .. } => unreachable!("sync never uninstalls"),
            }
        }
        Ok(())
    }

    /// `install` with packages: install each and pin it into the manifest.
    fn install_named(
        &self,
        store: &ManifestStore<'a, R>,
        mut manifest: Manifest,
        requests: &[PackageRequest],
        dev: bool,
    ) -> Result<()> {
        let group = Group::for_dev(dev);

        for request in requests {
            let requirement = request.pip_argument();
            println!("Installing {}", requirement);
            self.installer.install(&requirement)?;

            let pin = match request.manifest_value() {
                Some(value) => Some(value),
                None => match Inspector::new(self.installer)
                    .installed_versions()?
                    .get(&request.name)
                {
                    Some(concrete) => Some(format!("~={}", concrete)),
                    None => {
                        warn!(
                            "{} reported installed but absent from the environment; not pinning",
                            request.name
                        );
                        None
                    }
                },
            };

            if let Some(version) = pin {
                info!("Pinning {} = {} in {}", request.name, version, group.as_str());
                manifest = manifest.pin(group, &request.name, &version);
                store.persist(&manifest)?;
            }
        }
        Ok(())
    }
}
