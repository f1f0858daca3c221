//! New-project use case.
//!
//! Provisions the isolated environment (if absent) through the external
//! provisioner and creates an empty manifest (if absent). Both steps are
//! idempotent; re-running `new` never destroys existing state.

use anyhow::Result;
use log::info;
use std::path::PathBuf;

use crate::manifest::ManifestStore;
use crate::pip::{Project, Provisioner};
use crate::runtime::Runtime;

pub struct NewAction<'a, R: Runtime, P: Provisioner> {
    runtime: &'a R,
    provisioner: &'a P,
}

impl<'a, R: Runtime, P: Provisioner> NewAction<'a, R, P> {
    pub fn new(runtime: &'a R, provisioner: &'a P) -> Self {
        Self {
            runtime,
            provisioner,
        }
    }

    pub fn run(&self, path: Option<PathBuf>) -> Result<Project> {
        let root = match path {
            Some(path) => path,
            None => self.runtime.current_dir()?,
        };
        let project = Project::new(root);

        if !self.runtime.exists(project.root()) {
            self.runtime.create_dir_all(project.root())?;
        }

        let env_dir = project.env_dir();
        if self.runtime.is_dir(&env_dir) {
            info!("Environment {:?} already exists", env_dir);
        } else {
            println!("Creating environment at {}", env_dir.display());
            self.provisioner.provision(&env_dir)?;
        }

        let store = ManifestStore::new(self.runtime, project.manifest_path());
        if store.init()? {
            println!("Created {}", store.path().display());
        }
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pip::MockProvisioner;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    #[test]
    fn test_new_provisions_env_and_creates_manifest() {
        let mut runtime = MockRuntime::new();
        let root = PathBuf::from("/project");
        runtime
            .expect_exists()
            .with(eq(root.clone()))
            .returning(|_| true);
        runtime
            .expect_is_dir()
            .with(eq(PathBuf::from("/project/.pipit")))
            .returning(|_| false);
        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/project/pipit.json")))
            .returning(|_| false);
        runtime
            .expect_write()
            .withf(|path, contents| {
                path.ends_with("pipit.json.tmp")
                    && std::str::from_utf8(contents).unwrap().trim() == "{}"
            })
            .times(1)
            .returning(|_, _| Ok(()));
        runtime.expect_rename().times(1).returning(|_, _| Ok(()));

        let mut provisioner = MockProvisioner::new();
        provisioner
            .expect_provision()
            .with(eq(PathBuf::from("/project/.pipit")))
            .times(1)
            .returning(|_| Ok(()));

        let action = NewAction::new(&runtime, &provisioner);
        let project = action.run(Some(root)).unwrap();
        assert_eq!(project.root(), PathBuf::from("/project"));
    }

    #[test]
    fn test_new_is_idempotent() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);
        runtime.expect_is_dir().returning(|_| true);
        // Existing env and manifest: no provisioning, no writes.

        let provisioner = MockProvisioner::new();
        let action = NewAction::new(&runtime, &provisioner);
        action.run(Some(PathBuf::from("/project"))).unwrap();
    }

    #[test]
    fn test_new_defaults_to_current_directory() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_current_dir()
            .returning(|| Ok(PathBuf::from("/cwd")));
        runtime.expect_exists().returning(|_| true);
        runtime.expect_is_dir().returning(|_| true);

        let provisioner = MockProvisioner::new();
        let action = NewAction::new(&runtime, &provisioner);
        let project = action.run(None).unwrap();
        assert_eq!(project.root(), PathBuf::from("/cwd"));
    }
}
