//! Project layout and environment provisioning.
//!
//! A pipit project is a directory holding `pipit.json` and an isolated
//! environment under `.pipit/`. Environment creation is delegated to an
//! external provisioner (virtualenv); the engine only derives paths and
//! checks for presence.

use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::PipitError;

/// Directory of the isolated environment, relative to the project root.
pub const ENV_DIR: &str = ".pipit";
/// Manifest file name, relative to the project root.
pub const MANIFEST_FILE: &str = "pipit.json";

/// Path layout of a single project.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn env_dir(&self) -> PathBuf {
        self.root.join(ENV_DIR)
    }

    /// The environment's executable directory (`bin` or `Scripts`).
    pub fn bin_dir(&self) -> PathBuf {
        let bin = if cfg!(windows) { "Scripts" } else { "bin" };
        self.env_dir().join(bin)
    }

    pub fn pip_path(&self) -> PathBuf {
        self.bin_dir().join(executable("pip"))
    }

    pub fn python_path(&self) -> PathBuf {
        self.bin_dir().join(executable("python"))
    }
}

fn executable(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

/// External environment provisioner.
#[cfg_attr(test, mockall::automock)]
pub trait Provisioner: Send + Sync {
    /// Creates an isolated environment rooted at `env_dir`.
    fn provision(&self, env_dir: &Path) -> Result<()>;
}

/// Provisions environments by invoking `virtualenv`.
pub struct VirtualenvProvisioner;

impl Provisioner for VirtualenvProvisioner {
    #[tracing::instrument(skip(self))]
    fn provision(&self, env_dir: &Path) -> Result<()> {
        debug!("Provisioning environment at {:?}", env_dir);
        let output = Command::new("virtualenv")
            .arg(env_dir)
            .output()
            .map_err(|err| PipitError::InstallerFailure {
                command: "virtualenv".to_string(),
                diagnostic: err.to_string(),
            })?;

        if !output.status.success() {
            return Err(PipitError::InstallerFailure {
                command: format!("virtualenv {}", env_dir.display()),
                diagnostic: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(())
    }
}
