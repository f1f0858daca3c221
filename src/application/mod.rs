//! Application layer: one use case per command.
//!
//! Each action wires the manifest store, the planner and the installer
//! bridge together. Actions are generic over the [`Runtime`] and
//! [`PackageInstaller`] seams so every flow is testable with mocks.

mod install;
mod list;
mod new;
mod request;
mod uninstall;
mod update;

pub use install::InstallAction;
pub use list::{ListAction, PackageStatus};
pub use new::NewAction;
pub use request::{PackageRequest, RequestedSpec};
pub use uninstall::UninstallAction;
pub use update::UpdateAction;

use anyhow::Result;

use crate::error::PipitError;
use crate::marker::EnvContext;
use crate::pip::{PackageInstaller, Project};
use crate::runtime::Runtime;

/// Environment presence check performed before any installer delegation.
pub(crate) fn require_env<R: Runtime>(runtime: &R, project: &Project) -> Result<()> {
    let env_dir = project.env_dir();
    if !runtime.is_dir(&env_dir) {
        return Err(PipitError::EnvironmentMissing(env_dir).into());
    }
    Ok(())
}

/// Builds the predicate-evaluation context from the live environment.
pub(crate) fn env_context<R: Runtime, I: PackageInstaller>(
    runtime: &R,
    installer: &I,
) -> Result<EnvContext> {
    let interpreter = installer.interpreter_version()?;
    Ok(EnvContext::new(interpreter, runtime.os_family()))
}
