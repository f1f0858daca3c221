//! Installed-state inspection.
//!
//! Normalizes the installer's JSON reports into installed-package
//! records. The environment itself is the source of truth for what is
//! installed; nothing here is ever cached across invocations.

use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::PipitError;
use crate::pip::PackageInstaller;

/// A currently installed package.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
}

/// An installed package the index reports a newer version for.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutdatedPackage {
    pub name: String,
    pub version: String,
    pub latest_version: String,
}

/// Queries the active environment through the installer bridge.
pub struct Inspector<'a, I: PackageInstaller> {
    installer: &'a I,
}

impl<'a, I: PackageInstaller> Inspector<'a, I> {
    pub fn new(installer: &'a I) -> Self {
        Self { installer }
    }

    /// All installed packages, names lowercased.
    pub fn installed(&self) -> Result<Vec<InstalledPackage>> {
        let raw = self.installer.list_json(false)?;
        let mut packages: Vec<InstalledPackage> = serde_json::from_str(&raw)?;
        for package in &mut packages {
            package.name = package.name.to_ascii_lowercase();
        }
        Ok(packages)
    }

    /// Installed packages as a name -> version map.
    pub fn installed_versions(&self) -> Result<BTreeMap<String, String>> {
        Ok(self
            .installed()?
            .into_iter()
            .map(|package| (package.name, package.version))
            .collect())
    }

    /// Outdated packages, names lowercased.
    ///
    /// Any failure here is an index failure: the underlying query has to
    /// consult the package index, so errors surface as `IndexUnavailable`.
    pub fn outdated(&self) -> Result<Vec<OutdatedPackage>> {
        let raw = self
            .installer
            .list_json(true)
            .map_err(|err| PipitError::IndexUnavailable(format!("{:#}", err)))?;
        let mut packages: Vec<OutdatedPackage> = serde_json::from_str(&raw)
            .map_err(|err| PipitError::IndexUnavailable(err.to_string()))?;
        for package in &mut packages {
            package.name = package.name.to_ascii_lowercase();
        }
        Ok(packages)
    }
}
