//! Command-line package request parsing.
//!
//! `pipit install flask`, `pipit install "flask>=2.0"` and
//! `pipit install git+https://host/repo.git#egg=pkg` all become a
//! [`PackageRequest`]: the package name plus what was asked for. Parse
//! errors abort the command before anything is installed.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::PipitError;
use crate::version::{SpecifierSet, VcsLocator};

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[A-Za-z0-9][A-Za-z0-9._-]*)(?P<constraint>.*)$")
        .expect("request pattern is valid")
});

static LOCATOR_LIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*\+").expect("locator pattern is valid"));

/// A package named on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageRequest {
    /// Lowercased package name.
    pub name: String,
    pub spec: RequestedSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestedSpec {
    /// Bare name: latest compatible version, pinned after the fact.
    Latest,
    /// An explicit constraint, kept for the manifest pin.
    Specifiers { set: SpecifierSet, raw: String },
    Locator(VcsLocator),
}

impl PackageRequest {
    /// The requirement string handed to the installer.
    pub fn pip_argument(&self) -> String {
        match &self.spec {
            RequestedSpec::Latest => self.name.clone(),
            RequestedSpec::Specifiers { set, .. } => format!("{}{}", self.name, set),
            RequestedSpec::Locator(locator) => locator.pip_requirement(),
        }
    }

    /// The version string pinned into the manifest, when the request
    /// itself determines one. A bare name pins nothing here; its pin is
    /// derived from the concrete installed version afterwards.
    pub fn manifest_value(&self) -> Option<String> {
        match &self.spec {
            RequestedSpec::Latest => None,
            RequestedSpec::Specifiers { raw, .. } => Some(raw.clone()),
            RequestedSpec::Locator(locator) => Some(locator.manifest_value()),
        }
    }
}

impl FromStr for PackageRequest {
    type Err = PipitError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if LOCATOR_LIKE_RE.is_match(trimmed) {
            let locator = VcsLocator::parse(trimmed)?;
            return Ok(PackageRequest {
                name: locator.egg.clone(),
                spec: RequestedSpec::Locator(locator),
            });
        }

        let caps = NAME_RE
            .captures(trimmed)
            .ok_or_else(|| PipitError::InvalidVersionFormat(input.to_string()))?;
        let name = caps["name"].to_ascii_lowercase();
        let constraint = caps["constraint"].trim();

        if constraint.is_empty() {
            return Ok(PackageRequest {
                name,
                spec: RequestedSpec::Latest,
            });
        }

        let set = SpecifierSet::parse(constraint)?;
        // `pkg==1.2` pins `1.2`, the bare exact form.
        let raw = constraint.trim_matches('=').trim().to_string();
        Ok(PackageRequest {
            name,
            spec: RequestedSpec::Specifiers { set, raw },
        })
    }
}

impl fmt::Display for PackageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pip_argument())
    }
}
