//! Version-control locators.
//!
//! A locator names a package by repository instead of by index version:
//! `{scheme}+{url}[@{ref}][#egg={name}]`. Manifest entries store the
//! locator without an egg fragment (the map key is the name); command-line
//! arguments must carry one so the package name is derivable without
//! invoking the installer.

use std::fmt;
use std::str::FromStr;

use crate::error::PipitError;

/// Supported version-control schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsScheme {
    Git,
    Hg,
    Svn,
    Bzr,
}

impl VcsScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            VcsScheme::Git => "git",
            VcsScheme::Hg => "hg",
            VcsScheme::Svn => "svn",
            VcsScheme::Bzr => "bzr",
        }
    }
}

impl FromStr for VcsScheme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "git" => Ok(VcsScheme::Git),
            "hg" => Ok(VcsScheme::Hg),
            "svn" => Ok(VcsScheme::Svn),
            "bzr" => Ok(VcsScheme::Bzr),
            _ => Err(()),
        }
    }
}

/// A parsed version-control locator.
#[derive(Debug, Clone, PartialEq)]
pub struct VcsLocator {
    pub scheme: VcsScheme,
    pub url: String,
    /// Branch, tag or revision after the last `@`, if any.
    pub reference: Option<String>,
    /// Resolved package name.
    pub egg: String,
}

impl VcsLocator {
    /// Parses a command-line locator argument. The `#egg=` fragment is
    /// mandatory here; `MissingEggIdentifier` otherwise.
    pub fn parse(input: &str) -> Result<VcsLocator, PipitError> {
        let (base, fragment) = split_fragment(input);
        let egg = parse_fragment(fragment, input)?
            .ok_or_else(|| PipitError::MissingEggIdentifier(input.to_string()))?;
        Self::parse_base(base, &egg, input)
    }

    /// Parses a manifest value, taking the package name from the entry key.
    pub fn parse_with_name(input: &str, name: &str) -> Result<VcsLocator, PipitError> {
        let (base, fragment) = split_fragment(input);
        // An egg fragment in the manifest is tolerated but the entry key wins.
        parse_fragment(fragment, input)?;
        Self::parse_base(base, name, input)
    }

    fn parse_base(base: &str, egg: &str, input: &str) -> Result<VcsLocator, PipitError> {
        let (scheme_str, rest) = base
            .split_once('+')
            .ok_or_else(|| PipitError::InvalidVersionFormat(input.to_string()))?;
        let scheme = scheme_str
            .parse::<VcsScheme>()
            .map_err(|_| PipitError::InvalidVersionFormat(input.to_string()))?;
        if rest.is_empty() {
            return Err(PipitError::InvalidVersionFormat(input.to_string()));
        }

        // An `@` only names a revision when it follows the last path
        // separator, so `ssh://git@host/repo.git` keeps its user part.
        let (url, reference) = match rest.rfind('@') {
            Some(at) if at > rest.rfind('/').unwrap_or(0) => {
                let reference = &rest[at + 1..];
                if reference.is_empty() {
                    return Err(PipitError::InvalidVersionFormat(input.to_string()));
                }
                (&rest[..at], Some(reference.to_string()))
            }
            _ => (rest, None),
        };

        Ok(VcsLocator {
            scheme,
            url: url.to_string(),
            reference,
            egg: egg.to_string(),
        })
    }

    /// The requirement string handed to the installer.
    pub fn pip_requirement(&self) -> String {
        format!("{}#egg={}", self.manifest_value(), self.egg)
    }

    /// The locator as stored in a manifest entry (no egg fragment).
    pub fn manifest_value(&self) -> String {
        match &self.reference {
            Some(reference) => format!("{}+{}@{}", self.scheme.as_str(), self.url, reference),
            None => format!("{}+{}", self.scheme.as_str(), self.url),
        }
    }
}

impl fmt::Display for VcsLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pip_requirement())
    }
}

fn split_fragment(input: &str) -> (&str, Option<&str>) {
    match input.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (input, None),
    }
}

/// Extracts the egg name from a `#egg=name[&key=value...]` fragment.
/// A `subdirectory=` parameter is rejected: the manifest cannot express it.
fn parse_fragment(fragment: Option<&str>, input: &str) -> Result<Option<String>, PipitError> {
    let Some(fragment) = fragment else {
        return Ok(None);
    };

    let mut egg = None;
    for param in fragment.split('&') {
        match param.split_once('=') {
            Some(("subdirectory", _)) => {
                return Err(PipitError::UnsupportedSubdirectory(input.to_string()));
            }
            Some(("egg", name)) if !name.is_empty() => {
                egg = Some(name.to_ascii_lowercase());
            }
            _ => {}
        }
    }
    Ok(egg)
}
