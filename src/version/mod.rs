//! Version constraint model.
//!
//! This module provides parsing and evaluation of version strings as they
//! appear in manifest entries and on the command line: PEP-440-style
//! specifier sets and version-control locators. Everything here is pure,
//! deterministic and free of I/O.

mod locator;
mod specifier;

pub use locator::{VcsLocator, VcsScheme};
pub use specifier::{Operator, Specifier, SpecifierSet};

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::PipitError;

/// The wildcard version string matching any version.
pub const ANY: &str = "*";

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^v?(?P<release>\d+(?:\.\d+)*)(?:[._-]?(?P<pretag>a|alpha|b|beta|c|rc|pre|preview)[._-]?(?P<prenum>\d*))?(?:[._-]?post[._-]?(?P<postnum>\d*))?(?:[._-]?dev[._-]?(?P<devnum>\d*))?$",
    )
    .expect("version pattern is valid")
});

/// A concrete package version.
///
/// Covers the practically-relevant subset of PEP 440: dotted numeric
/// release segments, pre-release suffixes (`a`/`b`/`rc` and their
/// aliases), `.postN` and `.devN` segments. At equal release the ordering
/// is dev < pre < final < post.
#[derive(Debug, Clone)]
pub struct Version {
    release: Vec<u64>,
    pre: Option<(PreTag, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
}

// Equality follows ordering, so trailing zero segments do not matter:
// `1.0` == `1.0.0`.
impl PartialEq for Version {
    fn eq(&self, other: &Version) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PreTag {
    Alpha,
    Beta,
    Rc,
}

impl PreTag {
    fn parse(tag: &str) -> PreTag {
        match tag.to_ascii_lowercase().as_str() {
            "a" | "alpha" => PreTag::Alpha,
            "b" | "beta" => PreTag::Beta,
            _ => PreTag::Rc,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            PreTag::Alpha => "a",
            PreTag::Beta => "b",
            PreTag::Rc => "rc",
        }
    }
}

impl Version {
    /// Parses a concrete version string.
    pub fn parse(input: &str) -> Result<Version, PipitError> {
        let trimmed = input.trim();
        let caps = VERSION_RE
            .captures(trimmed)
            .ok_or_else(|| PipitError::InvalidVersionFormat(input.to_string()))?;

        let release = caps["release"]
            .split('.')
            .map(|seg| {
                seg.parse::<u64>()
                    .map_err(|_| PipitError::InvalidVersionFormat(input.to_string()))
            })
            .collect::<Result<Vec<u64>, _>>()?;

        let num = |name: &str| -> Option<u64> {
            caps.name(name)
                .map(|m| m.as_str().parse::<u64>().unwrap_or(0))
        };

        Ok(Version {
            release,
            pre: caps
                .name("pretag")
                .map(|tag| (PreTag::parse(tag.as_str()), num("prenum").unwrap_or(0))),
            post: num("postnum"),
            dev: num("devnum"),
        })
    }

    /// Release segments, e.g. `[1, 4, 2]` for `1.4.2`.
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// Release segment at `index`, treating missing trailing segments as zero.
    fn segment(&self, index: usize) -> u64 {
        self.release.get(index).copied().unwrap_or(0)
    }

    /// Whether the release segments start with `prefix` (wildcard match).
    ///
    /// The comparison is segment-wise, so `1.4.*` matches `1.4.2` but not
    /// `1.40.0`.
    pub fn release_starts_with(&self, prefix: &[u64]) -> bool {
        prefix
            .iter()
            .enumerate()
            .all(|(i, &seg)| self.segment(i) == seg)
    }

    fn phase(&self) -> u8 {
        if self.post.is_some() {
            3
        } else if self.pre.is_some() {
            1
        } else if self.dev.is_some() {
            0
        } else {
            2
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Version) -> Ordering {
        let len = self.release.len().max(other.release.len());
        for i in 0..len {
            match self.segment(i).cmp(&other.segment(i)) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }

        (self.phase(), self.pre, self.post, self.dev.is_none(), self.dev).cmp(&(
            other.phase(),
            other.pre,
            other.post,
            other.dev.is_none(),
            other.dev,
        ))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Version) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let release = self
            .release
            .iter()
            .map(|seg| seg.to_string())
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{}", release)?;
        if let Some((tag, num)) = &self.pre {
            write!(f, "{}{}", tag.as_str(), num)?;
        }
        if let Some(num) = self.post {
            write!(f, ".post{}", num)?;
        }
        if let Some(num) = self.dev {
            write!(f, ".dev{}", num)?;
        }
        Ok(())
    }
}

static LOCATOR_LIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*\+").expect("locator pattern is valid"));

/// A parsed manifest `version` string.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionSpec {
    /// `*` or absent: any version is acceptable.
    Any,
    /// A PEP-440-style specifier set.
    Specifiers(SpecifierSet),
    /// A version-control locator; the entry name supplies the egg.
    Locator(VcsLocator),
}

impl VersionSpec {
    /// Parses a manifest version string for the entry named `name`.
    ///
    /// `name` becomes the locator egg identifier, since manifest entries
    /// carry their package name as the map key.
    pub fn parse(input: &str, name: &str) -> Result<VersionSpec, PipitError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == ANY {
            return Ok(VersionSpec::Any);
        }
        if LOCATOR_LIKE_RE.is_match(trimmed) {
            return VcsLocator::parse_with_name(trimmed, name).map(VersionSpec::Locator);
        }
        SpecifierSet::parse(trimmed).map(VersionSpec::Specifiers)
    }

    /// Whether an installed version satisfies this spec without any action.
    ///
    /// Locators always report `false`: they cannot be checked without
    /// re-invoking the installer.
    pub fn is_satisfied_by(&self, installed: &str) -> bool {
        match self {
            VersionSpec::Any => true,
            VersionSpec::Specifiers(set) => set.is_satisfied_by(installed),
            VersionSpec::Locator(_) => false,
        }
    }

    /// Formats the requirement string handed to the installer for `name`.
    pub fn pip_requirement(&self, name: &str) -> String {
        match self {
            VersionSpec::Any => name.to_string(),
            VersionSpec::Specifiers(set) => format!("{}{}", name, set),
            VersionSpec::Locator(locator) => locator.pip_requirement(),
        }
    }
}
