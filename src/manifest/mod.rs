//! Dependency manifest model.
//!
//! A manifest is a persisted document with two named groups,
//! `dependencies` and `dev-dependencies`, each mapping a package name to
//! a dependency spec. The value type is immutable: every mutation returns
//! a new manifest, so callers never observe partial writes and the
//! planner can be tested with in-memory values.

mod store;

pub use store::ManifestStore;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::marker::{self, EnvContext};
use crate::version::ANY;

/// The two top-level dependency groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Dependencies,
    DevDependencies,
}

impl Group {
    /// Both groups, in document order.
    pub const ALL: [Group; 2] = [Group::Dependencies, Group::DevDependencies];

    /// The group targeted by a command's `--dev` flag.
    pub fn for_dev(dev: bool) -> Group {
        if dev {
            Group::DevDependencies
        } else {
            Group::Dependencies
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Dependencies => "dependencies",
            Group::DevDependencies => "dev-dependencies",
        }
    }
}

/// A dependency spec: either a bare version string or a structured record
/// with optional interpreter, OS-family and version constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    Version(String),
    Detailed(DetailedSpec),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailedSpec {
    /// Comma-separated exclusive interpreter-version tokens (`major.minor`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,
    /// Comma-separated exclusive OS-family tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl DependencySpec {
    /// The entry's version string; absent means any version.
    pub fn version_str(&self) -> &str {
        match self {
            DependencySpec::Version(version) => version,
            DependencySpec::Detailed(detailed) => detailed.version.as_deref().unwrap_or(ANY),
        }
    }

    /// Whether this entry applies to the given environment.
    pub fn applies_to(&self, env: &EnvContext) -> bool {
        match self {
            DependencySpec::Version(_) => true,
            DependencySpec::Detailed(detailed) => marker::applies(
                detailed.python.as_deref(),
                detailed.system.as_deref(),
                env,
            ),
        }
    }

    /// A copy with the version replaced, keeping any environment predicates.
    pub fn with_version(&self, version: &str) -> DependencySpec {
        match self {
            DependencySpec::Version(_) => DependencySpec::Version(version.to_string()),
            DependencySpec::Detailed(detailed) => DependencySpec::Detailed(DetailedSpec {
                version: Some(version.to_string()),
                ..detailed.clone()
            }),
        }
    }
}

pub type Entries = IndexMap<String, DependencySpec>;

/// The dependency manifest.
///
/// Unknown top-level fields are carried in `extra` and written back
/// verbatim so a rewrite never destroys user data. Group key order is
/// insertion order, preserved across load/persist.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub dependencies: Entries,
    #[serde(
        rename = "dev-dependencies",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub dev_dependencies: Entries,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Manifest {
    pub fn group(&self, group: Group) -> &Entries {
        match group {
            Group::Dependencies => &self.dependencies,
            Group::DevDependencies => &self.dev_dependencies,
        }
    }

    fn group_mut(&mut self, group: Group) -> &mut Entries {
        match group {
            Group::Dependencies => &mut self.dependencies,
            Group::DevDependencies => &mut self.dev_dependencies,
        }
    }

    pub fn get(&self, group: Group, name: &str) -> Option<&DependencySpec> {
        self.group(group).get(&name.to_ascii_lowercase())
    }

    /// Whether any group contains `name` (case-insensitive).
    pub fn contains(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        Group::ALL.iter().any(|group| self.group(*group).contains_key(&name))
    }

    /// The groups currently containing `name`.
    pub fn groups_containing(&self, name: &str) -> Vec<Group> {
        let name = name.to_ascii_lowercase();
        Group::ALL
            .into_iter()
            .filter(|group| self.group(*group).contains_key(&name))
            .collect()
    }

    /// Inserts or overwrites the entry for `name` in `group`.
    pub fn add_or_update(&self, group: Group, name: &str, spec: DependencySpec) -> Manifest {
        let mut next = self.clone();
        next.group_mut(group).insert(name.to_ascii_lowercase(), spec);
        next
    }

    /// Removes `name` from every group where present. Removing an absent
    /// name is a no-op.
    pub fn remove(&self, name: &str) -> Manifest {
        let name = name.to_ascii_lowercase();
        let mut next = self.clone();
        for group in Group::ALL {
            next.group_mut(group).shift_remove(&name);
        }
        next
    }

    /// Rewrites the version pin for `name` in `group`, preserving any
    /// environment predicates; inserts a plain entry when absent.
    pub fn pin(&self, group: Group, name: &str, version: &str) -> Manifest {
        let spec = match self.get(group, name) {
            Some(existing) => existing.with_version(version),
            None => DependencySpec::Version(version.to_string()),
        };
        self.add_or_update(group, name, spec)
    }

    /// Rewrites the version pin for `name` in every group containing it.
    pub fn pin_everywhere(&self, name: &str, version: &str) -> Manifest {
        self.groups_containing(name)
            .into_iter()
            .fold(self.clone(), |manifest, group| {
                manifest.pin(group, name, version)
            })
    }

    /// Normalizes group keys to lowercase; on collision the later entry wins.
    pub fn normalized(mut self) -> Manifest {
        for group in Group::ALL {
            let entries = std::mem::take(self.group_mut(group));
            *self.group_mut(group) = entries
                .into_iter()
                .map(|(name, spec)| (name.to_ascii_lowercase(), spec))
                .collect();
        }
        self
    }
}
