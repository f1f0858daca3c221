//! Synchronization planning.
//!
//! Pure diffing: given the manifest, the installed state and the
//! environment context, produce the ordered list of actions a command
//! must hand to the installer. Nothing here touches the file system or
//! the environment, so every branch is unit-testable with in-memory
//! values.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use log::debug;

use crate::manifest::{DependencySpec, Group, Manifest};
use crate::marker::EnvContext;
use crate::version::VersionSpec;

/// One step of a synchronization plan, executed strictly in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Install `requirement` (a name, a constrained name, or a locator).
    Install { name: String, requirement: String },
    /// Upgrade to the newest version satisfying `requirement`.
    Update { name: String, requirement: String },
    /// Uninstall the named package.
    Uninstall { name: String },
}

impl Action {
    pub fn name(&self) -> &str {
        match self {
            Action::Install { name, .. }
            | Action::Update { name, .. }
            | Action::Uninstall { name } => name,
        }
    }
}

/// Plan for `update`, carrying per-package `PackageNotManaged` reports
/// alongside the actions so one bad name does not abort the rest.
#[derive(Debug, Default, PartialEq)]
pub struct UpdatePlan {
    pub actions: Vec<Action>,
    pub unmanaged: Vec<String>,
}

/// Plans `install` with no packages given: bring the environment up to
/// the manifest.
///
/// Entries that do not apply to `env` are skipped silently; a
/// cross-platform manifest must not fail on the "wrong" platform.
/// Version-control entries are always re-resolved through the installer,
/// since they cannot be checked without fetching.
pub fn plan_sync(
    manifest: &Manifest,
    dev: bool,
    env: &EnvContext,
    installed: &BTreeMap<String, String>,
) -> Result<Vec<Action>> {
    let mut actions = Vec::new();

    for group in scoped_groups(dev) {
        for (name, spec) in manifest.group(group) {
            if !spec.applies_to(env) {
                debug!("Skipping {} ({}): not applicable here", name, group.as_str());
                continue;
            }
            let version_spec = VersionSpec::parse(spec.version_str(), name)?;
            let requirement = version_spec.pip_requirement(name);

            match installed.get(name) {
                _ if matches!(version_spec, VersionSpec::Locator(_)) => {
                    actions.push(Action::Install {
                        name: name.clone(),
                        requirement,
                    });
                }
                None => {
                    actions.push(Action::Install {
                        name: name.clone(),
                        requirement,
                    });
                }
                Some(current) if version_spec.is_satisfied_by(current) => {
                    debug!("{} {} already satisfies {:?}", name, current, requirement);
                }
                Some(_) => {
                    actions.push(Action::Update {
                        name: name.clone(),
                        requirement,
                    });
                }
            }
        }
    }

    Ok(actions)
}

/// Plans `uninstall`: exactly one uninstall action per distinct name, in
/// the order given, even when the package sits in both groups.
pub fn plan_uninstall(names: &[String]) -> Vec<Action> {
    let mut seen = BTreeSet::new();
    names
        .iter()
        .map(|name| name.to_ascii_lowercase())
        .filter(|name| seen.insert(name.clone()))
        .map(|name| Action::Uninstall { name })
        .collect()
}

/// Plans `update`.
///
/// Candidates are manifest entries that are applicable, installed,
/// reported outdated by the index, and not version-controlled (changing
/// a locator ref requires an explicit `install`). With names given, the
/// candidate set is intersected with them and names absent from the
/// manifest are reported as unmanaged.
pub fn plan_update(
    manifest: &Manifest,
    names: Option<&[String]>,
    env: &EnvContext,
    installed: &BTreeMap<String, String>,
    outdated: &BTreeSet<String>,
) -> Result<UpdatePlan> {
    let mut updatable = BTreeSet::new();
    for group in Group::ALL {
        for (name, spec) in manifest.group(group) {
            if !spec.applies_to(env) {
                continue;
            }
            let version_spec = VersionSpec::parse(spec.version_str(), name)?;
            if matches!(version_spec, VersionSpec::Locator(_)) {
                debug!("Skipping {}: version-controlled entries need `install`", name);
                continue;
            }
            if installed.contains_key(name) && outdated.contains(name) {
                updatable.insert(name.clone());
            }
        }
    }

    let mut plan = UpdatePlan::default();
    match names {
        Some(names) => {
            let mut seen = BTreeSet::new();
            for name in names {
                let name = name.to_ascii_lowercase();
                if !seen.insert(name.clone()) {
                    continue;
                }
                if !manifest.contains(&name) {
                    plan.unmanaged.push(name);
                } else if updatable.contains(&name) {
                    plan.actions.push(Action::Update {
                        requirement: name.clone(),
                        name,
                    });
                }
            }
        }
        None => {
            // Manifest order, dependencies group first, without duplicates
            // for packages present in both groups.
            let mut seen = BTreeSet::new();
            for group in Group::ALL {
                for name in manifest.group(group).keys() {
                    if updatable.contains(name) && seen.insert(name.clone()) {
                        plan.actions.push(Action::Update {
                            name: name.clone(),
                            requirement: name.clone(),
                        });
                    }
                }
            }
        }
    }

    Ok(plan)
}

fn scoped_groups(dev: bool) -> Vec<Group> {
    if dev {
        vec![Group::Dependencies, Group::DevDependencies]
    } else {
        vec![Group::Dependencies]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(json: &str) -> Manifest {
        serde_json::from_str::<Manifest>(json).unwrap().normalized()
    }

    fn env() -> EnvContext {
        EnvContext::new("3.11", "posix")
    }

    fn installed(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(name, version)| (name.to_string(), version.to_string()))
            .collect()
    }

    fn outdated(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_sync_installs_missing_entries() {
        let manifest = manifest(r#"{"dependencies": {"flask": ">=1.0,<2.0", "requests": "*"}}"#);
        let actions = plan_sync(&manifest, false, &env(), &installed(&[])).unwrap();
        assert_eq!(
            actions,
            vec![
                Action::Install {
                    name: "flask".into(),
                    requirement: "flask>=1.0,<2.0".into()
                },
                Action::Install {
                    name: "requests".into(),
                    requirement: "requests".into()
                },
            ]
        );
    }

    #[test]
    fn test_sync_satisfied_entry_produces_no_action() {
        let manifest = manifest(r#"{"dependencies": {"pkg": ">=1.0,<2.0"}}"#);
        let actions = plan_sync(&manifest, false, &env(), &installed(&[("pkg", "1.5")])).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn test_sync_unsatisfied_entry_produces_update() {
        let manifest = manifest(r#"{"dependencies": {"pkg": ">=1.0,<2.0"}}"#);
        let actions = plan_sync(&manifest, false, &env(), &installed(&[("pkg", "2.1")])).unwrap();
        assert_eq!(
            actions,
            vec![Action::Update {
                name: "pkg".into(),
                requirement: "pkg>=1.0,<2.0".into()
            }]
        );
    }

    #[test]
    fn test_sync_any_version_only_needs_presence() {
        let manifest = manifest(r#"{"dependencies": {"pkg": "*"}}"#);
        let actions =
            plan_sync(&manifest, false, &env(), &installed(&[("pkg", "0.0.1")])).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn test_sync_skips_inapplicable_entries_silently() {
        let manifest = manifest(
            r#"{"dependencies": {
                "pywin32": {"system": "nt", "version": "*"},
                "old-only": {"python": "2.7"},
                "flask": "*"
            }}"#,
        );
        let actions = plan_sync(&manifest, false, &env(), &installed(&[])).unwrap();
        assert_eq!(
            actions,
            vec![Action::Install {
                name: "flask".into(),
                requirement: "flask".into()
            }]
        );
    }

    #[test]
    fn test_sync_dev_flag_widens_scope() {
        let manifest = manifest(
            r#"{"dependencies": {"flask": "*"}, "dev-dependencies": {"pytest": "*"}}"#,
        );
        let without_dev = plan_sync(&manifest, false, &env(), &installed(&[])).unwrap();
        assert_eq!(without_dev.len(), 1);

        let with_dev = plan_sync(&manifest, true, &env(), &installed(&[])).unwrap();
        assert_eq!(with_dev.len(), 2);
        assert_eq!(with_dev[1].name(), "pytest");
    }

    #[test]
    fn test_sync_locator_always_reinstalls() {
        let manifest = manifest(r#"{"dependencies": {"pkg": "git+https://host/repo.git@v2"}}"#);
        // Even when some version of pkg is installed.
        let actions = plan_sync(&manifest, false, &env(), &installed(&[("pkg", "1.0")])).unwrap();
        assert_eq!(
            actions,
            vec![Action::Install {
                name: "pkg".into(),
                requirement: "git+https://host/repo.git@v2#egg=pkg".into()
            }]
        );
    }

    #[test]
    fn test_sync_detailed_version_constraint() {
        let manifest = manifest(
            r#"{"dependencies": {"pkg": {"python": "3.11", "version": ">=2.0"}}}"#,
        );
        let actions = plan_sync(&manifest, false, &env(), &installed(&[("pkg", "1.0")])).unwrap();
        assert_eq!(
            actions,
            vec![Action::Update {
                name: "pkg".into(),
                requirement: "pkg>=2.0".into()
            }]
        );
    }

    #[test]
    fn test_sync_malformed_version_aborts_whole_plan() {
        let manifest = manifest(
            r#"{"dependencies": {"good": "*", "bad": "===1.0", "other": "*"}}"#,
        );
        assert!(plan_sync(&manifest, false, &env(), &installed(&[])).is_err());
    }

    #[test]
    fn test_uninstall_dedupes_names() {
        let actions = plan_uninstall(&["pkg".into(), "Other".into(), "PKG".into()]);
        assert_eq!(
            actions,
            vec![
                Action::Uninstall { name: "pkg".into() },
                Action::Uninstall {
                    name: "other".into()
                },
            ]
        );
    }

    #[test]
    fn test_update_all_intersects_installed_and_outdated() {
        let manifest = manifest(
            r#"{
                "dependencies": {"flask": "~=1.0", "requests": "*", "missing": "*"},
                "dev-dependencies": {"pytest": "~=7.0"}
            }"#,
        );
        let installed = installed(&[("flask", "1.0"), ("requests", "2.0"), ("pytest", "7.0")]);
        let plan = plan_update(
            &manifest,
            None,
            &env(),
            &installed,
            &outdated(&["flask", "pytest", "unrelated"]),
        )
        .unwrap();
        assert_eq!(
            plan.actions,
            vec![
                Action::Update {
                    name: "flask".into(),
                    requirement: "flask".into()
                },
                Action::Update {
                    name: "pytest".into(),
                    requirement: "pytest".into()
                },
            ]
        );
        assert!(plan.unmanaged.is_empty());
    }

    #[test]
    fn test_update_excludes_version_controlled_entries() {
        let manifest = manifest(
            r#"{"dependencies": {
                "pinned": "~=1.0",
                "vcs": "git+https://host/repo.git"
            }}"#,
        );
        let installed = installed(&[("pinned", "1.0"), ("vcs", "0.1")]);
        let plan = plan_update(
            &manifest,
            None,
            &env(),
            &installed,
            &outdated(&["pinned", "vcs"]),
        )
        .unwrap();
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].name(), "pinned");
    }

    #[test]
    fn test_update_named_unmanaged_is_reported_not_skipped() {
        let manifest = manifest(r#"{"dependencies": {"flask": "~=1.0"}}"#);
        let plan = plan_update(
            &manifest,
            Some(&["pkgx".to_string()]),
            &env(),
            &installed(&[("flask", "1.0")]),
            &outdated(&["flask"]),
        )
        .unwrap();
        assert!(plan.actions.is_empty());
        assert_eq!(plan.unmanaged, vec!["pkgx".to_string()]);
    }

    #[test]
    fn test_update_named_mixes_managed_and_unmanaged() {
        let manifest = manifest(r#"{"dependencies": {"flask": "~=1.0"}}"#);
        let plan = plan_update(
            &manifest,
            Some(&["pkgx".to_string(), "Flask".to_string()]),
            &env(),
            &installed(&[("flask", "1.0")]),
            &outdated(&["flask"]),
        )
        .unwrap();
        assert_eq!(
            plan.actions,
            vec![Action::Update {
                name: "flask".into(),
                requirement: "flask".into()
            }]
        );
        assert_eq!(plan.unmanaged, vec!["pkgx".to_string()]);
    }

    #[test]
    fn test_update_named_not_outdated_is_silently_skipped() {
        let manifest = manifest(r#"{"dependencies": {"flask": "~=1.0"}}"#);
        let plan = plan_update(
            &manifest,
            Some(&["flask".to_string()]),
            &env(),
            &installed(&[("flask", "1.0")]),
            &outdated(&[]),
        )
        .unwrap();
        assert!(plan.actions.is_empty());
        assert!(plan.unmanaged.is_empty());
    }

    #[test]
    fn test_update_package_in_both_groups_yields_one_action() {
        let manifest = manifest(
            r#"{"dependencies": {"flask": "~=1.0"}, "dev-dependencies": {"flask": "~=1.0"}}"#,
        );
        let plan = plan_update(
            &manifest,
            None,
            &env(),
            &installed(&[("flask", "1.0")]),
            &outdated(&["flask"]),
        )
        .unwrap();
        assert_eq!(plan.actions.len(), 1);
    }

    #[test]
    fn test_update_skips_inapplicable_entries() {
        let manifest = manifest(
            r#"{"dependencies": {"pywin32": {"system": "nt", "version": "~=1.0"}}}"#,
        );
        let plan = plan_update(
            &manifest,
            None,
            &env(),
            &installed(&[("pywin32", "1.0")]),
            &outdated(&["pywin32"]),
        )
        .unwrap();
        assert!(plan.actions.is_empty());
    }
}
