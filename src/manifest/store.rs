//! Manifest persistence.
//!
//! Loads and saves `pipit.json` through the [`Runtime`] seam. Writes go
//! to a temporary file first and are renamed into place, so a crash
//! mid-write never corrupts the manifest.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::error::PipitError;
use crate::manifest::Manifest;
use crate::runtime::Runtime;

pub struct ManifestStore<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
}

impl<'a, R: Runtime> ManifestStore<'a, R> {
    pub fn new(runtime: &'a R, path: PathBuf) -> Self {
        Self { runtime, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.runtime.exists(&self.path)
    }

    /// Loads the manifest, normalizing package names to lowercase.
    pub fn load(&self) -> Result<Manifest> {
        if !self.exists() {
            return Err(PipitError::ManifestNotFound(self.path.clone()).into());
        }
        let content = self.runtime.read_to_string(&self.path)?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|err| PipitError::ManifestMalformed {
                path: self.path.clone(),
                reason: err.to_string(),
            })?;
        Ok(manifest.normalized())
    }

    /// Creates an empty manifest if none exists. Returns whether a file
    /// was created; an existing manifest is never overwritten.
    pub fn init(&self) -> Result<bool> {
        if self.exists() {
            return Ok(false);
        }
        self.persist(&Manifest::default())?;
        Ok(true)
    }

    /// Writes the manifest back atomically, preserving key order.
    pub fn persist(&self, manifest: &Manifest) -> Result<()> {
        let mut content = serde_json::to_string_pretty(manifest)?;
        content.push('\n');

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        self.runtime.write(&tmp, content.as_bytes())?;
        self.runtime.rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{DependencySpec, Group};
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_manifest() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/project/pipit.json");
        runtime
            .expect_exists()
            .with(eq(path.clone()))
            .returning(|_| false);

        let store = ManifestStore::new(&runtime, path);
        let err = store.load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipitError>(),
            Some(PipitError::ManifestNotFound(_))
        ));
    }

    #[test]
    fn test_load_malformed_manifest() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/project/pipit.json");
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(path.clone()))
            .returning(|_| Ok("{not json".to_string()));

        let store = ManifestStore::new(&runtime, path);
        let err = store.load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipitError>(),
            Some(PipitError::ManifestMalformed { .. })
        ));
    }

    #[test]
    fn test_load_rejects_unknown_per_package_fields() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/project/pipit.json");
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_read_to_string()
            .returning(|_| Ok(r#"{"dependencies": {"flask": {"os": "nt"}}}"#.to_string()));

        let store = ManifestStore::new(&runtime, path);
        assert!(matches!(
            store.load().unwrap_err().downcast_ref::<PipitError>(),
            Some(PipitError::ManifestMalformed { .. })
        ));
    }

    #[test]
    fn test_load_normalizes_names() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/project/pipit.json");
        runtime.expect_exists().returning(|_| true);
        runtime
            .expect_read_to_string()
            .returning(|_| Ok(r#"{"dependencies": {"Flask": "*"}}"#.to_string()));

        let store = ManifestStore::new(&runtime, path);
        let manifest = store.load().unwrap();
        assert!(manifest.get(Group::Dependencies, "flask").is_some());
    }

    #[test]
    fn test_persist_writes_temp_then_renames() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/project/pipit.json");
        let tmp = PathBuf::from("/project/pipit.json.tmp");

        runtime
            .expect_write()
            .withf(move |p, contents| {
                p == tmp && std::str::from_utf8(contents).unwrap().ends_with('\n')
            })
            .returning(|_, _| Ok(()));
        runtime
            .expect_rename()
            .with(
                eq(PathBuf::from("/project/pipit.json.tmp")),
                eq(path.clone()),
            )
            .returning(|_, _| Ok(()));

        let store = ManifestStore::new(&runtime, path);
        store.persist(&Manifest::default()).unwrap();
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipit.json");
        let store = ManifestStore::new(&runtime, path.clone());

        let manifest = Manifest::default()
            .add_or_update(
                Group::Dependencies,
                "flask",
                DependencySpec::Version(">=1.0,<2.0".into()),
            )
            .add_or_update(
                Group::DevDependencies,
                "pytest",
                DependencySpec::Version("~=7.0".into()),
            );
        store.persist(&manifest).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, manifest);
        store.persist(&loaded).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_groups_are_dropped_from_document() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipit.json");
        let store = ManifestStore::new(&runtime, path.clone());

        let manifest = Manifest::default().add_or_update(
            Group::Dependencies,
            "flask",
            DependencySpec::Version("*".into()),
        );
        store.persist(&manifest.remove("flask")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("dependencies"));
        assert_eq!(content.trim(), "{}");
    }

    #[test]
    fn test_init_creates_once() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let path = dir.path().join("pipit.json");
        let store = ManifestStore::new(&runtime, path.clone());

        assert!(store.init().unwrap());
        std::fs::write(&path, r#"{"dependencies": {"flask": "*"}}"#).unwrap();
        // A second init must not clobber the existing manifest.
        assert!(!store.init().unwrap());
        assert!(store.load().unwrap().contains("flask"));
    }
}
