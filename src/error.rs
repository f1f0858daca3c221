//! Error taxonomy for the synchronization engine.
//!
//! Parse-level errors abort a command before any mutation; per-action
//! installer failures abort the remaining plan but never roll back
//! already-persisted manifest updates.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for usage errors (clap's convention).
pub const EXIT_USAGE: i32 = 2;
/// Exit code for manifest and version-constraint errors.
pub const EXIT_MANIFEST: i32 = 3;
/// Exit code for environment and installer errors.
pub const EXIT_INSTALLER: i32 = 4;

#[derive(Error, Debug)]
pub enum PipitError {
    #[error("no manifest found at {}; run `pipit new` first", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("manifest {} is malformed: {reason}", .path.display())]
    ManifestMalformed { path: PathBuf, reason: String },

    #[error("invalid version string: {0:?}")]
    InvalidVersionFormat(String),

    #[error("unsupported operator {operator:?} in {input:?}")]
    UnsupportedOperator { operator: String, input: String },

    #[error("version control reference {0:?} has no #egg= identifier")]
    MissingEggIdentifier(String),

    #[error("subdirectory fragments are not supported: {0:?}")]
    UnsupportedSubdirectory(String),

    #[error("not managed by the manifest: {0}")]
    PackageNotManaged(String),

    #[error("package index is unreachable: {0}")]
    IndexUnavailable(String),

    #[error("environment {} does not exist; run `pipit new` first", .0.display())]
    EnvironmentMissing(PathBuf),

    #[error("{command} failed: {diagnostic}")]
    InstallerFailure { command: String, diagnostic: String },
}

impl PipitError {
    /// Maps the error to its process exit code class.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipitError::ManifestNotFound(_)
            | PipitError::ManifestMalformed { .. }
            | PipitError::InvalidVersionFormat(_)
            | PipitError::UnsupportedOperator { .. }
            | PipitError::MissingEggIdentifier(_)
            | PipitError::UnsupportedSubdirectory(_)
            | PipitError::PackageNotManaged(_) => EXIT_MANIFEST,
            PipitError::IndexUnavailable(_)
            | PipitError::EnvironmentMissing(_)
            | PipitError::InstallerFailure { .. } => EXIT_INSTALLER,
        }
    }
}
