//! The closed error taxonomy for a staging run.
//!
//! Every fatal error maps to a distinct, stable exit code so that calling
//! tooling can branch on it. Exit codes must never change across versions.

use std::path::PathBuf;
use thiserror::Error;

/// Reserved exit code for an unsupported execution environment. Used for no
/// other condition.
pub const EXIT_UNSUPPORTED_ENVIRONMENT: i32 = 44;

/// Errors that abort a staging run. All are fatal; none are retried.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("stack `{0}` is not supported by this buildpack")]
    UnsupportedEnvironment(String),

    #[error("missing configuration file: no Staticfile found in {}", .0.display())]
    MissingConfiguration(PathBuf),

    #[error("unable to read Staticfile: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    InvalidRoot(#[from] RootError),

    #[error("invalid Staticfile.auth: {0}")]
    InvalidCredentials(String),

    #[error("hook `{hook}` failed: {detail}")]
    HookFailure { hook: String, detail: String },

    #[error("unable to provide server runtime: {0}")]
    DependencyFetch(String),

    #[error("conflicting configuration directives: {0}")]
    ConfigurationConflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Root-directory validation failures. Messages name the configured value,
/// never the absolute resolution, so users can match them to their
/// Staticfile.
#[derive(Debug, Error)]
pub enum RootError {
    #[error("the application Staticfile specifies a root directory `{0}` that does not exist")]
    NotFound(String),

    #[error("the application Staticfile specifies a root directory `{0}` that is a plain file, but was expected to be a directory")]
    NotDirectory(String),

    #[error("the application Staticfile specifies a root directory `{0}` that escapes the application directory")]
    EscapesSourceTree(String),
}

impl BuildError {
    /// The stable exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::UnsupportedEnvironment(_) => EXIT_UNSUPPORTED_ENVIRONMENT,
            BuildError::MissingConfiguration(_) => 10,
            BuildError::InvalidConfiguration(_) => 11,
            BuildError::InvalidRoot(_) => 12,
            BuildError::InvalidCredentials(_) => 13,
            BuildError::HookFailure { .. } => 14,
            BuildError::DependencyFetch(_) => 15,
            BuildError::ConfigurationConflict(_) => 16,
            BuildError::Internal(_) => 20,
        }
    }
}
