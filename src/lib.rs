//! staticpack - staging-time compiler for static-content server instances
//!
//! This library turns a declarative `Staticfile` plus a directory of static
//! assets into a fully configured, launchable nginx instance for a single
//! deployment. It is invoked once per deployment during the platform's
//! application-build phase, never at request-serving time.
//!
//! # Core Concepts
//!
//! - **Detection**: a cheap, side-effect-free predicate the platform uses to
//!   decide whether this compiler applies to a source tree at all
//! - **Staticfile**: a line-oriented `key: value` configuration file with a
//!   closed, typed schema; unknown keys warn instead of failing
//! - **Staging pipeline**: a strictly sequential state machine that parses,
//!   validates, relocates assets, synthesizes the server configuration and
//!   composes the launch script, aggregating diagnostics into a single
//!   [`BuildOutcome`](pipeline::BuildOutcome)
//!
//! # Project Structure
//!
//! - [`staticfile`]: configuration parsing and the options schema
//! - [`nginx`]: server configuration synthesis from feature contributors
//! - [`pipeline`]: the staging orchestrator and its state machine

// Public modules
pub mod buildlog;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod detect;
pub mod error;
pub mod hooks;
pub mod launch;
pub mod nginx;
pub mod paths;
pub mod pipeline;
pub mod relocate;
pub mod staticfile;
pub mod util;

// Re-export key types for convenient access
pub use buildlog::BuildLog;
pub use config::PlatformEnv;
pub use credentials::Credentials;
pub use detect::{detect, DetectMode, Detection};
pub use error::BuildError;
pub use nginx::{GeneratedConfig, ServerConfigGenerator};
pub use paths::ResolvedRoot;
pub use pipeline::{BuildOutcome, StagingContext, StagingOrchestrator};
pub use staticfile::StaticConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Tag printed on stdout when detection succeeds
pub const DETECT_TAG: &str = "staticfile";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_staticpack() {
        assert_eq!(NAME, "staticpack");
    }
}
