//! Staging context: everything one invocation owns.

use crate::buildlog::BuildLog;
use crate::config::PlatformEnv;
use crate::credentials::Credentials;
use crate::detect::DetectMode;
use crate::launch::LaunchPlan;
use crate::nginx::GeneratedConfig;
use crate::paths::ResolvedRoot;
use crate::staticfile::StaticConfig;
use std::path::PathBuf;

/// Mutable state threaded through the pipeline stages. Each invocation owns
/// an isolated build directory; nothing here is shared across invocations.
pub struct StagingContext {
    pub build_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub env: PlatformEnv,
    pub mode: DetectMode,
    pub start_command: Option<String>,
    pub log: BuildLog,

    // Facts accumulated as stages complete.
    pub config: Option<StaticConfig>,
    pub resolved_root: Option<ResolvedRoot>,
    pub credentials: Option<Credentials>,
    /// Captured before relocation mutates the tree.
    pub override_conf_present: bool,
    pub generated: Option<GeneratedConfig>,
    pub launch: Option<LaunchPlan>,
}

impl StagingContext {
    pub fn new(
        build_dir: PathBuf,
        cache_dir: PathBuf,
        env: PlatformEnv,
        mode: DetectMode,
        start_command: Option<String>,
    ) -> Self {
        let log = BuildLog::new(env.debug);
        Self {
            build_dir,
            cache_dir,
            env,
            mode,
            start_command,
            log,
            config: None,
            resolved_root: None,
            credentials: None,
            override_conf_present: false,
            generated: None,
            launch: None,
        }
    }

    /// Same context with a recording-only log. Used by tests.
    pub fn silent(
        build_dir: PathBuf,
        cache_dir: PathBuf,
        env: PlatformEnv,
        mode: DetectMode,
    ) -> Self {
        let log = BuildLog::silent(env.debug);
        Self {
            log,
            ..Self::new(build_dir, cache_dir, env, mode, None)
        }
    }
}
