//! Platform environment configuration.
//!
//! Every environment-derived input is captured here exactly once, at
//! construction time, and threaded explicitly through the orchestrator.
//! Inner components never read the process environment themselves.
//!
//! # Environment Variables
//!
//! - `CF_STACK`: execution-environment identifier; unsupported values
//!   fast-fail the whole run with the reserved exit code. Unset means a
//!   local/developer invocation and defaults to the newest supported stack.
//! - `BP_DEBUG`: any non-empty value enables additional diagnostic lines
//!   (feature summary, exact launch command)
//! - `FORCE_HTTPS`: any non-empty value enforces the HTTPS redirect even
//!   when the Staticfile does not request it
//! - `HTTP_PROXY` / `HTTPS_PROXY` / `NO_PROXY`: forwarded to hook
//!   subprocesses and any collaborator that performs network fetches
//! - `STATICPACK_HOOK_TIMEOUT`: hook execution bound in seconds
//! - `STATICPACK_NGINX_BIN`: explicit path to the nginx binary, overriding
//!   cache-directory resolution

use crate::error::BuildError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Stacks this compiler can produce output for.
pub const SUPPORTED_STACKS: &[&str] = &["cflinuxfs3", "cflinuxfs4"];

const DEFAULT_STACK: &str = "cflinuxfs4";
const DEFAULT_HOOK_TIMEOUT_SECS: u64 = 600;

/// Snapshot of all environment inputs for one staging run.
#[derive(Debug, Clone)]
pub struct PlatformEnv {
    /// Execution-environment identifier (`CF_STACK`)
    pub stack: String,

    /// Extra diagnostic verbosity (`BP_DEBUG`)
    pub debug: bool,

    /// HTTPS enforcement requested by the platform (`FORCE_HTTPS`)
    pub force_https: bool,

    /// Proxy settings forwarded to subprocesses and collaborators
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    pub no_proxy: Option<String>,

    /// Bound on each hook subprocess
    pub hook_timeout: Duration,

    /// Explicit nginx binary override
    pub nginx_bin: Option<PathBuf>,
}

impl Default for PlatformEnv {
    fn default() -> Self {
        Self {
            stack: DEFAULT_STACK.to_string(),
            debug: false,
            force_https: false,
            http_proxy: None,
            https_proxy: None,
            no_proxy: None,
            hook_timeout: Duration::from_secs(DEFAULT_HOOK_TIMEOUT_SECS),
            nginx_bin: None,
        }
    }
}

impl PlatformEnv {
    /// Captures the process environment. Called once, in the CLI handler.
    pub fn from_env() -> Self {
        let stack = env::var("CF_STACK")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_STACK.to_string());

        let hook_timeout = env::var("STATICPACK_HOOK_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_HOOK_TIMEOUT_SECS));

        Self {
            stack,
            debug: env_flag("BP_DEBUG"),
            force_https: env_flag("FORCE_HTTPS"),
            http_proxy: env::var("HTTP_PROXY").ok().filter(|s| !s.is_empty()),
            https_proxy: env::var("HTTPS_PROXY").ok().filter(|s| !s.is_empty()),
            no_proxy: env::var("NO_PROXY").ok().filter(|s| !s.is_empty()),
            hook_timeout,
            nginx_bin: env::var("STATICPACK_NGINX_BIN").ok().map(PathBuf::from),
        }
    }

    /// Fast-fail check for the execution environment. Runs before any other
    /// pipeline work and before any filesystem mutation.
    pub fn ensure_supported(&self) -> Result<(), BuildError> {
        if SUPPORTED_STACKS.contains(&self.stack.as_str()) {
            Ok(())
        } else {
            Err(BuildError::UnsupportedEnvironment(self.stack.clone()))
        }
    }

    /// Proxy variables as (name, value) pairs, for subprocess environments.
    pub fn proxy_vars(&self) -> Vec<(&'static str, &str)> {
        let mut vars = Vec::new();
        if let Some(v) = &self.http_proxy {
            vars.push(("HTTP_PROXY", v.as_str()));
        }
        if let Some(v) = &self.https_proxy {
            vars.push(("HTTPS_PROXY", v.as_str()));
        }
        if let Some(v) = &self.no_proxy {
            vars.push(("NO_PROXY", v.as_str()));
        }
        vars
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}
