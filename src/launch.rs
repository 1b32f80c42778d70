//! Launch composition.
//!
//! The final pipeline stage writes the launch script and decides the
//! runtime start command. Downloading the nginx runtime is the platform's
//! job; this stage only resolves which binary the script will exec and
//! fails as `DependencyFetch` when an explicitly configured runtime is
//! absent.

use crate::buildlog::BuildLog;
use crate::config::PlatformEnv;
use crate::error::BuildError;
use crate::nginx::data::BOOT_SCRIPT;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

pub const BOOT_SCRIPT_NAME: &str = "boot.sh";

/// The runtime launch instruction handed back to the platform.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub command: String,
    pub custom: bool,
}

pub struct LaunchComposer<'a> {
    pub build_dir: &'a Path,
    pub cache_dir: &'a Path,
    pub env: &'a PlatformEnv,
    pub log: &'a BuildLog,
}

impl<'a> LaunchComposer<'a> {
    pub fn compose(&self, start_command: Option<&str>) -> Result<LaunchPlan, BuildError> {
        let nginx_bin = self.resolve_nginx()?;
        self.write_boot_script(&nginx_bin)?;

        let plan = match start_command {
            Some(command) if !command.trim().is_empty() => {
                self.log
                    .begin_step(format!("Using custom start command: {}", command));
                LaunchPlan {
                    command: command.to_string(),
                    custom: true,
                }
            }
            _ => LaunchPlan {
                command: format!("$HOME/{}", BOOT_SCRIPT_NAME),
                custom: false,
            },
        };

        self.log
            .debug(format!("launch command: {}", plan.command));

        Ok(plan)
    }

    /// Resolution order: explicit override, then the dependency cache the
    /// platform's installer populates, then `nginx` on the runtime PATH.
    fn resolve_nginx(&self) -> Result<PathBuf, BuildError> {
        if let Some(bin) = &self.env.nginx_bin {
            if !bin.is_file() {
                return Err(BuildError::DependencyFetch(format!(
                    "configured nginx binary {} is not present",
                    bin.display()
                )));
            }
            return Ok(bin.clone());
        }

        let cached = self.cache_dir.join("nginx/sbin/nginx");
        if cached.is_file() {
            return Ok(cached);
        }

        Ok(PathBuf::from("nginx"))
    }

    fn write_boot_script(&self, nginx_bin: &Path) -> Result<(), BuildError> {
        let script = BOOT_SCRIPT.replace("__NGINX_BIN__", &nginx_bin.display().to_string());
        let path = self.build_dir.join(BOOT_SCRIPT_NAME);
        fs::write(&path, script).context("unable to write boot script")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .context("unable to mark boot script executable")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn composer<'a>(
        build: &'a TempDir,
        cache: &'a TempDir,
        env: &'a PlatformEnv,
        log: &'a BuildLog,
    ) -> LaunchComposer<'a> {
        LaunchComposer {
            build_dir: build.path(),
            cache_dir: cache.path(),
            env,
            log,
        }
    }

    #[test]
    fn test_default_launch_uses_boot_script() {
        let build = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let env = PlatformEnv::default();
        let log = BuildLog::silent(false);

        let plan = composer(&build, &cache, &env, &log).compose(None).unwrap();
        assert!(!plan.custom);
        assert_eq!(plan.command, "$HOME/boot.sh");

        let script = fs::read_to_string(build.path().join("boot.sh")).unwrap();
        assert!(script.contains("exec nginx -p"));
        assert!(script.contains("__PORT__"));
    }

    #[test]
    fn test_custom_start_command_takes_precedence_and_is_logged() {
        let build = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let env = PlatformEnv::default();
        let log = BuildLog::silent(false);

        let plan = composer(&build, &cache, &env, &log)
            .compose(Some("./run-my-server.sh"))
            .unwrap();
        assert!(plan.custom);
        assert_eq!(plan.command, "./run-my-server.sh");
        assert!(log
            .lines()
            .iter()
            .any(|l| l.contains("custom start command")));
        // The boot script is still written for reference.
        assert!(build.path().join("boot.sh").is_file());
    }

    #[test]
    fn test_cached_runtime_is_preferred_over_path() {
        let build = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        fs::create_dir_all(cache.path().join("nginx/sbin")).unwrap();
        fs::write(cache.path().join("nginx/sbin/nginx"), "").unwrap();

        let env = PlatformEnv::default();
        let log = BuildLog::silent(false);
        composer(&build, &cache, &env, &log).compose(None).unwrap();

        let script = fs::read_to_string(build.path().join("boot.sh")).unwrap();
        assert!(script.contains(&cache.path().join("nginx/sbin/nginx").display().to_string()));
    }

    #[test]
    fn test_missing_configured_runtime_is_a_fetch_failure() {
        let build = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let mut env = PlatformEnv::default();
        env.nginx_bin = Some(build.path().join("no/such/nginx"));
        let log = BuildLog::silent(false);

        let err = composer(&build, &cache, &env, &log)
            .compose(None)
            .err()
            .expect("must fail");
        assert_eq!(err.exit_code(), 15);
    }

    #[test]
    fn test_debug_mode_logs_the_launch_command() {
        let build = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let env = PlatformEnv::default();
        let log = BuildLog::silent(true);

        composer(&build, &cache, &env, &log).compose(None).unwrap();
        assert!(log
            .lines()
            .iter()
            .any(|l| l.contains("DEBUG:") && l.contains("launch command")));
    }
}
