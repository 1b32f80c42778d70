//! Pre/post-compile hook execution.
//!
//! User-supplied scripts run at two fixed points in the pipeline. Each hook
//! is a scoped subprocess: spawned with piped output, both streams drained
//! concurrently into the build log with a stage marker, and waited on (or
//! killed) on every exit path, including timeout. A non-zero exit aborts
//! the remaining pipeline as `HookFailure`.

use crate::buildlog::BuildLog;
use crate::config::PlatformEnv;
use crate::error::BuildError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

/// Directory under the build dir holding hook scripts. Excluded from asset
/// relocation so hooks never end up in the serving tree.
pub const HOOKS_DIR: &str = ".staticpack/hooks";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
    PreCompile,
    PostCompile,
}

impl HookPoint {
    fn script_name(self) -> &'static str {
        match self {
            HookPoint::PreCompile => "pre-compile",
            HookPoint::PostCompile => "post-compile",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.script_name())
    }
}

pub struct HookRunner {
    build_dir: PathBuf,
    timeout: Duration,
    proxy_env: Vec<(String, String)>,
    log: BuildLog,
}

impl HookRunner {
    pub fn new(build_dir: &Path, env: &PlatformEnv, log: BuildLog) -> Self {
        Self {
            build_dir: build_dir.to_path_buf(),
            timeout: env.hook_timeout,
            proxy_env: env
                .proxy_vars()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            log,
        }
    }

    /// Scripts for a hook point: `<point>` itself, then `<point>.d/*` in
    /// lexicographic order.
    pub fn discover(&self, point: HookPoint) -> Vec<PathBuf> {
        let hooks_dir = self.build_dir.join(HOOKS_DIR);
        let mut scripts = Vec::new();

        let single = hooks_dir.join(point.script_name());
        if single.is_file() {
            scripts.push(single);
        }

        let extras_dir = hooks_dir.join(format!("{}.d", point.script_name()));
        if let Ok(entries) = std::fs::read_dir(&extras_dir) {
            let mut extras: Vec<PathBuf> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .collect();
            extras.sort();
            scripts.extend(extras);
        }

        scripts
    }

    /// Runs every hook for the point, in order, stopping at the first
    /// failure.
    pub async fn run_all(&self, point: HookPoint) -> Result<(), BuildError> {
        let scripts = self.discover(point);
        if scripts.is_empty() {
            debug!("no {} hooks found", point);
            return Ok(());
        }

        for script in scripts {
            self.run_one(point, &script).await?;
        }
        Ok(())
    }

    async fn run_one(&self, point: HookPoint, script: &Path) -> Result<(), BuildError> {
        let hook = script
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| script.display().to_string());
        let tag = format!("{}/{}", point, hook);

        self.log.begin_step(format!("Running {} hook {}", point, hook));

        let mut command = Command::new(script);
        command
            .current_dir(&self.build_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &self.proxy_env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|err| BuildError::HookFailure {
            hook: tag.clone(),
            detail: format!("failed to start: {}", err),
        })?;

        let stdout_task = drain(child.stdout.take(), self.log.clone(), tag.clone());
        let stderr_task = drain(child.stderr.take(), self.log.clone(), tag.clone());

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(err)) => {
                join_drains(stdout_task, stderr_task).await;
                return Err(BuildError::HookFailure {
                    hook: tag,
                    detail: format!("wait failed: {}", err),
                });
            }
            Err(_) => {
                // Kill, then still wait so the process is reaped.
                let _ = child.start_kill();
                let _ = child.wait().await;
                join_drains(stdout_task, stderr_task).await;
                return Err(BuildError::HookFailure {
                    hook: tag,
                    detail: format!("timed out after {}s", self.timeout.as_secs()),
                });
            }
        };

        join_drains(stdout_task, stderr_task).await;

        if status.success() {
            Ok(())
        } else {
            Err(BuildError::HookFailure {
                hook: tag,
                detail: format!("exit code {}", status.code().unwrap_or(-1)),
            })
        }
    }
}

fn drain<R>(stream: Option<R>, log: BuildLog, tag: String) -> Option<JoinHandle<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let stream = stream?;
    Some(tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            log.info(format!("[{}] {}", tag, line));
        }
    }))
}

async fn join_drains(stdout: Option<JoinHandle<()>>, stderr: Option<JoinHandle<()>>) {
    if let Some(task) = stdout {
        let _ = task.await;
    }
    if let Some(task) = stderr {
        let _ = task.await;
    }
}
