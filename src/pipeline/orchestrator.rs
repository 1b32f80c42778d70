//! The staging orchestrator.
//!
//! Drives one invocation through the state machine:
//! `Init → Detecting → Parsing → ResolvingPaths → RunningPreHooks →
//! RelocatingAssets → Generating → RunningPostHooks → Composing → Done`,
//! with `Failed` reachable from any non-terminal state. The first failure
//! wins; nothing is retried. The terminal value is a [`BuildOutcome`]:
//! exit code plus every diagnostic line in order.

use super::context::StagingContext;
use super::stage::Stage;
use crate::credentials;
use crate::detect::{detect, DetectMode, Detection};
use crate::error::BuildError;
use crate::hooks::{HookPoint, HookRunner};
use crate::launch::LaunchComposer;
use crate::nginx::{self, ServerConfigGenerator, CONF_DIR};
use crate::paths::resolve_root;
use crate::relocate::relocate_assets;
use crate::staticfile::{self, StaticConfig};
use crate::{NAME, VERSION};
use tracing::{debug, error, info};

/// Terminal value of the pipeline.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub exit_code: i32,
    pub lines: Vec<String>,
}

impl BuildOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

pub struct StagingOrchestrator {
    context: StagingContext,
    stage: Stage,
}

impl StagingOrchestrator {
    pub fn new(context: StagingContext) -> Self {
        Self {
            context,
            stage: Stage::Init,
        }
    }

    pub async fn execute(mut self) -> BuildOutcome {
        info!(
            build_dir = %self.context.build_dir.display(),
            "starting staging pipeline"
        );
        self.context
            .log
            .begin_step(format!("{} buildpack version {}", NAME, VERSION));

        match self.run().await {
            Ok(()) => BuildOutcome {
                exit_code: 0,
                lines: self.context.log.lines(),
            },
            Err(err) => {
                error!(stage = %self.stage, error = %err, "staging failed");
                self.context.log.error(err.to_string());
                self.stage = Stage::Failed;
                BuildOutcome {
                    exit_code: err.exit_code(),
                    lines: self.context.log.lines(),
                }
            }
        }
    }

    async fn run(&mut self) -> Result<(), BuildError> {
        // Unsupported environments fail before Detecting, ahead of any
        // filesystem access.
        self.context.env.ensure_supported()?;

        self.enter(Stage::Detecting);
        if self.context.mode == DetectMode::Strict
            && detect(&self.context.build_dir, self.context.mode) == Detection::NotApplicable
        {
            return Err(BuildError::MissingConfiguration(
                self.context.build_dir.clone(),
            ));
        }

        self.enter(Stage::Parsing);
        let parsed = staticfile::load(
            &self.context.build_dir,
            self.context.mode == DetectMode::Fallback,
        )?;
        for warning in &parsed.warnings {
            self.context.log.warning(warning);
        }
        let mut config = parsed.config;
        config.force_https = config.force_https || self.context.env.force_https;

        let creds = credentials::load(&self.context.build_dir)?;
        config.basic_auth = creds.is_some();

        self.log_enabled_features(&config);
        if config.basic_auth {
            // Provenance only; credential material never reaches the log.
            self.context
                .log
                .begin_step("Enabling basic authentication using Staticfile.auth");
        }
        if !config.hsts && (config.hsts_include_subdomains || config.hsts_preload) {
            self.context.log.warning(
                "http_strict_transport_security is not enabled while http_strict_transport_security_include_subdomains or http_strict_transport_security_preload have been enabled.\nThey do nothing without http_strict_transport_security enabled.",
            );
        }
        self.context.credentials = creds;

        self.enter(Stage::ResolvingPaths);
        let root = resolve_root(&self.context.build_dir, config.root.as_deref())?;
        self.context
            .log
            .begin_step(format!("Root folder {}", root.path.display()));

        let hooks = HookRunner::new(
            &self.context.build_dir,
            &self.context.env,
            self.context.log.clone(),
        );

        self.enter(Stage::RunningPreHooks);
        hooks.run_all(HookPoint::PreCompile).await?;

        self.enter(Stage::RelocatingAssets);
        self.context.override_conf_present = self.context.build_dir.join(CONF_DIR).is_dir();
        relocate_assets(&self.context.build_dir, &root, &config, &self.context.log)?;

        self.enter(Stage::Generating);
        self.context.log.begin_step("Configuring nginx");
        if config.location_include.is_some() && !config.has_explicit_root() {
            self.context.log.warning(
                "The location_include directive only works in conjunction with root.\nPlease specify root to use location_include",
            );
        }
        if self.context.override_conf_present && !config.has_explicit_root() {
            self.context.log.warning(
                "You have an nginx/conf directory, but have not set *root*, or have set it to '.'.\nIf you are using the nginx/conf directory for nginx configuration, you probably need to also set the *root* directive.",
            );
        }
        let generated = ServerConfigGenerator {
            config: &config,
            credentials: self.context.credentials.as_ref(),
            env: &self.context.env,
        }
        .generate();
        nginx::write_config(
            &self.context.build_dir,
            &generated,
            self.context.credentials.as_ref(),
            &self.context.log,
        )?;
        if self.context.log.debug_enabled() {
            if let Ok(summary) = serde_json::to_string(&generated.features) {
                self.context.log.debug(format!("feature summary: {}", summary));
            }
        }

        self.enter(Stage::RunningPostHooks);
        hooks.run_all(HookPoint::PostCompile).await?;

        self.enter(Stage::Composing);
        let composer = LaunchComposer {
            build_dir: &self.context.build_dir,
            cache_dir: &self.context.cache_dir,
            env: &self.context.env,
            log: &self.context.log,
        };
        self.context.launch = Some(composer.compose(self.context.start_command.as_deref())?);

        self.context.config = Some(config);
        self.context.resolved_root = Some(root);
        self.context.generated = Some(generated);
        self.enter(Stage::Done);
        Ok(())
    }

    fn enter(&mut self, stage: Stage) {
        debug_assert_eq!(self.stage.next(), Some(stage), "illegal stage transition");
        debug!(from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
    }

    /// Feature-toggle lines, emitted only for features actually enabled.
    fn log_enabled_features(&self, config: &StaticConfig) {
        let log = &self.context.log;
        if config.host_dot_files {
            log.begin_step("Enabling hosting of dotfiles");
        }
        if let Some(include) = &config.location_include {
            log.begin_step(format!("Enabling location include file {}", include));
        }
        if config.directory_listing {
            log.begin_step("Enabling directory index for folders without index.html files");
        }
        if config.ssi {
            log.begin_step("Enabling SSI");
        }
        if config.ssi && config.ssi_expose_env {
            log.begin_step("Enabling SSI environment variable exposure");
        }
        if config.pushstate {
            log.begin_step("Enabling pushstate");
        }
        if config.hsts {
            log.begin_step("Enabling HSTS");
        }
        if config.hsts_include_subdomains {
            log.begin_step("Enabling HSTS includeSubDomains");
        }
        if config.hsts_preload {
            log.begin_step("Enabling HSTS Preload");
        }
        if config.force_https {
            log.begin_step("Enabling HTTPS redirect");
        }
        if !config.headers.is_empty() {
            log.begin_step("Enabling custom response headers");
        }
        for proxy in &config.proxies {
            log.begin_step(format!("Enabling reverse proxy for {}", proxy.path));
        }
    }
}
