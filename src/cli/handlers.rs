//! Per-subcommand entry points. Each returns the process exit code.

use super::commands::{CompileArgs, DetectArgs};
use crate::config::PlatformEnv;
use crate::detect::{detect, DetectMode, Detection};
use crate::pipeline::{StagingContext, StagingOrchestrator};
use crate::DETECT_TAG;
use tracing::debug;

pub fn handle_detect(args: &DetectArgs) -> i32 {
    let mode = if args.fallback {
        DetectMode::Fallback
    } else {
        DetectMode::Strict
    };

    match detect(&args.source_dir, mode) {
        Detection::Applicable => {
            println!("{}", DETECT_TAG);
            0
        }
        Detection::NotApplicable => {
            println!("no");
            1
        }
    }
}

pub async fn handle_compile(args: &CompileArgs) -> i32 {
    // The only place the process environment is read; everything below
    // receives it explicitly.
    let env = PlatformEnv::from_env();
    debug!(stack = %env.stack, "captured platform environment");

    let mode = if args.fallback {
        DetectMode::Fallback
    } else {
        DetectMode::Strict
    };

    let context = StagingContext::new(
        args.build_dir.clone(),
        args.cache_dir.clone(),
        env,
        mode,
        args.start_command.clone(),
    );

    let outcome = StagingOrchestrator::new(context).execute().await;
    outcome.exit_code
}
