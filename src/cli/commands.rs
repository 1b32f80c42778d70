use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Staging-time compiler for static-content server instances
#[derive(Parser, Debug)]
#[command(
    name = "staticpack",
    about = "Staging-time compiler for static-content server instances",
    version,
    author,
    long_about = "staticpack turns a declarative Staticfile plus a directory of static assets \
                  into a fully configured, launchable nginx instance. The platform invokes \
                  `detect` to probe applicability and `compile` once per deployment."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Increase operator-log verbosity"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error operator logs"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Check whether this compiler applies to a source tree",
        long_about = "Prints the compiler tag and exits 0 when the tree is applicable, \
                      prints `no` and exits 1 otherwise.\n\n\
                      Examples:\n  \
                      staticpack detect /path/to/app\n  \
                      staticpack detect --fallback /path/to/app"
    )]
    Detect(DetectArgs),

    #[command(
        about = "Compile a source tree into a launchable server instance",
        long_about = "Runs the full staging pipeline against a build directory: parse the \
                      Staticfile, validate the content root, run hooks, relocate assets, \
                      synthesize the nginx configuration and compose the launch script.\n\n\
                      Examples:\n  \
                      staticpack compile /build/app /cache/app\n  \
                      staticpack compile --fallback /build/app /cache/app"
    )]
    Compile(CompileArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct DetectArgs {
    #[arg(value_name = "DIR", help = "Path to the application source tree")]
    pub source_dir: PathBuf,

    #[arg(
        long,
        help = "Also claim trees without a Staticfile that look like static content"
    )]
    pub fallback: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompileArgs {
    #[arg(value_name = "BUILD_DIR", help = "Application build directory")]
    pub build_dir: PathBuf,

    #[arg(value_name = "CACHE_DIR", help = "Dependency cache directory")]
    pub cache_dir: PathBuf,

    #[arg(
        long,
        help = "Treat a missing Staticfile as defaults instead of an error"
    )]
    pub fallback: bool,

    #[arg(
        long,
        value_name = "CMD",
        help = "Custom start command taking precedence over the generated boot script"
    )]
    pub start_command: Option<String>,
}
