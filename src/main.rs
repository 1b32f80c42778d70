use staticpack::cli::{handle_compile, handle_detect, CliArgs, Commands};
use staticpack::util::init_logging;
use staticpack::VERSION;

use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(args.log_level.as_deref(), args.verbose, args.quiet);

    debug!("staticpack v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Detect(detect_args) => handle_detect(detect_args),
        Commands::Compile(compile_args) => handle_compile(compile_args).await,
    };

    std::process::exit(exit_code);
}
