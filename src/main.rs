use stager::cli::commands::{CliArgs, Commands};
use stager::cli::handlers::{handle_detect, handle_stage};
use stager::util::{init_logging, resolve_level, LoggingConfig};
use stager::{StagerConfig, VERSION};

use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("stager v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Stage(stage_args) => handle_stage(stage_args, args.quiet).await,
        Commands::Detect(detect_args) => handle_detect(detect_args).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let configured = StagerConfig::default().log_level;
    let level = resolve_level(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
        &configured,
    );
    init_logging(LoggingConfig::from_env(level));
}
