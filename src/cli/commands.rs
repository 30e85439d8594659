use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Stages application source into a runnable droplet
#[derive(Parser, Debug)]
#[command(
    name = "stager",
    about = "Stage application source into a runnable droplet",
    version,
    long_about = "stager prepares an application for launch: it selects a buildpack \
                  (or a framework plugin), compiles the app into a droplet directory and \
                  writes the droplet's startup and stop scripts."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Stage an application into a droplet",
        long_about = "Copies the source into DESTINATION/app, runs the selected buildpack or \
                      framework plugin and writes DESTINATION/startup and DESTINATION/stop.\n\n\
                      Examples:\n  \
                      stager stage --source ./app --destination /tmp/droplet\n  \
                      stager stage --request staging.yml\n  \
                      stager stage --source ./app --destination /tmp/droplet --command 'bundle exec rackup'"
    )]
    Stage(StageArgs),

    #[command(
        about = "Report which buildpack would stage an application",
        long_about = "Runs each local buildpack's detect script against the source tree and \
                      prints the first one that accepts it.\n\n\
                      Examples:\n  \
                      stager detect --source ./app\n  \
                      stager detect --source ./app --buildpacks-dir ./buildpacks"
    )]
    Detect(DetectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StageArgs {
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with_all = ["source", "destination"],
        help = "Read the staging request from a YAML or JSON file"
    )]
    pub request: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        required_unless_present = "request",
        help = "Application source directory"
    )]
    pub source: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        required_unless_present = "request",
        help = "Droplet directory to create"
    )]
    pub destination: Option<PathBuf>,

    #[arg(long, value_name = "NAME", help = "Framework plugin (buildpack, sinatra, node)")]
    pub framework: Option<String>,

    #[arg(long, value_name = "NAME", help = "Runtime name, e.g. ruby19")]
    pub runtime: Option<String>,

    #[arg(long, value_name = "VERSION", help = "Runtime version, e.g. 1.9.3")]
    pub runtime_version: Option<String>,

    #[arg(long, value_name = "PATH", help = "Runtime executable used in the start command")]
    pub runtime_executable: Option<String>,

    #[arg(long, value_name = "CMD", help = "Start command that overrides any detected one")]
    pub command: Option<String>,

    #[arg(long, value_name = "URL", help = "Git URL of a buildpack to use instead of detection")]
    pub buildpack: Option<String>,

    #[arg(long, value_name = "DIR", help = "Directory holding the local buildpacks")]
    pub buildpacks_dir: Option<PathBuf>,

    #[arg(long, value_name = "DIR", help = "Root of the per-app compile caches")]
    pub cache_dir: Option<PathBuf>,

    #[arg(long, value_name = "MB", help = "Memory limit in megabytes")]
    pub memory: Option<u64>,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Args, Debug, Clone)]
pub struct DetectArgs {
    #[arg(long, value_name = "DIR", help = "Application source directory")]
    pub source: PathBuf,

    #[arg(long, value_name = "DIR", help = "Directory holding the local buildpacks")]
    pub buildpacks_dir: Option<PathBuf>,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
