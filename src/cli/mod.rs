pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, DetectArgs, OutputFormatArg, StageArgs};
pub use handlers::{handle_detect, handle_stage};
pub use output::{DetectionReport, OutputFormat, OutputFormatter};
