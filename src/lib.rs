//! stager - stages application source into a runnable droplet
//!
//! A staging run copies an application into a droplet directory, selects a
//! buildpack (or a framework plugin), runs the buildpack's detect, compile and
//! release programs, resolves the start command and writes the droplet's
//! `startup` and `stop` scripts.
//!
//! # Core Concepts
//!
//! - **Buildpack**: a directory with `bin/detect`, `bin/compile` and
//!   `bin/release` executables
//! - **Droplet**: the staged output, laid out as `app/`, `logs/`, `tmp/`,
//!   `startup` and `stop`
//! - **Start command**: resolved from the manifest override, then the
//!   Procfile `web` entry, then the buildpack's default process types
//!
//! # Example Usage
//!
//! ```no_run
//! use stager::{StagerConfig, StagingOrchestrator, StagingRequest};
//!
//! # async fn run() -> Result<(), stager::StagingError> {
//! let orchestrator = StagingOrchestrator::new(StagerConfig::default());
//! let request = StagingRequest::new("./my-app", "/tmp/droplet");
//! let outcome = orchestrator.stage(&request).await?;
//! println!("web: {}", outcome.start_command.command);
//! # Ok(())
//! # }
//! ```

pub mod buildpack;
pub mod cli;
pub mod config;
pub mod fs;
pub mod pipeline;
pub mod plugins;
pub mod process;
pub mod staging;
pub mod util;

pub use buildpack::{
    Buildpack, BuildpackContractRunner, BuildpackResolver, ReleaseMetadata, SelectedBuildpack,
};
pub use config::{ConfigError, StagerConfig};
pub use pipeline::{StagingOrchestrator, StagingOutcome};
pub use plugins::{BuildpackPlugin, LaunchPlan, NodePlugin, SinatraPlugin, StagingPlugin};
pub use staging::{
    Droplet, EnvironmentScriptBuilder, Procfile, ProcfileResolver, StagingError, StagingRequest,
    StartCommand, StartCommandResolver,
};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
