//! Staging building blocks shared by every plugin

pub mod droplet;
pub mod error;
pub mod procfile;
pub mod request;
pub mod script;
pub mod start_command;

pub use droplet::Droplet;
pub use error::StagingError;
pub use procfile::{Procfile, ProcfileResolver};
pub use request::{FrameworkInfo, RuntimeInfo, ServiceBinding, StagingRequest};
pub use script::{EnvironmentScriptBuilder, EnvironmentVars};
pub use start_command::{StartCommand, StartCommandResolver, StartCommandSource};
