//! Staging plugins
//!
//! Every plugin turns a prepared droplet into a [`LaunchPlan`]: the resolved
//! start command plus the environment and shell blocks for its scripts. The
//! generic [`BuildpackPlugin`] runs the buildpack contract; the framework
//! plugins ([`SinatraPlugin`], [`NodePlugin`]) skip buildpacks and detect an
//! entry file instead.

use crate::buildpack::SelectedBuildpack;
use crate::staging::{Droplet, EnvironmentScriptBuilder, StagingError, StagingRequest, StartCommand};
use async_trait::async_trait;

pub mod buildpack;
pub mod entry_point;
pub mod framework;
pub mod node;
pub mod rails_console;
pub mod sinatra;

pub use buildpack::BuildpackPlugin;
pub use entry_point::{EntryPattern, EntryPointDetector};
pub use framework::{AppContext, FrameworkPlugin, LegacyFramework};
pub use node::{Node, NodePlugin};
pub use sinatra::{Sinatra, SinatraPlugin};

/// Everything needed to emit a droplet's scripts
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub start_command: StartCommand,
    pub scripts: EnvironmentScriptBuilder,
    pub buildpack: Option<SelectedBuildpack>,
    pub entry_point: Option<String>,
}

impl LaunchPlan {
    pub fn new(start_command: StartCommand, scripts: EnvironmentScriptBuilder) -> Self {
        Self {
            start_command,
            scripts,
            buildpack: None,
            entry_point: None,
        }
    }

    pub fn startup_script(&self) -> String {
        self.scripts
            .clone()
            .logs(&self.start_command.stdout_log, &self.start_command.stderr_log)
            .startup_script(&self.start_command.command)
    }
}

#[async_trait]
pub trait StagingPlugin: Send + Sync {
    fn name(&self) -> &'static str;

    /// Builds the app inside `droplet` and resolves how to launch it.
    ///
    /// The droplet directories exist and hold a copy of the source when this runs.
    async fn stage(
        &self,
        request: &StagingRequest,
        droplet: &Droplet,
    ) -> Result<LaunchPlan, StagingError>;

    fn stop_script(&self, plan: &LaunchPlan) -> String {
        plan.scripts.stop_script()
    }
}
