use crate::buildpack::{Buildpack, BuildpackContractRunner, BuildpackResolver, SelectedBuildpack};
use crate::config::StagerConfig;
use crate::fs::{FileSystem, RealFileSystem};
use crate::plugins::{
    BuildpackPlugin, LaunchPlan, Node, NodePlugin, Sinatra, SinatraPlugin, StagingPlugin,
};
use crate::process::{ProcessRunner, TokioProcessRunner};
use crate::staging::droplet::{STARTUP_SCRIPT, STOP_SCRIPT};
use crate::staging::{Droplet, StagingError, StagingRequest, StartCommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Summary of a finished staging run
#[derive(Debug, Clone, Serialize)]
pub struct StagingOutcome {
    pub droplet: PathBuf,
    pub plugin: String,
    pub start_command: StartCommand,
    pub buildpack: Option<String>,
    pub entry_point: Option<String>,
    pub startup_script: PathBuf,
    pub stop_script: PathBuf,
}

/// Top-level driver of a staging run.
///
/// Holds no per-run state, so one orchestrator can stage many apps
/// concurrently; each run only writes into its own destination directory.
pub struct StagingOrchestrator {
    config: StagerConfig,
    runner: Arc<dyn ProcessRunner>,
    fs: Arc<dyn FileSystem>,
}

impl StagingOrchestrator {
    pub fn new(config: StagerConfig) -> Self {
        Self::with_io(
            config,
            Arc::new(TokioProcessRunner::new()),
            Arc::new(RealFileSystem::new()),
        )
    }

    pub fn with_io(
        config: StagerConfig,
        runner: Arc<dyn ProcessRunner>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self { config, runner, fs }
    }

    pub fn config(&self) -> &StagerConfig {
        &self.config
    }

    fn resolver(&self) -> BuildpackResolver {
        let buildpacks = Buildpack::discover(self.fs.as_ref(), &self.config.buildpacks_dir);
        BuildpackResolver::new(self.runner.clone(), buildpacks).with_git(&self.config.git)
    }

    /// The plugin for the request's framework
    pub fn plugin_for(
        &self,
        request: &StagingRequest,
    ) -> Result<Box<dyn StagingPlugin>, StagingError> {
        let framework = request.framework.name.trim().to_lowercase();
        let plugin: Box<dyn StagingPlugin> = match framework.as_str() {
            "buildpack" => Box::new(BuildpackPlugin::new(
                self.resolver(),
                BuildpackContractRunner::new(self.runner.clone()),
                self.fs.clone(),
                &self.config.cache_dir,
            )),
            "sinatra" => Box::new(SinatraPlugin::new(Sinatra, self.fs.clone())),
            "node" | "nodejs" => Box::new(NodePlugin::new(Node, self.fs.clone())),
            _ => return Err(StagingError::UnsupportedFramework(request.framework.name.clone())),
        };
        Ok(plugin)
    }

    /// Runs only the buildpack detect loop against an app directory
    pub async fn detect_buildpack(&self, app_dir: &Path) -> Result<SelectedBuildpack, StagingError> {
        self.resolver().detect(app_dir).await
    }

    pub async fn stage(&self, request: &StagingRequest) -> Result<StagingOutcome, StagingError> {
        let start = Instant::now();
        request.validate()?;
        let plugin = self.plugin_for(request)?;
        let droplet = Droplet::new(&request.destination_dir);
        info!(
            source = %request.source_dir.display(),
            destination = %droplet.root().display(),
            plugin = plugin.name(),
            "Starting staging"
        );

        let phase_start = Instant::now();
        droplet.create_directories()?;
        droplet.copy_source(&request.source_dir)?;
        debug!(elapsed = ?phase_start.elapsed(), "Prepared droplet layout");

        let phase_start = Instant::now();
        let plan = plugin.stage(request, &droplet).await?;
        debug!(elapsed = ?phase_start.elapsed(), "Plugin staging complete");

        let outcome = self.write_scripts(plugin.as_ref(), &droplet, plan)?;
        info!(
            elapsed = ?start.elapsed(),
            command = %outcome.start_command.command,
            "Staging complete"
        );
        Ok(outcome)
    }

    fn write_scripts(
        &self,
        plugin: &dyn StagingPlugin,
        droplet: &Droplet,
        plan: LaunchPlan,
    ) -> Result<StagingOutcome, StagingError> {
        let startup_script = droplet.write_script(STARTUP_SCRIPT, &plan.startup_script())?;
        let stop_script = droplet.write_script(STOP_SCRIPT, &plugin.stop_script(&plan))?;

        Ok(StagingOutcome {
            droplet: droplet.root().to_path_buf(),
            plugin: plugin.name().to_string(),
            buildpack: plan.buildpack.as_ref().map(|b| b.name().to_string()),
            entry_point: plan.entry_point,
            start_command: plan.start_command,
            startup_script,
            stop_script,
        })
    }
}
