use super::entry_point::{EntryPattern, EntryPointDetector};
use super::{LaunchPlan, StagingPlugin};
use crate::fs::FileSystem;
use crate::staging::{
    Droplet, EnvironmentScriptBuilder, EnvironmentVars, StagingError, StagingRequest,
    StartCommand, StartCommandSource,
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// What a framework plugin knows about the app it is staging
pub struct AppContext<'a> {
    pub request: &'a StagingRequest,
    pub app_dir: PathBuf,
    pub fs: &'a dyn FileSystem,
}

impl AppContext<'_> {
    pub fn has_file(&self, name: &str) -> bool {
        self.fs.is_file(&self.app_dir.join(name))
    }
}

/// A framework with no standard launch convention.
///
/// Implementations only differ in how the command and environment are built.
pub trait LegacyFramework: Send + Sync {
    fn name(&self) -> &'static str;

    fn entry_patterns(&self) -> Vec<EntryPattern>;

    fn start_command(&self, app: &AppContext<'_>, entry_point: &str) -> String;

    fn environment(&self, app: &AppContext<'_>) -> EnvironmentVars;

    fn pre_launch(&self, _app: &AppContext<'_>) -> Option<String> {
        None
    }
}

pub struct FrameworkPlugin<F> {
    framework: F,
    fs: Arc<dyn FileSystem>,
}

impl<F: LegacyFramework> FrameworkPlugin<F> {
    pub fn new(framework: F, fs: Arc<dyn FileSystem>) -> Self {
        Self { framework, fs }
    }

    pub fn framework(&self) -> &F {
        &self.framework
    }

    /// The app's entry file, from the request's patterns or the framework's own
    pub fn detect_entry_point(&self, app: &AppContext<'_>) -> Result<String, StagingError> {
        let patterns = if app.request.framework.detection.is_empty() {
            self.framework.entry_patterns()
        } else {
            app.request.framework.detection.clone()
        };

        EntryPointDetector::new(app.fs)
            .detect(&app.app_dir, &patterns)
            .ok_or_else(|| {
                error!(framework = self.framework.name(), "No entry point matched");
                StagingError::NoEntryPointDetected {
                    framework: self.framework.name().to_string(),
                }
            })
    }
}

#[async_trait]
impl<F: LegacyFramework> StagingPlugin for FrameworkPlugin<F> {
    fn name(&self) -> &'static str {
        self.framework.name()
    }

    async fn stage(
        &self,
        request: &StagingRequest,
        droplet: &Droplet,
    ) -> Result<LaunchPlan, StagingError> {
        let app = AppContext {
            request,
            app_dir: droplet.app_dir(),
            fs: self.fs.as_ref(),
        };

        let entry_point = self.detect_entry_point(&app)?;
        let start_command = match request.start_command_override() {
            Some(command) => StartCommand::new(command, StartCommandSource::Override),
            None => StartCommand::new(
                self.framework.start_command(&app, &entry_point),
                StartCommandSource::EntryPoint,
            ),
        };
        info!(
            framework = self.framework.name(),
            entry_point = %entry_point,
            command = %start_command.command,
            "Resolved start command"
        );

        let mut scripts = EnvironmentScriptBuilder::new(self.framework.environment(&app));
        if let Some(block) = self.framework.pre_launch(&app) {
            scripts = scripts.pre_launch(block);
        }

        let mut plan = LaunchPlan::new(start_command, scripts);
        plan.entry_point = Some(entry_point);
        Ok(plan)
    }
}
