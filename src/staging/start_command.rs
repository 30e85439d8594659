use crate::buildpack::ReleaseMetadata;
use crate::staging::procfile::Procfile;
use crate::staging::script::{STDERR_LOG, STDOUT_LOG};
use crate::staging::StagingError;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Where the resolved start command came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartCommandSource {
    Override,
    Procfile,
    Release,
    EntryPoint,
}

impl fmt::Display for StartCommandSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StartCommandSource::Override => "manifest",
            StartCommandSource::Procfile => "Procfile",
            StartCommandSource::Release => "buildpack release",
            StartCommandSource::EntryPoint => "detected entry point",
        };
        f.write_str(name)
    }
}

/// The launch command of a droplet and where its output goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartCommand {
    pub command: String,
    pub source: StartCommandSource,
    pub stdout_log: String,
    pub stderr_log: String,
}

impl StartCommand {
    pub fn new(command: impl Into<String>, source: StartCommandSource) -> Self {
        Self {
            command: command.into(),
            source,
            stdout_log: STDOUT_LOG.to_string(),
            stderr_log: STDERR_LOG.to_string(),
        }
    }
}

/// Applies the start command precedence chain: override, then the Procfile's
/// `web` entry, then the buildpack's `default_process_types.web`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StartCommandResolver<'a> {
    override_command: Option<&'a str>,
    procfile: Option<&'a Procfile>,
    release: Option<&'a ReleaseMetadata>,
}

impl<'a> StartCommandResolver<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, command: Option<&'a str>) -> Self {
        self.override_command = command;
        self
    }

    pub fn with_procfile(mut self, procfile: Option<&'a Procfile>) -> Self {
        self.procfile = procfile;
        self
    }

    pub fn with_release(mut self, release: Option<&'a ReleaseMetadata>) -> Self {
        self.release = release;
        self
    }

    pub fn resolve(&self) -> Result<StartCommand, StagingError> {
        let candidates = [
            (self.override_command, StartCommandSource::Override),
            (self.procfile.and_then(Procfile::web), StartCommandSource::Procfile),
            (self.release.and_then(ReleaseMetadata::web), StartCommandSource::Release),
        ];

        let (command, source) = candidates
            .into_iter()
            .find_map(|(command, source)| {
                command
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(|c| (c, source))
            })
            .ok_or(StagingError::NoStartCommand)?;

        info!(source = %source, command, "Resolved start command");
        Ok(StartCommand::new(command, source))
    }
}
