use std::path::Path;
use thiserror::Error;

/// Errors that abort a staging run.
///
/// Each variant is a distinct, user-actionable failure; callers decide how
/// to map them onto exit codes or API responses via [`StagingError::kind`].
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Failed to git clone buildpack {url}")]
    BuildpackFetchFailed { url: String },

    #[error("Unable to detect a supported application type")]
    NoMatchingBuildpack,

    #[error("Buildpack compilation step failed: {buildpack}")]
    BuildpackCompileFailed { buildpack: String, output: String },

    #[error("Invalid release output from buildpack {buildpack}: {reason}")]
    InvalidReleaseOutput { buildpack: String, reason: String },

    #[error("Invalid Procfile format.  Please ensure it is a valid YAML hash")]
    InvalidProcfileFormat,

    #[error("Please specify a web start command in your manifest.yml or Procfile")]
    NoStartCommand,

    #[error("Unable to determine {framework} startup command")]
    NoEntryPointDetected { framework: String },

    #[error("Unsupported framework: {0}")]
    UnsupportedFramework(String),

    #[error("Invalid staging request: {0}")]
    InvalidRequest(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl StagingError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        StagingError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn io_at(action: &str, path: &Path, source: std::io::Error) -> Self {
        Self::io(format!("Failed to {} {}", action, path.display()), source)
    }

    /// Stable identifier of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            StagingError::BuildpackFetchFailed { .. } => "buildpack_fetch_failed",
            StagingError::NoMatchingBuildpack => "no_matching_buildpack",
            StagingError::BuildpackCompileFailed { .. } => "buildpack_compile_failed",
            StagingError::InvalidReleaseOutput { .. } => "invalid_release_output",
            StagingError::InvalidProcfileFormat => "invalid_procfile_format",
            StagingError::NoStartCommand => "no_start_command",
            StagingError::NoEntryPointDetected { .. } => "no_entry_point_detected",
            StagingError::UnsupportedFramework(_) => "unsupported_framework",
            StagingError::InvalidRequest(_) => "invalid_request",
            StagingError::Io { .. } => "io",
        }
    }
}
