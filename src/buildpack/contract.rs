use crate::buildpack::ReleaseMetadata;
use crate::fs::FileSystem;
use crate::process::{Invocation, ProcessRunner};
use crate::staging::StagingError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The three entry points every buildpack exposes under `bin/`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Detect,
    Compile,
    Release,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Detect => "detect",
            Phase::Compile => "compile",
            Phase::Release => "release",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A buildpack directory on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buildpack {
    pub name: String,
    pub path: PathBuf,
}

impl Buildpack {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }

    pub fn entry_point(&self, phase: Phase) -> PathBuf {
        self.path.join("bin").join(phase.as_str())
    }

    /// Installed buildpacks under `dir`, in priority (lexicographic) order.
    ///
    /// A missing directory yields no buildpacks.
    pub fn discover(fs: &dyn FileSystem, dir: &Path) -> Vec<Buildpack> {
        if !fs.is_dir(dir) {
            warn!(path = %dir.display(), "Buildpacks directory does not exist");
            return Vec::new();
        }

        match fs.read_dir(dir) {
            Ok(entries) => entries
                .into_iter()
                .filter(|e| e.is_dir())
                .map(|e| Buildpack::new(e.path))
                .collect(),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Unable to list buildpacks");
                Vec::new()
            }
        }
    }
}

/// Runs a buildpack's detect, compile and release entry points.
///
/// Each phase is a blocking external process with the app directory as its
/// first argument and working directory; there are no retries.
#[derive(Clone)]
pub struct BuildpackContractRunner {
    runner: Arc<dyn ProcessRunner>,
}

impl BuildpackContractRunner {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    fn invocation(buildpack: &Buildpack, phase: Phase, app_dir: &Path) -> Invocation {
        Invocation::new(buildpack.entry_point(phase))
            .arg(app_dir)
            .current_dir(app_dir)
    }

    /// `Some(reported name)` when the buildpack claims the app.
    ///
    /// A detect script that cannot be launched counts as no match.
    pub async fn detect(&self, buildpack: &Buildpack, app_dir: &Path) -> Option<String> {
        let invocation = Self::invocation(buildpack, Phase::Detect, app_dir);

        match self.runner.run(&invocation).await {
            Ok(output) if output.success() => {
                let reported = output.stdout.trim().to_string();
                debug!(buildpack = %buildpack.name, reported = %reported, "Buildpack detected app");
                Some(reported)
            }
            Ok(output) => {
                debug!(buildpack = %buildpack.name, status = ?output.status, "Buildpack did not match");
                None
            }
            Err(e) => {
                warn!(
                    buildpack = %buildpack.name,
                    error = %e,
                    "Failed to run buildpack detection script"
                );
                None
            }
        }
    }

    pub async fn compile(
        &self,
        buildpack: &Buildpack,
        app_dir: &Path,
        cache_dir: &Path,
    ) -> Result<(), StagingError> {
        let invocation = Self::invocation(buildpack, Phase::Compile, app_dir).arg(cache_dir);
        info!(buildpack = %buildpack.name, phase = %Phase::Compile, "Running buildpack");

        let output = self.runner.run(&invocation).await.map_err(|e| {
            StagingError::BuildpackCompileFailed {
                buildpack: buildpack.name.clone(),
                output: e.to_string(),
            }
        })?;

        for line in output.stdout.lines() {
            info!(buildpack = %buildpack.name, "{}", line);
        }
        for line in output.stderr.lines() {
            warn!(buildpack = %buildpack.name, "{}", line);
        }

        if !output.success() {
            return Err(StagingError::BuildpackCompileFailed {
                buildpack: buildpack.name.clone(),
                output: format!("{}{}", output.stdout, output.stderr),
            });
        }
        Ok(())
    }

    pub async fn release(
        &self,
        buildpack: &Buildpack,
        app_dir: &Path,
    ) -> Result<ReleaseMetadata, StagingError> {
        let invocation = Self::invocation(buildpack, Phase::Release, app_dir);
        debug!(buildpack = %buildpack.name, phase = %Phase::Release, "Running buildpack");

        let invalid = |reason: String| StagingError::InvalidReleaseOutput {
            buildpack: buildpack.name.clone(),
            reason,
        };

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| invalid(e.to_string()))?;

        if !output.success() {
            return Err(invalid(format!(
                "release exited with status {:?}: {}",
                output.status,
                output.stderr.trim()
            )));
        }

        ReleaseMetadata::parse(&output.stdout).map_err(|e| invalid(e.to_string()))
    }
}
