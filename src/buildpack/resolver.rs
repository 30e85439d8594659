use crate::buildpack::{Buildpack, BuildpackContractRunner};
use crate::process::{Invocation, ProcessRunner};
use crate::staging::StagingError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Directory inside the app that receives buildpacks cloned from a URL
pub const REMOTE_BUILDPACKS_DIR: &str = ".buildpacks";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildpackOrigin {
    Local,
    Remote { url: String },
}

/// The buildpack chosen for a staging run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedBuildpack {
    pub buildpack: Buildpack,
    pub origin: BuildpackOrigin,
    /// What the detect script printed, if it ran
    pub reported_name: Option<String>,
}

impl SelectedBuildpack {
    /// The detect-reported name, falling back to the directory name
    pub fn name(&self) -> &str {
        self.reported_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.buildpack.name)
    }
}

/// Picks the buildpack for an app: a cloned URL buildpack when one is
/// requested, otherwise the first local buildpack whose detect succeeds.
pub struct BuildpackResolver {
    runner: Arc<dyn ProcessRunner>,
    contract: BuildpackContractRunner,
    buildpacks: Vec<Buildpack>,
    git: PathBuf,
}

impl BuildpackResolver {
    pub fn new(runner: Arc<dyn ProcessRunner>, buildpacks: Vec<Buildpack>) -> Self {
        Self {
            contract: BuildpackContractRunner::new(runner.clone()),
            runner,
            buildpacks,
            git: PathBuf::from("git"),
        }
    }

    pub fn with_git(mut self, git: impl Into<PathBuf>) -> Self {
        self.git = git.into();
        self
    }

    pub fn buildpacks(&self) -> &[Buildpack] {
        &self.buildpacks
    }

    pub async fn resolve(
        &self,
        app_dir: &Path,
        buildpack_url: Option<&str>,
    ) -> Result<SelectedBuildpack, StagingError> {
        match buildpack_url {
            Some(url) => self.clone_buildpack(app_dir, url).await,
            None => self.detect(app_dir).await,
        }
    }

    /// First local buildpack, in priority order, whose detect phase matches
    pub async fn detect(&self, app_dir: &Path) -> Result<SelectedBuildpack, StagingError> {
        debug!(candidates = self.buildpacks.len(), "Detecting buildpack");

        for buildpack in &self.buildpacks {
            if let Some(reported) = self.contract.detect(buildpack, app_dir).await {
                info!(buildpack = %buildpack.name, reported = %reported, "Selected buildpack");
                return Ok(SelectedBuildpack {
                    buildpack: buildpack.clone(),
                    origin: BuildpackOrigin::Local,
                    reported_name: Some(reported),
                });
            }
        }

        error!(app = %app_dir.display(), "No buildpack matched the application");
        Err(StagingError::NoMatchingBuildpack)
    }

    async fn clone_buildpack(
        &self,
        app_dir: &Path,
        url: &str,
    ) -> Result<SelectedBuildpack, StagingError> {
        let target = app_dir
            .join(REMOTE_BUILDPACKS_DIR)
            .join(checkout_name(url));
        let invocation = Invocation::new(&self.git)
            .arg("clone")
            .arg(url)
            .arg(&target);
        info!(url, target = %target.display(), "Cloning buildpack");

        let cloned = match self.runner.run(&invocation).await {
            Ok(output) => output.success(),
            Err(e) => {
                error!(url, error = %e, "Failed to launch git");
                false
            }
        };
        if !cloned {
            error!(url, "Failed to git clone buildpack");
            return Err(StagingError::BuildpackFetchFailed {
                url: url.to_string(),
            });
        }

        Ok(SelectedBuildpack {
            buildpack: Buildpack::new(target),
            origin: BuildpackOrigin::Remote {
                url: url.to_string(),
            },
            reported_name: None,
        })
    }
}

/// Checkout directory name for a buildpack URL, without a `.git` suffix
fn checkout_name(url: &str) -> String {
    let last = url
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(url);
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        "buildpack".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{MockProcessRunner, ProcessOutput};

    const URL: &str = "git://github.com/heroku/heroku-buildpack-java.git";

    fn local_buildpacks() -> Vec<Buildpack> {
        vec![
            Buildpack::new("/buildpacks/java"),
            Buildpack::new("/buildpacks/nodejs"),
            Buildpack::new("/buildpacks/ruby"),
        ]
    }

    fn resolver(mock: &Arc<MockProcessRunner>) -> BuildpackResolver {
        BuildpackResolver::new(mock.clone(), local_buildpacks())
    }

    #[tokio::test]
    async fn test_first_match_wins_and_stops_probing() {
        let mock = Arc::new(MockProcessRunner::new());
        mock.respond("/buildpacks/java/bin/detect", ProcessOutput::with_status(1));
        mock.respond("/buildpacks/nodejs/bin/detect", ProcessOutput::with_stdout(0, "Node.js"));
        mock.respond("/buildpacks/ruby/bin/detect", ProcessOutput::with_stdout(0, "Ruby"));

        let selected = resolver(&mock)
            .resolve(Path::new("/droplet/app"), None)
            .await
            .unwrap();

        assert_eq!(selected.buildpack.name, "nodejs");
        assert_eq!(selected.name(), "Node.js");
        assert_eq!(selected.origin, BuildpackOrigin::Local);
        assert!(mock.ran("/buildpacks/java/bin/detect"));
        assert!(!mock.ran("/buildpacks/ruby/bin/detect"));
    }

    #[tokio::test]
    async fn test_no_match() {
        let mock = Arc::new(MockProcessRunner::new());
        for bp in local_buildpacks() {
            mock.respond(bp.path.join("bin/detect"), ProcessOutput::with_status(1));
        }

        let result = resolver(&mock).resolve(Path::new("/droplet/app"), None).await;
        assert!(matches!(result, Err(StagingError::NoMatchingBuildpack)));
        assert_eq!(mock.invocations().len(), 3);
    }

    #[tokio::test]
    async fn test_no_local_buildpacks() {
        let mock = Arc::new(MockProcessRunner::new());
        let result = BuildpackResolver::new(mock.clone(), Vec::new())
            .resolve(Path::new("/droplet/app"), None)
            .await;
        assert!(matches!(result, Err(StagingError::NoMatchingBuildpack)));
    }

    #[tokio::test]
    async fn test_url_is_cloned_into_app_without_detection() {
        let mock = Arc::new(MockProcessRunner::new());
        mock.respond("git", ProcessOutput::with_status(0));

        let selected = resolver(&mock)
            .resolve(Path::new("/droplet/app"), Some(URL))
            .await
            .unwrap();

        let invocations = mock.invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(
            invocations[0].to_string(),
            format!(
                "git clone {} /droplet/app/.buildpacks/heroku-buildpack-java",
                URL
            )
        );
        assert_eq!(
            selected.buildpack.path,
            PathBuf::from("/droplet/app/.buildpacks/heroku-buildpack-java")
        );
        assert_eq!(
            selected.origin,
            BuildpackOrigin::Remote {
                url: URL.to_string()
            }
        );
        for bp in local_buildpacks() {
            assert!(!mock.ran(bp.entry_point(crate::buildpack::Phase::Detect)));
        }
    }

    #[tokio::test]
    async fn test_clone_failure() {
        let mock = Arc::new(MockProcessRunner::new());
        mock.respond("/usr/bin/git", ProcessOutput::with_status(128));

        let result = resolver(&mock)
            .with_git("/usr/bin/git")
            .resolve(Path::new("/droplet/app"), Some(URL))
            .await;
        assert!(matches!(
            result,
            Err(StagingError::BuildpackFetchFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_git_missing_is_fetch_failure() {
        let mock = Arc::new(MockProcessRunner::new());
        let result = resolver(&mock)
            .resolve(Path::new("/droplet/app"), Some(URL))
            .await;
        assert!(matches!(
            result,
            Err(StagingError::BuildpackFetchFailed { .. })
        ));
    }

    #[test]
    fn test_checkout_name() {
        assert_eq!(checkout_name(URL), "heroku-buildpack-java");
        assert_eq!(
            checkout_name("https://example.com/buildpacks/custom/"),
            "custom"
        );
        assert_eq!(checkout_name("git@github.com:org/bp.git"), "bp");
    }
}
