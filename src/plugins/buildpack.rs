//! Generic buildpack staging: select, compile, release, resolve the start command

use super::{rails_console, LaunchPlan, StagingPlugin};
use crate::buildpack::{BuildpackContractRunner, BuildpackResolver, ReleaseMetadata};
use crate::fs::FileSystem;
use crate::staging::{
    Droplet, EnvironmentScriptBuilder, EnvironmentVars, ProcfileResolver, StagingError,
    StagingRequest, StartCommandResolver,
};
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const BEFORE_PROFILE: &str = "unset GEM_PATH";
const AFTER_PROFILE: &str = "env > logs/env.log";

pub struct BuildpackPlugin {
    resolver: BuildpackResolver,
    contract: BuildpackContractRunner,
    fs: Arc<dyn FileSystem>,
    /// Parent of the per-app compile caches
    cache_root: PathBuf,
}

impl BuildpackPlugin {
    pub fn new(
        resolver: BuildpackResolver,
        contract: BuildpackContractRunner,
        fs: Arc<dyn FileSystem>,
        cache_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            contract,
            fs,
            cache_root: cache_root.into(),
        }
    }

    /// Compile cache for one app, keyed by the droplet's location.
    ///
    /// Runs for different droplets never share a cache directory; restaging
    /// into the same droplet reuses its cache.
    pub fn cache_dir_for(&self, droplet: &Droplet) -> PathBuf {
        let location = fs::canonicalize(droplet.root())
            .unwrap_or_else(|_| droplet.root().to_path_buf());
        let key = Uuid::new_v5(&Uuid::NAMESPACE_URL, location.to_string_lossy().as_bytes());
        self.cache_root.join(key.simple().to_string())
    }

    /// Launch environment: release `config_vars` (existing values win), then
    /// the platform variables
    pub fn environment(request: &StagingRequest, release: &ReleaseMetadata) -> EnvironmentVars {
        let mut vars = EnvironmentVars::new();
        for (name, value) in release.config_vars() {
            vars.set(name.as_str(), format!("${{{}:-{}}}", name, value));
        }
        vars.set("HOME", "$PWD/app");
        vars.set("PORT", "$VCAP_APP_PORT");
        if let Some(url) = request.database_url() {
            vars.set("DATABASE_URL", url);
        }
        if let Some(memory) = request.memory_mb {
            vars.set("MEMORY_LIMIT", format!("{}m", memory));
        }
        vars
    }
}

#[async_trait]
impl StagingPlugin for BuildpackPlugin {
    fn name(&self) -> &'static str {
        "buildpack"
    }

    async fn stage(
        &self,
        request: &StagingRequest,
        droplet: &Droplet,
    ) -> Result<LaunchPlan, StagingError> {
        let app_dir = droplet.app_dir();

        let selected = self
            .resolver
            .resolve(&app_dir, request.buildpack_url())
            .await?;

        let cache_dir = self.cache_dir_for(droplet);
        fs::create_dir_all(&cache_dir).map_err(|e| StagingError::io_at("create", &cache_dir, e))?;
        debug!(cache = %cache_dir.display(), "Using compile cache");
        self.contract
            .compile(&selected.buildpack, &app_dir, &cache_dir)
            .await?;
        let release = self.contract.release(&selected.buildpack, &app_dir).await?;

        // An explicit command short-circuits the Procfile entirely
        let override_command = request.start_command_override();
        let procfile = match override_command {
            Some(_) => None,
            None => ProcfileResolver::new(self.fs.as_ref()).resolve(&app_dir)?,
        };
        let start_command = StartCommandResolver::new()
            .with_override(override_command)
            .with_procfile(procfile.as_ref())
            .with_release(Some(&release))
            .resolve()?;

        let mut scripts = EnvironmentScriptBuilder::new(Self::environment(request, &release))
            .pre_launch(BEFORE_PROFILE)
            .after_profile(AFTER_PROFILE);

        if rails_console::applies_to(selected.name()) {
            scripts = scripts.after_profile(rails_console::install(droplet)?);
        }

        info!(buildpack = %selected.name(), "Buildpack staging complete");
        let mut plan = LaunchPlan::new(start_command, scripts);
        plan.buildpack = Some(selected);
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildpack::Buildpack;
    use crate::fs::MockFileSystem;
    use crate::process::{MockProcessRunner, ProcessOutput};
    use crate::staging::{ServiceBinding, StartCommandSource};
    use serde_json::json;
    use tempfile::TempDir;

    const RELEASE: &str = "---\nconfig_vars:\n  FROM_BUILD_PACK: yes\ndefault_process_types:\n  web: node app.js --from-buildpack=true\n";

    struct Fixture {
        mock: Arc<MockProcessRunner>,
        fs: Arc<MockFileSystem>,
        cache: TempDir,
    }

    impl Fixture {
        fn new(release: &str) -> Self {
            let mock = Arc::new(MockProcessRunner::new());
            mock.respond("/bp/nodejs/bin/detect", ProcessOutput::with_stdout(0, "Node.js"));
            mock.respond("/bp/nodejs/bin/compile", ProcessOutput::with_status(0));
            mock.respond("/bp/nodejs/bin/release", ProcessOutput::with_stdout(0, release));

            let fs = Arc::new(MockFileSystem::with_root(PathBuf::from("/droplet/app")));
            fs.add_file("app.js", "");

            Self {
                mock,
                fs,
                cache: TempDir::new().unwrap(),
            }
        }

        fn plugin(&self) -> BuildpackPlugin {
            let resolver =
                BuildpackResolver::new(self.mock.clone(), vec![Buildpack::new("/bp/nodejs")]);
            BuildpackPlugin::new(
                resolver,
                BuildpackContractRunner::new(self.mock.clone()),
                self.fs.clone(),
                self.cache.path().join("cache"),
            )
        }

        async fn stage(&self, request: &StagingRequest) -> Result<LaunchPlan, StagingError> {
            self.plugin().stage(request, &Droplet::new("/droplet")).await
        }
    }

    fn request() -> StagingRequest {
        StagingRequest::new("/src", "/droplet")
    }

    #[tokio::test]
    async fn test_runs_phases_in_order() {
        let fixture = Fixture::new(RELEASE);
        let plan = fixture.stage(&request()).await.unwrap();

        let programs: Vec<String> = fixture
            .mock
            .invocations()
            .iter()
            .map(|i| i.program.display().to_string())
            .collect();
        assert_eq!(
            programs,
            vec!["/bp/nodejs/bin/detect", "/bp/nodejs/bin/compile", "/bp/nodejs/bin/release"]
        );
        assert_eq!(plan.start_command.command, "node app.js --from-buildpack=true");
        assert_eq!(plan.start_command.source, StartCommandSource::Release);
        assert_eq!(plan.buildpack.unwrap().name(), "Node.js");
        let cache_dir = fixture.plugin().cache_dir_for(&Droplet::new("/droplet"));
        assert!(cache_dir.starts_with(fixture.cache.path().join("cache")));
        assert!(cache_dir.is_dir());

        let compile = &fixture.mock.invocations()[1];
        assert_eq!(
            compile.args,
            vec!["/droplet/app".to_string(), cache_dir.display().to_string()]
        );
    }

    #[test]
    fn test_cache_dir_is_per_droplet() {
        let fixture = Fixture::new(RELEASE);
        let plugin = fixture.plugin();

        let first = plugin.cache_dir_for(&Droplet::new("/droplets/first"));
        let second = plugin.cache_dir_for(&Droplet::new("/droplets/second"));

        assert_ne!(first, second);
        assert_eq!(first, plugin.cache_dir_for(&Droplet::new("/droplets/first")));
        assert_eq!(first.parent(), Some(fixture.cache.path().join("cache").as_path()));
    }

    #[tokio::test]
    async fn test_environment_from_release() {
        let fixture = Fixture::new(RELEASE);
        let mut request = request();
        request.memory_mb = Some(512);
        request.services.push(ServiceBinding {
            name: "db".to_string(),
            label: "postgresql-9.0".to_string(),
            credentials: json!({"uri": "postgres://u:p@db:5432/app"})
                .as_object()
                .cloned()
                .unwrap(),
        });

        let plan = fixture.stage(&request).await.unwrap();
        let script = plan.startup_script();

        assert!(script.contains("export FROM_BUILD_PACK=\"${FROM_BUILD_PACK:-yes}\"\n"));
        assert!(script.contains("export HOME=\"$PWD/app\"\n"));
        assert!(script.contains("export PORT=\"$VCAP_APP_PORT\"\n"));
        assert!(script.contains("export DATABASE_URL=\"postgres://u:p@db:5432/app\"\n"));
        assert!(script.contains("export MEMORY_LIMIT=\"512m\"\n"));
        assert!(script.contains("unset GEM_PATH\n"));
        assert!(script.contains("env > logs/env.log\n"));
        assert!(!script.contains("rails_console.rb"));
    }

    #[tokio::test]
    async fn test_procfile_beats_release() {
        let fixture = Fixture::new(RELEASE);
        fixture
            .fs
            .add_file("Procfile", "web: node app.js --from-procfile=true\n");

        let plan = fixture.stage(&request()).await.unwrap();
        assert_eq!(plan.start_command.command, "node app.js --from-procfile=true");
    }

    #[tokio::test]
    async fn test_override_ignores_invalid_procfile() {
        let fixture = Fixture::new(RELEASE);
        fixture.fs.add_file("Procfile", "- not\n- a mapping\n");
        let mut request = request();
        request.start_command = Some("node app.js --from-manifest=true".to_string());

        let plan = fixture.stage(&request).await.unwrap();
        assert_eq!(plan.start_command.command, "node app.js --from-manifest=true");
        assert_eq!(plan.start_command.source, StartCommandSource::Override);
    }

    #[tokio::test]
    async fn test_invalid_procfile() {
        let fixture = Fixture::new(RELEASE);
        fixture.fs.add_file("Procfile", "- not\n- a mapping\n");

        let result = fixture.stage(&request()).await;
        assert!(matches!(result, Err(StagingError::InvalidProcfileFormat)));
    }

    #[tokio::test]
    async fn test_no_start_command() {
        let fixture = Fixture::new("---\nconfig_vars:\n  A: b\n");
        let result = fixture.stage(&request()).await;
        assert!(matches!(result, Err(StagingError::NoStartCommand)));
    }

    #[tokio::test]
    async fn test_compile_failure_skips_release() {
        let fixture = Fixture::new(RELEASE);
        fixture
            .mock
            .respond("/bp/nodejs/bin/compile", ProcessOutput::with_status(1));

        let result = fixture.stage(&request()).await;
        assert!(matches!(
            result,
            Err(StagingError::BuildpackCompileFailed { .. })
        ));
        assert!(!fixture.mock.ran("/bp/nodejs/bin/release"));
    }
}
