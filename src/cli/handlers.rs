use crate::cli::commands::{DetectArgs, StageArgs};
use crate::cli::output::{DetectionReport, OutputFormatter};
use crate::config::StagerConfig;
use crate::pipeline::StagingOrchestrator;
use crate::staging::{StagingError, StagingRequest};
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_USAGE: i32 = 1;
pub const EXIT_STAGING_FAILED: i32 = 2;

fn load_config(
    buildpacks_dir: Option<&PathBuf>,
    cache_dir: Option<&PathBuf>,
) -> Result<StagerConfig> {
    let mut config = StagerConfig::default();
    if let Some(dir) = buildpacks_dir {
        config.buildpacks_dir = dir.clone();
    }
    if let Some(dir) = cache_dir {
        config.cache_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Builds the staging request from a request file or from flags.
///
/// Flags given alongside `--request` override the file's values.
pub fn build_request(args: &StageArgs) -> Result<StagingRequest> {
    let mut request = match (&args.request, &args.source, &args.destination) {
        (Some(path), _, _) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read request file {}", path.display()))?;
            StagingRequest::from_yaml(&content)?
        }
        (None, Some(source), Some(destination)) => StagingRequest::new(source, destination),
        _ => anyhow::bail!("Either --request or both --source and --destination are required"),
    };

    if let Some(framework) = &args.framework {
        request.framework.name = framework.clone();
    }
    if let Some(runtime) = &args.runtime {
        request.runtime.name = runtime.clone();
    }
    if let Some(version) = &args.runtime_version {
        request.runtime.version = version.clone();
    }
    if let Some(executable) = &args.runtime_executable {
        request.runtime.executable = Some(executable.clone());
    }
    if let Some(command) = &args.command {
        request.start_command = Some(command.clone());
    }
    if let Some(url) = &args.buildpack {
        request.buildpack = Some(url.clone());
    }
    if let Some(memory) = args.memory {
        request.memory_mb = Some(memory);
    }

    Ok(request)
}

fn report_staging_error(err: &StagingError) -> i32 {
    error!(kind = err.kind(), "Staging failed: {}", err);
    eprintln!("Error [{}]: {}", err.kind(), err);
    EXIT_STAGING_FAILED
}

pub async fn handle_stage(args: &StageArgs, quiet: bool) -> i32 {
    let config = match load_config(args.buildpacks_dir.as_ref(), args.cache_dir.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return EXIT_USAGE;
        }
    };

    let request = match build_request(args) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return EXIT_USAGE;
        }
    };

    let orchestrator = StagingOrchestrator::new(config);
    let outcome = match orchestrator.stage(&request).await {
        Ok(outcome) => outcome,
        Err(e) => return report_staging_error(&e),
    };

    if !quiet {
        match OutputFormatter::new(args.format.into()).format_outcome(&outcome) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                return EXIT_USAGE;
            }
        }
    }

    info!(droplet = %outcome.droplet.display(), "Droplet ready");
    EXIT_SUCCESS
}

pub async fn handle_detect(args: &DetectArgs) -> i32 {
    let config = match load_config(args.buildpacks_dir.as_ref(), None) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return EXIT_USAGE;
        }
    };

    let orchestrator = StagingOrchestrator::new(config);
    let selected = match orchestrator.detect_buildpack(&args.source).await {
        Ok(selected) => selected,
        Err(e) => return report_staging_error(&e),
    };

    let report = DetectionReport::from(&selected);
    match OutputFormatter::new(args.format.into()).format_detection(&report) {
        Ok(text) => {
            println!("{}", text);
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_USAGE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{CliArgs, Commands};
    use clap::Parser;
    use tempfile::TempDir;

    fn stage_args(argv: &[&str]) -> StageArgs {
        let mut full = vec!["stager", "stage"];
        full.extend_from_slice(argv);
        match CliArgs::parse_from(full).command {
            Commands::Stage(args) => args,
            _ => panic!("Expected Stage command"),
        }
    }

    #[test]
    fn test_build_request_from_flags() {
        let args = stage_args(&[
            "--source",
            "/src",
            "--destination",
            "/droplet",
            "--framework",
            "node",
            "--runtime-executable",
            "/usr/bin/node",
            "--memory",
            "128",
        ]);
        let request = build_request(&args).unwrap();

        assert_eq!(request.source_dir, PathBuf::from("/src"));
        assert_eq!(request.framework.name, "node");
        assert_eq!(request.runtime.executable.as_deref(), Some("/usr/bin/node"));
        assert_eq!(request.memory_mb, Some(128));
        assert!(request.start_command.is_none());
    }

    #[test]
    fn test_build_request_file_with_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("request.yml");
        fs::write(
            &path,
            "source_dir: /src\ndestination_dir: /droplet\ncommand: ruby app.rb\nframework:\n  name: sinatra\n",
        )
        .unwrap();

        let args = stage_args(&[
            "--request",
            path.to_str().unwrap(),
            "--command",
            "bundle exec ruby app.rb",
        ]);
        let request = build_request(&args).unwrap();

        assert_eq!(request.framework.name, "sinatra");
        assert_eq!(
            request.start_command_override(),
            Some("bundle exec ruby app.rb")
        );
    }

    #[test]
    fn test_build_request_missing_file() {
        let args = stage_args(&["--request", "/nonexistent/request.yml"]);
        assert!(build_request(&args).is_err());
    }

    #[tokio::test]
    async fn test_handle_stage_reports_staging_failure() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        fs::create_dir_all(&source).unwrap();
        let buildpacks = dir.path().join("buildpacks");
        fs::create_dir_all(&buildpacks).unwrap();

        let args = stage_args(&[
            "--source",
            source.to_str().unwrap(),
            "--destination",
            dir.path().join("droplet").to_str().unwrap(),
            "--buildpacks-dir",
            buildpacks.to_str().unwrap(),
            "--cache-dir",
            dir.path().join("cache").to_str().unwrap(),
        ]);

        assert_eq!(handle_stage(&args, true).await, EXIT_STAGING_FAILED);
    }
}
