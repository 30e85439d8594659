//! Output formatting for command results
//!
//! Results render as JSON, YAML or a short human-readable summary on stdout.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::buildpack::{BuildpackOrigin, SelectedBuildpack};
use crate::pipeline::StagingOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Human,
}

/// Serializable view of a detected buildpack
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub name: String,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<&SelectedBuildpack> for DetectionReport {
    fn from(selected: &SelectedBuildpack) -> Self {
        let url = match &selected.origin {
            BuildpackOrigin::Local => None,
            BuildpackOrigin::Remote { url } => Some(url.clone()),
        };
        Self {
            name: selected.name().to_string(),
            path: selected.buildpack.path.clone(),
            url,
        }
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_outcome(&self, outcome: &StagingOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome)
                .context("Failed to serialize staging outcome to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(outcome)
                .context("Failed to serialize staging outcome to YAML"),
            OutputFormat::Human => Ok(Self::outcome_human(outcome)),
        }
    }

    pub fn format_detection(&self, report: &DetectionReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report)
                .context("Failed to serialize detection report to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(report)
                .context("Failed to serialize detection report to YAML"),
            OutputFormat::Human => Ok(format!("{} ({})", report.name, report.path.display())),
        }
    }

    fn outcome_human(outcome: &StagingOutcome) -> String {
        let mut lines = vec![format!("Staged droplet: {}", outcome.droplet.display())];
        lines.push(format!("  Plugin:        {}", outcome.plugin));
        if let Some(buildpack) = &outcome.buildpack {
            lines.push(format!("  Buildpack:     {}", buildpack));
        }
        if let Some(entry_point) = &outcome.entry_point {
            lines.push(format!("  Entry point:   {}", entry_point));
        }
        lines.push(format!(
            "  Start command: {} ({})",
            outcome.start_command.command, outcome.start_command.source
        ));
        lines.push(format!("  Startup:       {}", outcome.startup_script.display()));
        lines.push(format!("  Stop:          {}", outcome.stop_script.display()));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildpack::Buildpack;
    use crate::staging::{StartCommand, StartCommandSource};

    fn outcome() -> StagingOutcome {
        StagingOutcome {
            droplet: PathBuf::from("/droplet"),
            plugin: "buildpack".to_string(),
            start_command: StartCommand::new("node app.js", StartCommandSource::Procfile),
            buildpack: Some("Node.js".to_string()),
            entry_point: None,
            startup_script: PathBuf::from("/droplet/startup"),
            stop_script: PathBuf::from("/droplet/stop"),
        }
    }

    #[test]
    fn test_human_outcome() {
        let text = OutputFormatter::new(OutputFormat::Human)
            .format_outcome(&outcome())
            .unwrap();
        assert!(text.contains("Staged droplet: /droplet"));
        assert!(text.contains("Buildpack:     Node.js"));
        assert!(text.contains("node app.js (Procfile)"));
        assert!(!text.contains("Entry point"));
    }

    #[test]
    fn test_json_outcome() {
        let text = OutputFormatter::new(OutputFormat::Json)
            .format_outcome(&outcome())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["start_command"]["command"], "node app.js");
        assert_eq!(value["buildpack"], "Node.js");
    }

    #[test]
    fn test_detection_report() {
        let selected = SelectedBuildpack {
            buildpack: Buildpack::new("/bp/ruby"),
            origin: BuildpackOrigin::Local,
            reported_name: Some("Ruby/Rails".to_string()),
        };
        let report = DetectionReport::from(&selected);
        let text = OutputFormatter::new(OutputFormat::Human)
            .format_detection(&report)
            .unwrap();
        assert_eq!(text, "Ruby/Rails (/bp/ruby)");

        let yaml = OutputFormatter::new(OutputFormat::Yaml)
            .format_detection(&report)
            .unwrap();
        assert!(!yaml.contains("url"));
    }
}
