//! Staging request: everything a single staging run consumes
//!
//! A request is deserialized from YAML or JSON (or assembled from CLI flags)
//! and is never mutated once staging begins.

use crate::plugins::entry_point::EntryPattern;
use crate::staging::StagingError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

pub const BUILDPACK_FRAMEWORK: &str = "buildpack";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingRequest {
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,

    #[serde(default)]
    pub runtime: RuntimeInfo,

    #[serde(default)]
    pub framework: FrameworkInfo,

    /// Operator or manifest supplied start command
    #[serde(default, alias = "command")]
    pub start_command: Option<String>,

    /// Source-control URL of a buildpack that replaces local detection
    #[serde(default)]
    pub buildpack: Option<String>,

    #[serde(default)]
    pub services: Vec<ServiceBinding>,

    #[serde(default, alias = "memory")]
    pub memory_mb: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub executable: Option<String>,
}

impl RuntimeInfo {
    pub fn executable_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.executable
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkInfo {
    pub name: String,

    /// Entry-point patterns overriding the framework's built-in ones
    #[serde(default)]
    pub detection: Vec<EntryPattern>,
}

impl Default for FrameworkInfo {
    fn default() -> Self {
        Self {
            name: BUILDPACK_FRAMEWORK.to_string(),
            detection: Vec::new(),
        }
    }
}

/// A bound service. Passed through to the app environment, never provisioned here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceBinding {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub credentials: Map<String, Value>,
}

impl ServiceBinding {
    fn credential(&self, key: &str) -> Option<String> {
        match self.credentials.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn database_scheme(&self) -> Option<&'static str> {
        if self.label.starts_with("mysql") {
            Some("mysql2")
        } else if self.label.starts_with("postgresql") {
            Some("postgres")
        } else {
            None
        }
    }

    /// Connection URL for relational database bindings
    pub fn database_url(&self) -> Option<String> {
        let scheme = self.database_scheme()?;

        if let Some(uri) = self.credential("uri") {
            let rest = uri.split_once("://").map(|(_, rest)| rest)?;
            return Some(format!("{}://{}", scheme, rest));
        }

        let user = self
            .credential("username")
            .or_else(|| self.credential("user"))?;
        let password = self.credential("password")?;
        let host = self
            .credential("host")
            .or_else(|| self.credential("hostname"))?;
        let port = self.credential("port")?;
        let name = self.credential("name")?;
        Some(format!(
            "{}://{}:{}@{}:{}/{}",
            scheme, user, password, host, port, name
        ))
    }
}

impl StagingRequest {
    pub fn new(source_dir: impl Into<PathBuf>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            destination_dir: destination_dir.into(),
            runtime: RuntimeInfo::default(),
            framework: FrameworkInfo::default(),
            start_command: None,
            buildpack: None,
            services: Vec::new(),
            memory_mb: None,
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, StagingError> {
        serde_yaml::from_str(content).map_err(|e| StagingError::InvalidRequest(e.to_string()))
    }

    /// The explicit start command, ignoring blank values
    pub fn start_command_override(&self) -> Option<&str> {
        self.start_command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn buildpack_url(&self) -> Option<&str> {
        self.buildpack
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// First bound relational database, if any
    pub fn database_url(&self) -> Option<String> {
        self.services.iter().find_map(ServiceBinding::database_url)
    }

    pub fn validate(&self) -> Result<(), StagingError> {
        if !self.source_dir.is_dir() {
            return Err(StagingError::InvalidRequest(format!(
                "source directory {} does not exist",
                self.source_dir.display()
            )));
        }
        if self.destination_dir.as_os_str().is_empty() {
            return Err(StagingError::InvalidRequest(
                "destination directory is required".to_string(),
            ));
        }
        if self.framework.name.trim().is_empty() {
            return Err(StagingError::InvalidRequest(
                "framework name is required".to_string(),
            ));
        }
        Ok(())
    }
}
