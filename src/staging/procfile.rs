use crate::fs::FileSystem;
use crate::staging::StagingError;
use serde_yaml::Value;
use std::path::Path;
use tracing::{debug, warn};

pub const PROCFILE_NAME: &str = "Procfile";

/// Process declarations from an app's `Procfile`, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Procfile {
    processes: Vec<(String, String)>,
}

impl Procfile {
    /// Parses a Procfile. The top level must be a mapping of process type to command.
    pub fn parse(content: &str) -> Result<Self, StagingError> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| {
            debug!(error = %e, "Procfile is not valid YAML");
            StagingError::InvalidProcfileFormat
        })?;

        let Value::Mapping(mapping) = value else {
            return Err(StagingError::InvalidProcfileFormat);
        };

        let mut processes = Vec::with_capacity(mapping.len());
        for (name, command) in mapping {
            let name = match name {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                _ => return Err(StagingError::InvalidProcfileFormat),
            };
            let Value::String(command) = command else {
                return Err(StagingError::InvalidProcfileFormat);
            };
            processes.push((name, command));
        }

        Ok(Self { processes })
    }

    pub fn get(&self, process_type: &str) -> Option<&str> {
        self.processes
            .iter()
            .find(|(name, _)| name == process_type)
            .map(|(_, command)| command.as_str())
    }

    pub fn web(&self) -> Option<&str> {
        self.get("web")
    }

    pub fn process_types(&self) -> impl Iterator<Item = &str> {
        self.processes.iter().map(|(name, _)| name.as_str())
    }
}

/// Loads the optional `Procfile` at an app root
pub struct ProcfileResolver<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> ProcfileResolver<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// `Ok(None)` when the app has no Procfile
    pub fn resolve(&self, app_dir: &Path) -> Result<Option<Procfile>, StagingError> {
        let path = app_dir.join(PROCFILE_NAME);
        if !self.fs.is_file(&path) {
            debug!(path = %path.display(), "No Procfile present");
            return Ok(None);
        }

        let content = self.fs.read_to_string(&path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Unable to read Procfile");
            StagingError::InvalidProcfileFormat
        })?;

        let procfile = Procfile::parse(&content)?;
        debug!(
            process_types = ?procfile.process_types().collect::<Vec<_>>(),
            "Loaded Procfile"
        );
        Ok(Some(procfile))
    }
}
