//! Entry-file detection for frameworks without a standard start command
//!
//! Only the legacy framework plugins use this; buildpack staging never guesses.

use crate::fs::FileSystem;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// A filename glob matched against the app root, optionally narrowed by a
/// regex the file content must match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPattern {
    pub glob: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl EntryPattern {
    pub fn new(glob: impl Into<String>) -> Self {
        Self {
            glob: glob.into(),
            content: None,
        }
    }

    pub fn with_content(mut self, regex: impl Into<String>) -> Self {
        self.content = Some(regex.into());
        self
    }
}

pub struct EntryPointDetector<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> EntryPointDetector<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Name of the first root-level file matching the patterns.
    ///
    /// Patterns are tried in order; within a pattern files are tried by name.
    pub fn detect(&self, app_dir: &Path, patterns: &[EntryPattern]) -> Option<String> {
        let entries = match self.fs.read_dir(app_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(app = %app_dir.display(), error = %e, "Unable to list app files");
                return None;
            }
        };

        for pattern in patterns {
            let Ok(glob) = Pattern::new(&pattern.glob) else {
                warn!(pattern = %pattern.glob, "Ignoring invalid entry-point glob");
                continue;
            };
            let content = match pattern.content.as_deref().map(Regex::new) {
                None => None,
                Some(Ok(regex)) => Some(regex),
                Some(Err(e)) => {
                    warn!(pattern = %pattern.glob, error = %e, "Ignoring invalid entry-point regex");
                    continue;
                }
            };

            let found = entries
                .iter()
                .filter(|e| e.is_file() && glob.matches(e.file_name()))
                .find(|e| match &content {
                    None => true,
                    Some(regex) => self
                        .fs
                        .read_to_string(e.path())
                        .map(|text| regex.is_match(&text))
                        .unwrap_or(false),
                });

            if let Some(entry) = found {
                debug!(pattern = %pattern.glob, file = %entry.file_name(), "Detected entry point");
                return Some(entry.file_name().to_string());
            }
        }

        None
    }
}
