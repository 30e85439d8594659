//! On-disk layout of a staged droplet
//!
//! ```text
//! <root>/app      application files plus compiled dependencies
//! <root>/logs     stdout.log, stderr.log, env.log
//! <root>/tmp
//! <root>/startup  generated launch script
//! <root>/stop     generated stop script
//! ```

use crate::staging::StagingError;
use ignore::WalkBuilder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const STARTUP_SCRIPT: &str = "startup";
pub const STOP_SCRIPT: &str = "stop";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Droplet {
    root: PathBuf,
}

impl Droplet {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn app_dir(&self) -> PathBuf {
        self.root.join("app")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    /// Creates `app/`, `logs/` and `tmp/` under the droplet root
    pub fn create_directories(&self) -> Result<(), StagingError> {
        for dir in [self.app_dir(), self.logs_dir(), self.tmp_dir()] {
            fs::create_dir_all(&dir).map_err(|e| StagingError::io_at("create", &dir, e))?;
        }
        Ok(())
    }

    /// Copies the app source tree into `app/`, hidden files and symlinks included.
    ///
    /// The droplet may live inside the source tree; it is never walked. Must
    /// run after [`Droplet::create_directories`]. Returns the number of files
    /// copied.
    pub fn copy_source(&self, source: &Path) -> Result<usize, StagingError> {
        let app_dir = self.app_dir();
        let mut copied = 0;

        let source =
            fs::canonicalize(source).map_err(|e| StagingError::io_at("resolve", source, e))?;
        let root = fs::canonicalize(&self.root)
            .map_err(|e| StagingError::io_at("resolve", &self.root, e))?;

        let walker = WalkBuilder::new(&source)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| !entry.path().starts_with(&root))
            .build();

        for entry in walker {
            let entry = entry.map_err(|e| {
                StagingError::io(
                    format!("Failed to walk {}", source.display()),
                    io::Error::new(io::ErrorKind::Other, e.to_string()),
                )
            })?;
            let path = entry.path();
            if entry.depth() == 0 {
                continue;
            }

            let relative = match path.strip_prefix(&source) {
                Ok(relative) => relative,
                Err(_) => continue,
            };
            let target = app_dir.join(relative);
            let Some(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                fs::create_dir_all(&target)
                    .map_err(|e| StagingError::io_at("create", &target, e))?;
            } else if file_type.is_symlink() {
                copy_symlink(path, &target)?;
            } else {
                fs::copy(path, &target).map_err(|e| StagingError::io_at("copy", &target, e))?;
                copied += 1;
            }
        }

        debug!(files = copied, app_dir = %app_dir.display(), "Copied application source");
        Ok(copied)
    }

    /// Writes a file relative to the droplet root, creating parent directories
    pub fn write_file(&self, relative: impl AsRef<Path>, content: &str) -> Result<PathBuf, StagingError> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StagingError::io_at("create", parent, e))?;
        }
        fs::write(&path, content).map_err(|e| StagingError::io_at("write", &path, e))?;
        Ok(path)
    }

    /// Writes an executable (0755) script relative to the droplet root
    pub fn write_script(&self, relative: impl AsRef<Path>, content: &str) -> Result<PathBuf, StagingError> {
        let path = self.write_file(relative, content)?;
        make_executable(&path)?;
        Ok(path)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), StagingError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| StagingError::io_at("chmod", path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), StagingError> {
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), StagingError> {
    let destination = fs::read_link(link).map_err(|e| StagingError::io_at("read link", link, e))?;
    std::os::unix::fs::symlink(&destination, target)
        .map_err(|e| StagingError::io_at("create link", target, e))
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), StagingError> {
    fs::copy(link, target)
        .map(|_| ())
        .map_err(|e| StagingError::io_at("copy", target, e))
}
