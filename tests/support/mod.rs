//! Shared helpers for staging integration tests
//!
//! Fake buildpacks are small `/bin/sh` programs written into a temp directory,
//! so the tests drive the real process runner end to end.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use stager::{StagerConfig, StagingRequest};

pub const RELEASE_WITH_START_CMD: &str = "---
config_vars:
  FROM_BUILD_PACK: yes
default_process_types:
  web: node app.js --from-buildpack=true
";

pub const RELEASE_WITHOUT_START_CMD: &str = "---
config_vars:
  FROM_BUILD_PACK: yes
";

pub const RELEASE_RAILS: &str = "---
config_vars:
  RAILS_ENV: production
default_process_types:
  web: bundle exec rails server --from-buildpack=true
";

pub const PROFILE_D_BLOCK: &str = "if [ -d app/.profile.d ]; then
  for i in app/.profile.d/*.sh; do
    if [ -r $i ]; then
      . $i
    fi
  done
  unset i
fi
";

pub fn write_executable(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// A scratch area holding buildpacks, an app source tree and a droplet path
pub struct StagingWorkspace {
    pub dir: TempDir,
}

impl StagingWorkspace {
    pub fn new() -> Self {
        let workspace = Self {
            dir: TempDir::new().unwrap(),
        };
        fs::create_dir_all(workspace.buildpacks_dir()).unwrap();
        fs::create_dir_all(workspace.source_dir()).unwrap();
        workspace
    }

    pub fn buildpacks_dir(&self) -> PathBuf {
        self.dir.path().join("buildpacks")
    }

    pub fn source_dir(&self) -> PathBuf {
        self.dir.path().join("source")
    }

    pub fn droplet_dir(&self) -> PathBuf {
        self.dir.path().join("droplet")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    pub fn config(&self) -> StagerConfig {
        StagerConfig {
            buildpacks_dir: self.buildpacks_dir(),
            cache_dir: self.cache_dir(),
            git: PathBuf::from("git"),
            log_level: "info".to_string(),
        }
    }

    pub fn request(&self) -> StagingRequest {
        StagingRequest::new(self.source_dir(), self.droplet_dir())
    }

    /// Installs a buildpack whose detect prints `detect_name` (or fails when
    /// `None`) and whose release prints `release`.
    pub fn add_buildpack(&self, name: &str, detect_name: Option<&str>, release: &str) -> PathBuf {
        let root = self.buildpacks_dir().join(name);
        let detect = match detect_name {
            Some(reported) => format!("#!/bin/sh\necho \"{}\"\nexit 0\n", reported),
            None => "#!/bin/sh\nexit 1\n".to_string(),
        };
        write_executable(&root.join("bin/detect"), &detect);
        write_executable(
            &root.join("bin/compile"),
            "#!/bin/sh\necho \"-----> Compiling in $1\"\ntouch \"$1/.compiled\"\nexit 0\n",
        );
        write_executable(
            &root.join("bin/release"),
            &format!("#!/bin/sh\ncat <<'RELEASE'\n{}RELEASE\n", release),
        );
        root
    }

    pub fn add_source_file(&self, relative: &str, content: &str) {
        let path = self.source_dir().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// The node app used by most buildpack scenarios
    pub fn node_app(&self) {
        self.add_source_file("app.js", "require('http').createServer().listen(process.env.PORT);\n");
        self.add_source_file("package.json", "{\"name\": \"node-app\"}\n");
    }

    pub fn startup_script(&self) -> String {
        fs::read_to_string(self.droplet_dir().join("startup")).unwrap()
    }
}

pub fn launches(start_command: &str) -> String {
    format!(
        "{} > $DROPLET_BASE_DIR/logs/stdout.log 2> $DROPLET_BASE_DIR/logs/stderr.log &",
        start_command
    )
}

pub fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
