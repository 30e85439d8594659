//! Operator console layered onto apps staged by the Rails buildpack

use crate::staging::{Droplet, StagingError};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Name the Ruby buildpack's detect phase reports for Rails apps
pub const RAILS_BUILDPACK_NAME: &str = "Ruby/Rails";

pub const CONSOLE_DIR: &str = "cf-rails-console";

const CONSOLE_SCRIPT: &str = include_str!("resources/rails_console.rb");

const CONSOLE_START: &str = r#"if [ -n "$VCAP_CONSOLE_PORT" ]; then
  cd app
  bundle exec ruby cf-rails-console/rails_console.rb >> ../logs/console.log 2>> ../logs/console.log &
  CONSOLE_STARTED=$!
  echo "$CONSOLE_STARTED" >> ../console.pid
  cd ..
fi"#;

/// Contents of `.consoleaccess`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleAccess {
    pub username: String,
    pub password: String,
}

impl ConsoleAccess {
    pub fn generate() -> Self {
        Self {
            username: format!("cf-{}", Uuid::new_v4().simple()),
            password: Uuid::new_v4().simple().to_string(),
        }
    }
}

pub fn applies_to(buildpack_name: &str) -> bool {
    buildpack_name == RAILS_BUILDPACK_NAME
}

/// Writes the console script and credentials into the droplet's app directory.
///
/// Returns the startup block that launches the console.
pub fn install(droplet: &Droplet) -> Result<&'static str, StagingError> {
    let console_dir = Path::new("app").join(CONSOLE_DIR);
    droplet.write_file(console_dir.join("rails_console.rb"), CONSOLE_SCRIPT)?;

    let access = serde_yaml::to_string(&ConsoleAccess::generate())
        .map_err(|e| {
            StagingError::io(
                "Failed to serialize console credentials",
                io::Error::new(io::ErrorKind::InvalidData, e),
            )
        })?;
    droplet.write_file(console_dir.join(".consoleaccess"), &access)?;

    info!(dir = %droplet.app_dir().join(CONSOLE_DIR).display(), "Installed rails console");
    Ok(CONSOLE_START)
}
