//! Startup and stop script generation
//!
//! Scripts are pure functions of their inputs: rendering the same environment,
//! blocks and start command twice yields byte-identical text.

use std::fmt::Write as _;

pub const STDOUT_LOG: &str = "$DROPLET_BASE_DIR/logs/stdout.log";
pub const STDERR_LOG: &str = "$DROPLET_BASE_DIR/logs/stderr.log";
pub const PID_FILE: &str = "$DROPLET_BASE_DIR/run.pid";

const SHEBANG: &str = "#!/bin/bash";
const BASE_DIR_DEFAULT: &str = "DROPLET_BASE_DIR=\"${DROPLET_BASE_DIR:-$PWD}\"";

const PROFILE_D_SOURCING: &str = "\
if [ -d app/.profile.d ]; then
  for i in app/.profile.d/*.sh; do
    if [ -r $i ]; then
      . $i
    fi
  done
  unset i
fi";

/// Ordered environment for a startup script.
///
/// Variables render in first-insertion order. Setting a name again replaces
/// its value in place, so the last write wins without reordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentVars {
    entries: Vec<(String, Option<String>)>,
}

impl EnvironmentVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.put(name.into(), Some(value.into()))
    }

    /// Renders as `unset NAME` instead of an export
    pub fn unset(&mut self, name: impl Into<String>) -> &mut Self {
        self.put(name.into(), None)
    }

    fn put(&mut self, name: String, value: Option<String>) -> &mut Self {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_deref()))
    }

    fn statements(&self) -> impl Iterator<Item = String> + '_ {
        self.iter().map(|(name, value)| match value {
            Some(value) => format!("export {}=\"{}\"", name, value),
            None => format!("unset {}", name),
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvironmentVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = EnvironmentVars::new();
        for (name, value) in iter {
            vars.set(name, value);
        }
        vars
    }
}

/// Renders the `startup` and `stop` scripts of a droplet
#[derive(Debug, Clone)]
pub struct EnvironmentScriptBuilder {
    environment: EnvironmentVars,
    pre_launch: Vec<String>,
    post_profile: Vec<String>,
    stdout_log: String,
    stderr_log: String,
}

impl EnvironmentScriptBuilder {
    pub fn new(environment: EnvironmentVars) -> Self {
        Self {
            environment,
            pre_launch: Vec::new(),
            post_profile: Vec::new(),
            stdout_log: STDOUT_LOG.to_string(),
            stderr_log: STDERR_LOG.to_string(),
        }
    }

    /// Shell statements run after the exports, before `.profile.d` is sourced
    pub fn pre_launch(mut self, block: impl Into<String>) -> Self {
        self.pre_launch.push(block.into());
        self
    }

    /// Shell statements run after `.profile.d` is sourced, before the app starts
    pub fn after_profile(mut self, block: impl Into<String>) -> Self {
        self.post_profile.push(block.into());
        self
    }

    pub fn logs(mut self, stdout_log: impl Into<String>, stderr_log: impl Into<String>) -> Self {
        self.stdout_log = stdout_log.into();
        self.stderr_log = stderr_log.into();
        self
    }

    pub fn environment(&self) -> &EnvironmentVars {
        &self.environment
    }

    pub fn startup_script(&self, start_command: &str) -> String {
        let mut lines: Vec<String> = vec![SHEBANG.to_string(), BASE_DIR_DEFAULT.to_string()];
        lines.extend(self.environment.statements());
        lines.extend(self.pre_launch.iter().cloned());
        lines.push(PROFILE_D_SOURCING.to_string());
        lines.extend(self.post_profile.iter().cloned());
        lines.push("cd app".to_string());
        lines.push(format!(
            "{} > {} 2> {} &",
            start_command.trim(),
            self.stdout_log,
            self.stderr_log
        ));
        lines.push("STARTED=$!".to_string());
        lines.push(format!("echo \"$STARTED\" > {}", PID_FILE));
        lines.push("wait $STARTED".to_string());

        render(&lines)
    }

    pub fn stop_script(&self) -> String {
        let read_pid_file = format!(
            "if [ -z \"$APP_PID\" ] && [ -f {pid} ]; then\n  APP_PID=$(cat {pid})\nfi",
            pid = PID_FILE
        );
        let lines = [
            SHEBANG,
            BASE_DIR_DEFAULT,
            "APP_PID=\"$1\"",
            read_pid_file.as_str(),
            "if [ -z \"$APP_PID\" ] || ! kill -0 $APP_PID 2> /dev/null; then\n  exit 0\nfi",
            "CHILD_PIDS=$(ps -o pid= --ppid $APP_PID)",
            "kill -TERM $APP_PID",
            "if [ -n \"$CHILD_PIDS\" ]; then\n  kill -TERM $CHILD_PIDS 2> /dev/null\nfi",
            "exit 0",
        ];
        render(&lines)
    }
}

/// Joins blocks into script text, dropping blank lines
fn render<S: AsRef<str>>(blocks: &[S]) -> String {
    let mut script = String::new();
    for line in blocks
        .iter()
        .flat_map(|b| b.as_ref().lines())
        .filter(|l| !l.trim().is_empty())
    {
        let _ = writeln!(script, "{}", line);
    }
    script
}
