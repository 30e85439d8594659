//! Node.js staging plugin for apps without a buildpack

use super::entry_point::EntryPattern;
use super::framework::{AppContext, FrameworkPlugin, LegacyFramework};
use crate::staging::EnvironmentVars;

pub type NodePlugin = FrameworkPlugin<Node>;

const DEFAULT_NODE: &str = "node";
const ENTRY_FILES: [&str; 4] = ["server.js", "app.js", "index.js", "main.js"];

pub struct Node;

impl LegacyFramework for Node {
    fn name(&self) -> &'static str {
        "Node.js"
    }

    fn entry_patterns(&self) -> Vec<EntryPattern> {
        ENTRY_FILES.iter().map(|f| EntryPattern::new(*f)).collect()
    }

    fn start_command(&self, app: &AppContext<'_>, entry_point: &str) -> String {
        format!(
            "{} {} $@",
            app.request.runtime.executable_or(DEFAULT_NODE),
            entry_point
        )
    }

    fn environment(&self, app: &AppContext<'_>) -> EnvironmentVars {
        let mut vars = EnvironmentVars::new();
        if app.has_file("package.json") {
            vars.set("NODE_PATH", "$PWD/app/node_modules");
        }
        vars.set("NODE_ENV", "${NODE_ENV:-production}");
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::plugins::StagingPlugin;
    use crate::staging::{Droplet, StagingError, StagingRequest};
    use std::path::PathBuf;
    use std::sync::Arc;

    async fn stage_files(files: &[&str]) -> Result<crate::plugins::LaunchPlan, StagingError> {
        let fs = MockFileSystem::with_root(PathBuf::from("/droplet/app"));
        for name in files {
            fs.add_file(name, "");
        }
        let mut request = StagingRequest::new("/src", "/droplet");
        request.framework.name = "node".to_string();

        NodePlugin::new(Node, Arc::new(fs))
            .stage(&request, &Droplet::new("/droplet"))
            .await
    }

    #[tokio::test]
    async fn test_prefers_server_js() {
        let plan = stage_files(&["app.js", "server.js", "package.json"]).await.unwrap();
        assert_eq!(plan.start_command.command, "node server.js $@");
        assert_eq!(
            plan.scripts.environment().get("NODE_PATH"),
            Some("$PWD/app/node_modules")
        );
    }

    #[tokio::test]
    async fn test_without_package_json() {
        let plan = stage_files(&["index.js"]).await.unwrap();
        assert_eq!(plan.start_command.command, "node index.js $@");
        assert_eq!(plan.scripts.environment().get("NODE_PATH"), None);
        assert_eq!(
            plan.scripts.environment().get("NODE_ENV"),
            Some("${NODE_ENV:-production}")
        );
    }

    #[tokio::test]
    async fn test_no_entry_file() {
        let result = stage_files(&["lib.js", "package.json"]).await;
        assert!(matches!(
            result,
            Err(StagingError::NoEntryPointDetected { framework }) if framework == "Node.js"
        ));
    }
}
