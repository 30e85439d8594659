use super::{Invocation, ProcessOutput, ProcessRunner};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Scripted process runner for unit tests.
///
/// Responses are keyed by program path; every invocation is recorded in order.
#[derive(Default)]
pub struct MockProcessRunner {
    responses: Mutex<HashMap<PathBuf, ProcessOutput>>,
    invocations: Mutex<Vec<Invocation>>,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the output returned whenever `program` is run
    pub fn respond(&self, program: impl AsRef<Path>, output: ProcessOutput) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(program.as_ref().to_path_buf(), output);
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Whether any recorded invocation launched `program`
    pub fn ran(&self, program: impl AsRef<Path>) -> bool {
        let program = program.as_ref();
        self.invocations().iter().any(|i| i.program == program)
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(invocation.clone());

        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&invocation.program)
            .cloned()
            .ok_or_else(|| anyhow!("No such program: {}", invocation.program.display()))
    }
}
