//! Apptainer operations
//!
//! Builds `.sif` archives, logs into OCI registries and pushes archives.
//! Apptainer is never linked; every operation is a command line handed to a
//! [`CommandRunner`].

use std::path::Path;
use tracing::debug;

use crate::domain::AuthToken;
use crate::error::ProcessError;
use crate::infrastructure::process::{CommandRunner, ProcessResult};
use crate::tools::{get_tool_path, tools};

/// Client for the apptainer CLI
pub struct Apptainer<R> {
    runner: R,
    binary: String,
}

impl<R: CommandRunner> Apptainer<R> {
    /// Create a client using `APPTAINER_BIN` or `apptainer` from PATH
    pub fn new(runner: R) -> Self {
        Self::with_binary(runner, get_tool_path(tools::APPTAINER))
    }

    pub fn with_binary(runner: R, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    /// Convert `source` into an archive at `target`
    pub async fn build(&self, source: &str, target: &Path) -> Result<ProcessResult, ProcessError> {
        debug!("Building apptainer image from {}", source);
        let target = target.to_string_lossy();
        self.run(&["build", &*target, source]).await
    }

    /// Log into the registry at `url` (e.g. `oras://public.ecr.aws`)
    pub async fn registry_login(
        &self,
        token: &AuthToken,
        url: &str,
    ) -> Result<ProcessResult, ProcessError> {
        debug!("Logging into {} as {}", url, token.username);
        let username = format!("--username={}", token.username);
        let password = format!("--password={}", token.password);
        self.run(&["registry", "login", username.as_str(), password.as_str(), url])
            .await
    }

    /// Push an archive to `url` (e.g. `oras://public.ecr.aws/alias/demo:v1`)
    pub async fn push(&self, archive: &Path, url: &str) -> Result<ProcessResult, ProcessError> {
        debug!("Pushing {} to {}", archive.display(), url);
        let archive = archive.to_string_lossy();
        self.run(&["push", &*archive, url]).await
    }

    async fn run(&self, args: &[&str]) -> Result<ProcessResult, ProcessError> {
        let command_line =
            shell_words::join(std::iter::once(self.binary.as_str()).chain(args.iter().copied()));
        self.runner.execute(&command_line).await
    }
}
