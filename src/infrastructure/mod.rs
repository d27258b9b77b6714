//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that interacts with external systems:
//! - Subprocesses (any command line, stderr streamed to the log)
//! - Apptainer CLI (build, registry login, push)
//! - Local Docker daemon (image builds)
//! - ECR Public control plane (tokens, registries, repositories)

pub mod apptainer;
pub mod docker;
pub mod ecr;
pub mod process;

#[cfg(test)]
pub mod fakes;

// Re-export commonly used types
pub use apptainer::Apptainer;
pub use docker::{DockerImageBuilder, ImageBuilder};
pub use ecr::{EcrPublicGateway, RegistryGateway};
pub use process::{CommandRunner, ProcessExecutor};
