//! Centralized error types for sandbox
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for sandbox operations
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl SandboxError {
    /// Subject line shown above the detail body when a command aborts
    pub fn subject(&self) -> &'static str {
        match self {
            SandboxError::Config(ConfigError::SettingsMissing { .. }) => "Settings file missing!",
            SandboxError::Config(ConfigError::CacheDir { .. }) => "Non-writable cache dir",
            SandboxError::Config(_) => "Configuration Error",
            SandboxError::Build(_) => "Build failed",
            SandboxError::Publish(_) => "Publish failed",
        }
    }
}

/// Settings and cache directory errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "No settings file found at {}. Run the set-config sub-command first to establish your settings.",
        path.display()
    )]
    SettingsMissing { path: PathBuf },

    #[error("A configuration error was detected: {message}")]
    Invalid { message: String },

    #[error(
        "Cache directory {} doesn't exist, is not writable, or could not be created. Please check your home directory permissions and try again.",
        path.display()
    )]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine a cache directory. Set SANDBOX_CACHE_DIR")]
    NoCacheDir,

    #[error("Failed to access settings file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// External tool invocation errors
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Cannot run an empty command line")]
    EmptyCommand,

    #[error("Malformed command line `{command}`")]
    InvalidCommandLine {
        command: String,
        #[source]
        source: shell_words::ParseError,
    },

    #[error("Failed to start subprocess {program}. Is it installed?")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed while waiting on subprocess {program}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Subprocess {program} error: {last_line}")]
    Failed {
        program: String,
        exit_code: Option<i32>,
        last_line: String,
    },
}

impl ProcessError {
    /// Last stderr line captured before the subprocess failed, if it ran at all
    #[cfg(test)]
    pub fn last_line(&self) -> Option<&str> {
        match self {
            ProcessError::Failed { last_line, .. } => Some(last_line),
            _ => None,
        }
    }
}

/// Local image builder backend errors
#[derive(Error, Debug)]
pub enum ImageBuildError {
    #[error("Could not connect to the local Docker daemon")]
    Connection(#[source] bollard::errors::Error),

    #[error("Docker build of {tag} failed: {message}")]
    Failed { tag: String, message: String },

    #[error("Failed to package build context {}", path.display())]
    Context {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid .dockerignore pattern `{pattern}`")]
    IgnorePattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Registry control plane errors
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Repository {name} does not exist")]
    RepositoryNotFound { name: String },

    #[error("Registry returned a malformed authorization token: {message}")]
    MalformedToken { message: String },

    #[error("Registry API call {operation} failed: {message}")]
    Api { operation: &'static str, message: String },
}

/// Registry count invariant violated during discovery
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Did not find one and only one registry (found {count})")]
pub struct PreconditionError {
    pub count: usize,
}

/// Build pipeline errors, tagged with the stage that failed
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to build from file path {}", path.display())]
    LocalBuild {
        path: PathBuf,
        #[source]
        source: ImageBuildError,
    },

    #[error("Failed to build apptainer image from {source_ref}")]
    Convert {
        source_ref: String,
        #[source]
        source: ProcessError,
    },
}

impl BuildError {
    pub fn stage(&self) -> &'static str {
        match self {
            BuildError::LocalBuild { .. } => "local-build",
            BuildError::Convert { .. } => "convert",
        }
    }
}

/// Publish pipeline errors, tagged with the stage that failed
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Image not found at path: {}", path.display())]
    ArchiveNotFound { path: PathBuf },

    #[error("Cannot derive an image name from {}", path.display())]
    InvalidArchivePath { path: PathBuf },

    #[error("Failed to authenticate with the registry")]
    Auth(#[source] GatewayError),

    #[error("Failed to list registries")]
    Discovery(#[source] GatewayError),

    #[error(transparent)]
    RegistryCount(#[from] PreconditionError),

    #[error("Failed to resolve repository {name}")]
    Repository {
        name: String,
        #[source]
        source: GatewayError,
    },

    #[error("Failed to log into {domain}")]
    Login {
        domain: String,
        #[source]
        source: ProcessError,
    },

    #[error("Failed to push to {url}")]
    Push {
        url: String,
        #[source]
        source: ProcessError,
    },
}

impl PublishError {
    pub fn stage(&self) -> &'static str {
        match self {
            PublishError::ArchiveNotFound { .. } | PublishError::InvalidArchivePath { .. } => {
                "archive"
            }
            PublishError::Auth(_) => "auth",
            PublishError::Discovery(_) | PublishError::RegistryCount(_) => "registry-discovery",
            PublishError::Repository { .. } => "repository",
            PublishError::Login { .. } => "login",
            PublishError::Push { .. } => "push",
        }
    }
}
