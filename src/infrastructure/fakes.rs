//! In-memory stand-ins for the infrastructure seams, used by unit tests

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domain::{RegistryInfo, RepositoryCatalog};
use crate::error::{GatewayError, ImageBuildError, ProcessError};
use crate::infrastructure::docker::ImageBuilder;
use crate::infrastructure::ecr::RegistryGateway;
use crate::infrastructure::process::{CommandRunner, ProcessResult};

/// Records command lines; fails any whose subcommand matches `fail_on`
#[derive(Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<String>>,
    fail_on: Option<(String, String)>,
}

impl RecordingRunner {
    pub fn failing_on(subcommand: &str, last_line: &str) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            fail_on: Some((subcommand.to_string(), last_line.to_string())),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Tokenized form of the `index`th command
    pub fn argv(&self, index: usize) -> Vec<String> {
        shell_words::split(&self.commands()[index]).unwrap()
    }

    /// Tokenized commands, program path stripped
    pub fn subcommands(&self) -> Vec<String> {
        (0..self.commands().len())
            .map(|i| self.argv(i)[1].clone())
            .collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn execute(&self, command_line: &str) -> Result<ProcessResult, ProcessError> {
        self.commands.lock().unwrap().push(command_line.to_string());

        let argv = shell_words::split(command_line).unwrap();
        if let Some((subcommand, last_line)) = &self.fail_on {
            if argv.get(1) == Some(subcommand) {
                return Err(ProcessError::Failed {
                    program: argv[0].clone(),
                    exit_code: Some(255),
                    last_line: last_line.clone(),
                });
            }
        }

        Ok(ProcessResult {
            exit_code: 0,
            last_line: String::new(),
        })
    }
}

/// Records (tag, context, descriptor) for every build
#[derive(Default)]
pub struct FakeImageBuilder {
    builds: Mutex<Vec<(String, PathBuf, String)>>,
    failure: Option<String>,
}

impl FakeImageBuilder {
    pub fn failing(message: &str) -> Self {
        Self {
            builds: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }

    pub fn builds(&self) -> Vec<(String, PathBuf, String)> {
        self.builds.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageBuilder for FakeImageBuilder {
    async fn build_image(
        &self,
        tag: &str,
        context_dir: &Path,
        descriptor: &str,
    ) -> Result<(), ImageBuildError> {
        self.builds.lock().unwrap().push((
            tag.to_string(),
            context_dir.to_path_buf(),
            descriptor.to_string(),
        ));

        match &self.failure {
            Some(message) => Err(ImageBuildError::Failed {
                tag: tag.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// How the fake answers a catalog lookup
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum CatalogAnswer {
    Found,
    NotFound,
    AccessDenied,
}

/// Scripted registry control plane that records every call by name
pub struct FakeGateway {
    registries: Vec<RegistryInfo>,
    catalog: CatalogAnswer,
    token: String,
    calls: Mutex<Vec<&'static str>>,
    created: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn new(registries: Vec<RegistryInfo>, catalog: CatalogAnswer) -> Self {
        Self {
            registries,
            catalog,
            token: STANDARD.encode("AWS:registry-password"),
            calls: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
        }
    }

    /// One registry at `public.ecr.aws/a1b2c3d4`
    pub fn single(catalog: CatalogAnswer) -> Self {
        Self::new(vec![sample_registry()], catalog)
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = token.to_string();
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn sample_registry() -> RegistryInfo {
    RegistryInfo::new("123456789012", "public.ecr.aws/a1b2c3d4")
}

#[async_trait]
impl RegistryGateway for FakeGateway {
    async fn authorization_token(&self) -> Result<String, GatewayError> {
        self.record("authorization_token");
        Ok(self.token.clone())
    }

    async fn describe_registries(&self) -> Result<Vec<RegistryInfo>, GatewayError> {
        self.record("describe_registries");
        Ok(self.registries.clone())
    }

    async fn repository_catalog_data(
        &self,
        _registry_id: &str,
        repository_name: &str,
    ) -> Result<RepositoryCatalog, GatewayError> {
        self.record("repository_catalog_data");
        match self.catalog {
            CatalogAnswer::Found => Ok(RepositoryCatalog::default()),
            CatalogAnswer::NotFound => Err(GatewayError::RepositoryNotFound {
                name: repository_name.to_string(),
            }),
            CatalogAnswer::AccessDenied => Err(GatewayError::Api {
                operation: "GetRepositoryCatalogData",
                message: "AccessDeniedException".to_string(),
            }),
        }
    }

    async fn create_repository(&self, repository_name: &str) -> Result<(), GatewayError> {
        self.record("create_repository");
        self.created
            .lock()
            .unwrap()
            .push(repository_name.to_string());
        Ok(())
    }
}
