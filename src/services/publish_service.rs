//! Publish service - pushes a `.sif` archive to ECR Public
//!
//! Steps, in order, each stopping the pipeline on failure:
//! authenticate, discover the registry, resolve (or create) the repository,
//! log in with apptainer, push. A repository created here is not removed if
//! login or push fails afterwards.

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::domain::{AuthToken, PublishRequest, RegistryInfo};
use crate::error::{GatewayError, PreconditionError, PublishError};
use crate::infrastructure::{Apptainer, CommandRunner, RegistryGateway};

/// Service for publishing apptainer archives
pub struct PublishService<G, R> {
    gateway: G,
    apptainer: Apptainer<R>,
}

impl<G: RegistryGateway, R: CommandRunner> PublishService<G, R> {
    pub fn new(gateway: G, apptainer: Apptainer<R>) -> Self {
        Self { gateway, apptainer }
    }

    /// Run the publish pipeline, returning the published URL
    pub async fn execute(
        &self,
        request: &PublishRequest,
        settings: &Settings,
    ) -> Result<String, PublishError> {
        debug!(
            "Attempting to publish {} to ECR",
            request.archive_path.display()
        );

        let image_name = request.image_name()?;
        if !tokio::fs::try_exists(&request.archive_path)
            .await
            .unwrap_or(false)
        {
            return Err(PublishError::ArchiveNotFound {
                path: request.archive_path.clone(),
            });
        }
        debug!("Using target {}", request.target()?);

        let token = self.authenticate().await?;
        let registry = self.resolve_registry(settings).await?;
        self.resolve_repository(&registry, &image_name).await?;

        let login_url = registry.login_url();
        info!("🔐 Logging into {} via apptainer", registry.domain);
        self.apptainer
            .registry_login(&token, &login_url)
            .await
            .map_err(|source| PublishError::Login {
                domain: registry.domain.clone(),
                source,
            })?;

        let publish_url = registry.image_url(&image_name, &request.tag);
        info!("📤 Pushing image to {}", publish_url);
        let result = self
            .apptainer
            .push(&request.archive_path, &publish_url)
            .await
            .map_err(|source| PublishError::Push {
                url: publish_url.clone(),
                source,
            })?;
        debug!(
            "apptainer push exited with {}: {}",
            result.exit_code, result.last_line
        );

        info!("   ✅ Published: {}", publish_url);
        Ok(publish_url)
    }

    async fn authenticate(&self) -> Result<AuthToken, PublishError> {
        debug!("Fetching authorization token and extracting username and password");
        let encoded = self
            .gateway
            .authorization_token()
            .await
            .map_err(PublishError::Auth)?;
        let token = AuthToken::decode(&encoded).map_err(PublishError::Auth)?;
        debug!("Unpacked username={}", token.username);
        Ok(token)
    }

    /// Exactly one registry must exist; never pick among several
    async fn resolve_registry(&self, settings: &Settings) -> Result<RegistryInfo, PublishError> {
        let mut registries = self
            .gateway
            .describe_registries()
            .await
            .map_err(PublishError::Discovery)?;

        if registries.len() != 1 {
            debug!("Found {} registries instead of one", registries.len());
            return Err(PreconditionError {
                count: registries.len(),
            }
            .into());
        }

        let registry = registries.remove(0);
        debug!(
            "Using registry {} at {}",
            registry.registry_id, registry.registry_uri
        );
        if !registry.matches(&settings.aws_ecr_public_registry) {
            warn!(
                "Configured registry {} does not match discovered registry {}",
                settings.aws_ecr_public_registry, registry.registry_uri
            );
        }

        Ok(registry)
    }

    /// Create the repository only on a definite not-found answer
    async fn resolve_repository(
        &self,
        registry: &RegistryInfo,
        image_name: &str,
    ) -> Result<(), PublishError> {
        let repository_err = |source| PublishError::Repository {
            name: image_name.to_string(),
            source,
        };

        match self
            .gateway
            .repository_catalog_data(&registry.registry_id, image_name)
            .await
        {
            Ok(catalog) => {
                debug!("Found repository {}: {:?}", image_name, catalog);
                Ok(())
            }
            Err(GatewayError::RepositoryNotFound { .. }) => {
                info!("📁 There is no repository for {}. Creating one...", image_name);
                self.gateway
                    .create_repository(image_name)
                    .await
                    .map_err(repository_err)
            }
            Err(source) => Err(repository_err(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fakes::{
        sample_registry, CatalogAnswer, FakeGateway, RecordingRunner,
    };
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn settings() -> Settings {
        Settings::new("AKIAEXAMPLE", "secret", "a1b2c3d4").unwrap()
    }

    fn archive(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"SIF").unwrap();
        path
    }

    fn service<'a>(
        gateway: &'a FakeGateway,
        runner: &'a RecordingRunner,
    ) -> PublishService<&'a FakeGateway, &'a RecordingRunner> {
        PublishService::new(gateway, Apptainer::with_binary(runner, "apptainer"))
    }

    #[tokio::test]
    async fn test_publish_creates_missing_repository() {
        let dir = tempfile::tempdir().unwrap();
        let path = archive(&dir, "demo.sif");
        let gateway = FakeGateway::single(CatalogAnswer::NotFound);
        let runner = RecordingRunner::default();
        let request = PublishRequest::new(&path).with_tag("v1");

        let url = service(&gateway, &runner)
            .execute(&request, &settings())
            .await
            .unwrap();

        assert_eq!(url, "oras://public.ecr.aws/a1b2c3d4/demo:v1");
        assert_eq!(gateway.created(), vec!["demo"]);
        assert_eq!(
            gateway.calls(),
            vec![
                "authorization_token",
                "describe_registries",
                "repository_catalog_data",
                "create_repository"
            ]
        );
        assert_eq!(
            runner.argv(0),
            vec![
                "apptainer",
                "registry",
                "login",
                "--username=AWS",
                "--password=registry-password",
                "oras://public.ecr.aws"
            ]
        );
        assert_eq!(
            runner.argv(1),
            vec![
                "apptainer".to_string(),
                "push".to_string(),
                path.display().to_string(),
                "oras://public.ecr.aws/a1b2c3d4/demo:v1".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_existing_repository_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FakeGateway::single(CatalogAnswer::Found);
        let runner = RecordingRunner::default();
        let request = PublishRequest::new(archive(&dir, "demo.sif"));

        let url = service(&gateway, &runner)
            .execute(&request, &settings())
            .await
            .unwrap();

        assert_eq!(url, "oras://public.ecr.aws/a1b2c3d4/demo:latest");
        assert!(gateway.created().is_empty());
        assert_eq!(runner.subcommands(), vec!["registry", "push"]);
    }

    #[tokio::test]
    async fn test_ambiguous_lookup_error_is_not_a_create_signal() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FakeGateway::single(CatalogAnswer::AccessDenied);
        let runner = RecordingRunner::default();
        let request = PublishRequest::new(archive(&dir, "demo.sif"));

        let err = service(&gateway, &runner)
            .execute(&request, &settings())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "repository");
        assert!(gateway.created().is_empty());
        assert!(runner.commands().is_empty());
    }

    #[tokio::test]
    async fn test_two_registries_fail_before_login() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FakeGateway::new(
            vec![
                sample_registry(),
                RegistryInfo::new("210987654321", "public.ecr.aws/z9y8x7w6"),
            ],
            CatalogAnswer::NotFound,
        );
        let runner = RecordingRunner::default();
        let request = PublishRequest::new(archive(&dir, "demo.sif"));

        let err = service(&gateway, &runner)
            .execute(&request, &settings())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PublishError::RegistryCount(PreconditionError { count: 2 })
        ));
        assert_eq!(err.stage(), "registry-discovery");
        assert!(!gateway.calls().contains(&"repository_catalog_data"));
        assert!(gateway.created().is_empty());
        assert!(runner.commands().is_empty());
    }

    #[tokio::test]
    async fn test_zero_registries_fail() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FakeGateway::new(Vec::new(), CatalogAnswer::Found);
        let runner = RecordingRunner::default();
        let request = PublishRequest::new(archive(&dir, "demo.sif"));

        let err = service(&gateway, &runner)
            .execute(&request, &settings())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PublishError::RegistryCount(PreconditionError { count: 0 })
        ));
        assert!(runner.commands().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_token_is_auth_failure() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FakeGateway::single(CatalogAnswer::Found).with_token("%%%");
        let runner = RecordingRunner::default();
        let request = PublishRequest::new(archive(&dir, "demo.sif"));

        let err = service(&gateway, &runner)
            .execute(&request, &settings())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "auth");
        assert_eq!(gateway.calls(), vec!["authorization_token"]);
    }

    #[tokio::test]
    async fn test_push_failure_keeps_created_repository() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FakeGateway::single(CatalogAnswer::NotFound);
        let runner = RecordingRunner::failing_on("push", "FATAL: denied");
        let request = PublishRequest::new(archive(&dir, "demo.sif"));

        let err = service(&gateway, &runner)
            .execute(&request, &settings())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "push");
        assert_eq!(gateway.created(), vec!["demo"]);
        assert_eq!(runner.subcommands(), vec!["registry", "push"]);
    }

    #[tokio::test]
    async fn test_login_failure_stops_before_push() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FakeGateway::single(CatalogAnswer::Found);
        let runner = RecordingRunner::failing_on("registry", "FATAL: bad credentials");
        let request = PublishRequest::new(archive(&dir, "demo.sif"));

        let err = service(&gateway, &runner)
            .execute(&request, &settings())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "login");
        assert_eq!(runner.subcommands(), vec!["registry"]);
    }

    #[tokio::test]
    async fn test_missing_archive_fails_before_auth() {
        let gateway = FakeGateway::single(CatalogAnswer::Found);
        let runner = RecordingRunner::default();
        let request = PublishRequest::new(Path::new("/nonexistent/demo.sif"));

        let err = service(&gateway, &runner)
            .execute(&request, &settings())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "archive");
        assert!(gateway.calls().is_empty());
    }
}
