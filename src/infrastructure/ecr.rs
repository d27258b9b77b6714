//! ECR Public control plane
//!
//! Token exchange, registry discovery and repository lookup/creation.
//! ECR Public is only served from us-east-1, so the region is fixed.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ecrpublic::config::{Credentials, Region};
use aws_sdk_ecrpublic::error::DisplayErrorContext;
use aws_sdk_ecrpublic::Client;
use tracing::debug;

use crate::config::Settings;
use crate::domain::{RegistryInfo, RepositoryCatalog};
use crate::error::GatewayError;

/// The only region ECR Public supports
pub const ECR_PUBLIC_REGION: &str = "us-east-1";

const CREDENTIALS_PROVIDER: &str = "sandbox-settings";

/// Registry control plane operations used by publishing
#[async_trait]
pub trait RegistryGateway: Send + Sync {
    /// Base64 `username:password` blob for registry login
    async fn authorization_token(&self) -> Result<String, GatewayError>;

    async fn describe_registries(&self) -> Result<Vec<RegistryInfo>, GatewayError>;

    /// Fails with [`GatewayError::RepositoryNotFound`] only when the registry
    /// says the repository does not exist
    async fn repository_catalog_data(
        &self,
        registry_id: &str,
        repository_name: &str,
    ) -> Result<RepositoryCatalog, GatewayError>;

    async fn create_repository(&self, repository_name: &str) -> Result<(), GatewayError>;
}

#[async_trait]
impl<T: RegistryGateway + ?Sized> RegistryGateway for &T {
    async fn authorization_token(&self) -> Result<String, GatewayError> {
        (**self).authorization_token().await
    }

    async fn describe_registries(&self) -> Result<Vec<RegistryInfo>, GatewayError> {
        (**self).describe_registries().await
    }

    async fn repository_catalog_data(
        &self,
        registry_id: &str,
        repository_name: &str,
    ) -> Result<RepositoryCatalog, GatewayError> {
        (**self)
            .repository_catalog_data(registry_id, repository_name)
            .await
    }

    async fn create_repository(&self, repository_name: &str) -> Result<(), GatewayError> {
        (**self).create_repository(repository_name).await
    }
}

/// Gateway backed by the AWS SDK
pub struct EcrPublicGateway {
    client: Client,
}

impl EcrPublicGateway {
    /// Create a client from the saved static credentials
    pub async fn connect(settings: &Settings) -> Self {
        debug!("Getting ECR Public client for region={}", ECR_PUBLIC_REGION);

        let credentials = Credentials::new(
            &settings.aws_access_key_id,
            &settings.aws_secret_access_key,
            None,
            None,
            CREDENTIALS_PROVIDER,
        );
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(ECR_PUBLIC_REGION))
            .credentials_provider(credentials)
            .load()
            .await;

        Self {
            client: Client::new(&config),
        }
    }
}

fn api_error<E>(operation: &'static str, err: E) -> GatewayError
where
    E: std::error::Error,
{
    GatewayError::Api {
        operation,
        message: DisplayErrorContext(err).to_string(),
    }
}

#[async_trait]
impl RegistryGateway for EcrPublicGateway {
    async fn authorization_token(&self) -> Result<String, GatewayError> {
        debug!("Fetching authorization token");
        let output = self
            .client
            .get_authorization_token()
            .send()
            .await
            .map_err(|e| api_error("GetAuthorizationToken", e))?;

        output
            .authorization_data()
            .and_then(|data| data.authorization_token())
            .map(str::to_string)
            .ok_or_else(|| GatewayError::MalformedToken {
                message: "response carried no authorization token".to_string(),
            })
    }

    async fn describe_registries(&self) -> Result<Vec<RegistryInfo>, GatewayError> {
        debug!("Describing registries");
        let output = self
            .client
            .describe_registries()
            .send()
            .await
            .map_err(|e| api_error("DescribeRegistries", e))?;

        Ok(output
            .registries()
            .iter()
            .map(|registry| RegistryInfo::new(registry.registry_id(), registry.registry_uri()))
            .collect())
    }

    async fn repository_catalog_data(
        &self,
        registry_id: &str,
        repository_name: &str,
    ) -> Result<RepositoryCatalog, GatewayError> {
        debug!(
            "Fetching catalog data for {} in registry {}",
            repository_name, registry_id
        );
        let result = self
            .client
            .get_repository_catalog_data()
            .registry_id(registry_id)
            .repository_name(repository_name)
            .send()
            .await;

        match result {
            Ok(output) => {
                let catalog = output.catalog_data();
                Ok(RepositoryCatalog {
                    description: catalog
                        .and_then(|data| data.description())
                        .map(str::to_string),
                    architectures: catalog
                        .map(|data| data.architectures().to_vec())
                        .unwrap_or_default(),
                    operating_systems: catalog
                        .map(|data| data.operating_systems().to_vec())
                        .unwrap_or_default(),
                })
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_repository_not_found_exception()) =>
            {
                Err(GatewayError::RepositoryNotFound {
                    name: repository_name.to_string(),
                })
            }
            Err(err) => Err(api_error("GetRepositoryCatalogData", err)),
        }
    }

    async fn create_repository(&self, repository_name: &str) -> Result<(), GatewayError> {
        debug!("Creating repository {}", repository_name);
        // Architecture and OS catalog data are left unset.
        self.client
            .create_repository()
            .repository_name(repository_name)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| api_error("CreateRepository", e))
    }
}
