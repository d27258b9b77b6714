//! Registry domain types
//!
//! Credentials handed out by the registry control plane, the single registry
//! an account publishes to, and repository catalog metadata.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;

use crate::error::GatewayError;

/// Scheme apptainer uses to talk to OCI registries
pub const ORAS_SCHEME: &str = "oras";

/// Single-use registry login, decoded from the control plane's token
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub username: String,
    pub password: String,
}

impl AuthToken {
    /// Decode a base64 `username:password` blob
    ///
    /// Only the first `:` separates the two halves, so passwords may contain colons.
    pub fn decode(encoded: &str) -> Result<Self, GatewayError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| GatewayError::MalformedToken {
                message: format!("not valid base64: {}", e),
            })?;
        let decoded = String::from_utf8(bytes).map_err(|_| GatewayError::MalformedToken {
            message: "not valid UTF-8".to_string(),
        })?;
        let (username, password) =
            decoded
                .split_once(':')
                .ok_or_else(|| GatewayError::MalformedToken {
                    message: "expected username:password".to_string(),
                })?;

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The account's registry as reported by discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryInfo {
    pub registry_id: String,
    pub registry_uri: String,
    /// Host portion of the URI, used for login
    pub domain: String,
}

impl RegistryInfo {
    pub fn new(registry_id: impl Into<String>, registry_uri: impl Into<String>) -> Self {
        let registry_uri = registry_uri.into();
        let domain = registry_uri
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            registry_id: registry_id.into(),
            registry_uri,
            domain,
        }
    }

    /// `oras://<domain>`, the login target
    pub fn login_url(&self) -> String {
        format!("{}://{}", ORAS_SCHEME, self.domain)
    }

    /// `oras://<uri>/<image>:<tag>`, the push target
    pub fn image_url(&self, image_name: &str, tag: &str) -> String {
        format!("{}://{}/{}:{}", ORAS_SCHEME, self.registry_uri, image_name, tag)
    }

    /// Whether the configured registry identifier refers to this registry
    pub fn matches(&self, configured: &str) -> bool {
        let configured = configured.trim().trim_end_matches('/');
        configured == self.registry_id
            || configured == self.registry_uri
            || self.registry_uri.ends_with(&format!("/{}", configured))
    }
}

/// Catalog metadata of an existing repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryCatalog {
    pub description: Option<String>,
    pub architectures: Vec<String>,
    pub operating_systems: Vec<String>,
}
