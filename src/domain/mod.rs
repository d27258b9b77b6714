//! Domain layer - pure business logic
//!
//! This module contains types with no external I/O (beyond a single
//! filesystem existence check when a source reference is resolved).
//! Types and functions here can be unit tested without mocking.

pub mod names;
pub mod registry;
pub mod request;
pub mod source;

// Re-export commonly used types
pub use registry::{AuthToken, RegistryInfo, RepositoryCatalog};
pub use request::{BuildRequest, PublishRequest};
pub use source::SourceRef;
