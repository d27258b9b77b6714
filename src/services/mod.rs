//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and infrastructure.
//! Services use infrastructure adapters to perform I/O operations.

pub mod build_service;
pub mod publish_service;

// Re-export commonly used types
pub use build_service::BuildService;
pub use publish_service::PublishService;
