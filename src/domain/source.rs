//! Build source references
//!
//! A build source is either a path to a local build descriptor (a Dockerfile,
//! or a directory containing one) or an opaque reference the archive converter
//! understands on its own (`docker://alpine:3.20`, `docker-daemon://app:dev`, ...).
//! The distinction is made once, when the request enters the pipeline.

use std::path::{Path, PathBuf};

/// Scheme used to point the converter at an image held by the local Docker daemon
pub const DAEMON_SCHEME: &str = "docker-daemon";

/// Descriptor filename used when a directory is given as the source
pub const DEFAULT_DESCRIPTOR: &str = "Dockerfile";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// Existing local path to a build descriptor
    LocalPath(PathBuf),
    /// Anything else, passed through to the converter unchanged
    Reference(String),
}

impl SourceRef {
    /// Classify a raw source string by checking whether it exists locally
    pub fn resolve(raw: &str) -> Self {
        let path = Path::new(raw);
        if !raw.is_empty() && path.exists() {
            SourceRef::LocalPath(path.to_path_buf())
        } else {
            SourceRef::Reference(raw.to_string())
        }
    }
}

/// Split a local descriptor path into (context directory, descriptor filename)
///
/// A directory is its own context with the default descriptor name.
pub fn split_descriptor(path: &Path) -> (PathBuf, String) {
    if path.is_dir() {
        return (path.to_path_buf(), DEFAULT_DESCRIPTOR.to_string());
    }

    let context = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let descriptor = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_DESCRIPTOR.to_string());

    (context, descriptor)
}

/// Tag given to images built from a local descriptor
pub fn local_tag(image_name: &str) -> String {
    format!("local/{}:latest", image_name)
}

/// Converter reference for an image held by the local daemon
pub fn daemon_reference(tag: &str) -> String {
    format!("{}://{}", DAEMON_SCHEME, tag)
}
