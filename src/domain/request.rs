//! Pipeline requests
//!
//! Requests are built once per invocation from CLI arguments and consumed by
//! the corresponding pipeline.

use std::path::{Path, PathBuf};

use crate::error::PublishError;

/// Tag used when a publish does not name one
pub const DEFAULT_TAG: &str = "latest";

/// Archive file extension produced by builds
pub const ARCHIVE_EXTENSION: &str = "sif";

/// Input to the build pipeline
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// Image name; a friendly name is generated when absent
    pub image_name: Option<String>,
    /// Local descriptor path or converter reference
    pub image_source: String,
    /// Directory the archive is written to; current directory when absent
    pub output_dir: Option<PathBuf>,
}

impl BuildRequest {
    pub fn new(image_source: impl Into<String>) -> Self {
        Self {
            image_source: image_source.into(),
            ..Default::default()
        }
    }

    pub fn with_image_name(mut self, image_name: impl Into<String>) -> Self {
        self.image_name = Some(image_name.into());
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }
}

/// `<output_dir>/<image_name>.sif`
pub fn archive_path(output_dir: &Path, image_name: &str) -> PathBuf {
    output_dir.join(format!("{}.{}", image_name, ARCHIVE_EXTENSION))
}

/// Input to the publish pipeline
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub archive_path: PathBuf,
    pub tag: String,
}

impl PublishRequest {
    pub fn new(archive_path: impl Into<PathBuf>) -> Self {
        Self {
            archive_path: archive_path.into(),
            tag: DEFAULT_TAG.to_string(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Image name taken from the archive's filename stem
    pub fn image_name(&self) -> Result<String, PublishError> {
        self.archive_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| PublishError::InvalidArchivePath {
                path: self.archive_path.clone(),
            })
    }

    /// `<image_name>:<tag>`
    pub fn target(&self) -> Result<String, PublishError> {
        Ok(format!("{}:{}", self.image_name()?, self.tag))
    }
}
