//! Local Docker image builds
//!
//! Builds an image from a descriptor on the local daemon so apptainer can
//! convert it through a `docker-daemon://` reference. The build context
//! honors `<context>/.dockerignore`.

use async_trait::async_trait;
use bollard::query_parameters::BuildImageOptionsBuilder;
use bollard::Docker;
use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use futures_util::stream::StreamExt;
use glob::{MatchOptions, Pattern};
use http_body_util::{Either, Full};
use std::io;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::ImageBuildError;

/// Backend able to build a tagged image from a context directory
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    async fn build_image(
        &self,
        tag: &str,
        context_dir: &Path,
        descriptor: &str,
    ) -> Result<(), ImageBuildError>;
}

#[async_trait]
impl<T: ImageBuilder + ?Sized> ImageBuilder for &T {
    async fn build_image(
        &self,
        tag: &str,
        context_dir: &Path,
        descriptor: &str,
    ) -> Result<(), ImageBuildError> {
        (**self).build_image(tag, context_dir, descriptor).await
    }
}

/// Builds images on the local Docker daemon
///
/// The daemon connection is only opened when a build is requested, so
/// converting an existing reference works without Docker installed.
#[derive(Debug, Default)]
pub struct DockerImageBuilder;

#[async_trait]
impl ImageBuilder for DockerImageBuilder {
    async fn build_image(
        &self,
        tag: &str,
        context_dir: &Path,
        descriptor: &str,
    ) -> Result<(), ImageBuildError> {
        info!("🐳 Building local docker image {}", tag);

        let docker = Docker::connect_with_local_defaults().map_err(ImageBuildError::Connection)?;
        let context = create_context(context_dir, descriptor)?;

        let options = BuildImageOptionsBuilder::default()
            .dockerfile(descriptor)
            .t(tag)
            .rm(true)
            .forcerm(true)
            .build();
        debug!("Build options: {:?}", options);

        let body = Full::new(Bytes::from(context));
        let mut stream = docker.build_image(options, None, Some(Either::Left(body)));

        while let Some(msg) = stream.next().await {
            let output = msg.map_err(|e| ImageBuildError::Failed {
                tag: tag.to_string(),
                message: e.to_string(),
            })?;

            if let Some(line) = output.stream.as_deref().map(str::trim_end) {
                if !line.is_empty() {
                    debug!("docker build => {}", line);
                }
            }

            if let Some(error) = output.error {
                return Err(ImageBuildError::Failed {
                    tag: tag.to_string(),
                    message: error,
                });
            }

            if let Some(detail) = output.error_detail {
                return Err(ImageBuildError::Failed {
                    tag: tag.to_string(),
                    message: detail
                        .message
                        .unwrap_or_else(|| "Unknown build error".to_string()),
                });
            }

            if let Some(status) = output.status {
                debug!("docker build => {}", status);
            }
        }

        debug!("Local docker image built as {}", tag);
        Ok(())
    }
}

const DOCKERIGNORE: &str = ".dockerignore";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Exclusion rules read from a `.dockerignore` file
///
/// Patterns are relative to the context root. A path is excluded when the
/// last rule matching it or one of its parent directories is not negated.
#[derive(Debug, Default)]
struct DockerIgnore {
    rules: Vec<(Pattern, bool)>,
}

impl DockerIgnore {
    /// Read `<context_dir>/.dockerignore`; a missing file excludes nothing
    fn load(context_dir: &Path) -> Result<Self, ImageBuildError> {
        let path = context_dir.join(DOCKERIGNORE);
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ImageBuildError::Context { path, source }),
        }
    }

    fn parse(content: &str) -> Result<Self, ImageBuildError> {
        let mut rules = Vec::new();
        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (negated, raw) = match line.strip_prefix('!') {
                Some(rest) => (true, rest.trim()),
                None => (false, line),
            };

            let mut cleaned = raw.trim_start_matches('/');
            while let Some(rest) = cleaned.strip_prefix("./") {
                cleaned = rest;
            }
            let cleaned = cleaned.trim_end_matches('/');
            if cleaned.is_empty() || cleaned == "." {
                continue;
            }

            let pattern =
                Pattern::new(cleaned).map_err(|source| ImageBuildError::IgnorePattern {
                    pattern: raw.to_string(),
                    source,
                })?;
            rules.push((pattern, negated));
        }

        Ok(Self { rules })
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        let mut excluded = false;
        for (pattern, negated) in &self.rules {
            let matched = relative
                .ancestors()
                .filter(|path| !path.as_os_str().is_empty())
                .any(|path| pattern.matches_path_with(path, MATCH_OPTIONS));
            if matched {
                excluded = !negated;
            }
        }
        excluded
    }

    /// Whole directories are skipped only when no rule can re-include a child
    fn prunes(&self, relative: &Path) -> bool {
        !self.rules.iter().any(|(_, negated)| *negated) && self.is_excluded(relative)
    }
}

/// Pack a context directory as a gzipped tarball, skipping ignored paths
///
/// The descriptor and `.dockerignore` are always sent, as the daemon needs them.
pub fn create_context(context_dir: &Path, descriptor: &str) -> Result<Vec<u8>, ImageBuildError> {
    debug!("Creating build context from: {}", context_dir.display());

    let context_err = |source| ImageBuildError::Context {
        path: context_dir.to_path_buf(),
        source,
    };

    let ignore = DockerIgnore::load(context_dir)?;
    let relative = |path: &Path| path.strip_prefix(context_dir).unwrap_or(path).to_path_buf();
    let always_sent =
        |path: &Path| path == Path::new(descriptor) || path == Path::new(DOCKERIGNORE);

    let mut archive_data = Vec::new();
    {
        let encoder = GzEncoder::new(&mut archive_data, Compression::default());
        let mut tar = tar::Builder::new(encoder);

        let walker = WalkDir::new(context_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir() && ignore.prunes(&relative(entry.path())))
            });

        for entry in walker {
            let entry = entry.map_err(|e| context_err(io::Error::from(e)))?;
            let name = relative(entry.path());
            if ignore.is_excluded(&name) && !always_sent(name.as_path()) {
                debug!("Excluded from build context: {}", name.display());
                continue;
            }

            if entry.file_type().is_dir() {
                tar.append_dir(&name, entry.path()).map_err(context_err)?;
            } else {
                tar.append_path_with_name(entry.path(), &name)
                    .map_err(context_err)?;
            }
        }

        tar.into_inner()
            .and_then(|encoder| encoder.finish())
            .map_err(context_err)?;
    }

    debug!("Build context created: {} bytes", archive_data.len());
    Ok(archive_data)
}
