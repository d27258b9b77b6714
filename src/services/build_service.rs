//! Build service - turns a Dockerfile or image reference into a `.sif` archive
//!
//! Local descriptors are built on the Docker daemon first and then converted
//! through a `docker-daemon://` reference. Anything else is handed to
//! apptainer as-is. Intermediate local images are not cleaned up.

use std::path::PathBuf;
use tracing::{debug, info};

use crate::domain::request::archive_path;
use crate::domain::source::{daemon_reference, local_tag, split_descriptor};
use crate::domain::{names, BuildRequest, SourceRef};
use crate::error::BuildError;
use crate::infrastructure::{Apptainer, CommandRunner, ImageBuilder};

/// Service for building apptainer archives
pub struct BuildService<B, R> {
    builder: B,
    apptainer: Apptainer<R>,
}

impl<B: ImageBuilder, R: CommandRunner> BuildService<B, R> {
    pub fn new(builder: B, apptainer: Apptainer<R>) -> Self {
        Self { builder, apptainer }
    }

    /// Run the build pipeline, returning the archive path
    pub async fn execute(&self, request: BuildRequest) -> Result<PathBuf, BuildError> {
        let image_name = match request.image_name {
            Some(name) => name,
            None => {
                let name = names::generate();
                debug!("Image name was not supplied, using {}", name);
                name
            }
        };

        let output_dir = match request.output_dir {
            Some(dir) => dir,
            None => {
                debug!("No output directory given, using the current directory");
                PathBuf::from(".")
            }
        };

        let source = SourceRef::resolve(&request.image_source);
        let source_ref = self.resolve_source(source, &image_name).await?;

        let target = archive_path(&output_dir, &image_name);
        info!("📦 Building apptainer image from {}", source_ref);

        let result = self
            .apptainer
            .build(&source_ref, &target)
            .await
            .map_err(|source| BuildError::Convert {
                source_ref: source_ref.clone(),
                source,
            })?;
        debug!(
            "apptainer build exited with {}: {}",
            result.exit_code, result.last_line
        );

        info!("   ✅ Built: {}", target.display());
        Ok(target)
    }

    /// Build local descriptors on the daemon; pass references through
    async fn resolve_source(
        &self,
        source: SourceRef,
        image_name: &str,
    ) -> Result<String, BuildError> {
        match source {
            SourceRef::Reference(reference) => {
                debug!("Using {} as the image source", reference);
                Ok(reference)
            }
            SourceRef::LocalPath(path) => {
                debug!("Building local docker image from {}", path.display());
                let (context_dir, descriptor) = split_descriptor(&path);
                let tag = local_tag(image_name);

                self.builder
                    .build_image(&tag, &context_dir, &descriptor)
                    .await
                    .map_err(|source| BuildError::LocalBuild {
                        path: path.clone(),
                        source,
                    })?;

                let reference = daemon_reference(&tag);
                debug!("Set image source to {}", reference);
                Ok(reference)
            }
        }
    }
}
