//! `apptainer build` and `apptainer publish`

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::config::{self, Settings};
use crate::domain::{BuildRequest, PublishRequest};
use crate::error::SandboxError;
use crate::infrastructure::{Apptainer, DockerImageBuilder, EcrPublicGateway, ProcessExecutor};
use crate::services::{BuildService, PublishService};
use crate::ui;

/// Settings are loaded once per invocation and only read afterwards
fn load_settings() -> Result<Settings, SandboxError> {
    let cache_dir = config::cache_dir()?;
    Ok(config::load_settings(&cache_dir)?)
}

/// Build an apptainer `.sif` file from a Dockerfile or image reference
pub async fn build(
    image_name: Option<String>,
    image_source: String,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    // Every apptainer command requires saved settings
    load_settings()?;

    let mut request = BuildRequest::new(image_source);
    if let Some(name) = image_name {
        request = request.with_image_name(name);
    }
    if let Some(dir) = output_dir {
        request = request.with_output_dir(dir);
    }

    ui::print_header("Apptainer Build");

    let service = BuildService::new(DockerImageBuilder, Apptainer::new(ProcessExecutor));
    let spinner = ui::spinner("Building image...")?;
    let result = service.execute(request).await;
    spinner.finish_and_clear();

    let archive = result.map_err(SandboxError::from)?;

    let message = format!("Successfully built Apptainer image {}", archive.display());
    debug!("{}", message);
    ui::print_success(&message);
    Ok(())
}

/// Publish an apptainer `.sif` file to ECR Public
pub async fn publish(image_path: PathBuf, image_tag: String) -> Result<()> {
    let settings = load_settings()?;
    let request = PublishRequest::new(image_path).with_tag(image_tag);

    ui::print_header("Apptainer Publish");

    let gateway = EcrPublicGateway::connect(&settings).await;
    let service = PublishService::new(gateway, Apptainer::new(ProcessExecutor));
    let spinner = ui::spinner("Publishing image...")?;
    let result = service.execute(&request, &settings).await;
    spinner.finish_and_clear();

    let url = result.map_err(SandboxError::from)?;

    let message = format!(
        "Successfully published Apptainer image {} to {}",
        request.archive_path.display(),
        url
    );
    debug!("{}", message);
    ui::print_success(&message);
    Ok(())
}
