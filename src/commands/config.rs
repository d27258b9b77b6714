//! `set-config`, `show-config` and `clear-config`

use anyhow::Result;
use tracing::info;

use crate::config::{self, Settings};
use crate::error::SandboxError;
use crate::ui;

/// Validate and save credentials
pub fn set(
    aws_access_key_id: String,
    aws_secret_access_key: String,
    aws_ecr_public_registry: String,
) -> Result<()> {
    let cache_dir = config::init_cache().map_err(SandboxError::from)?;
    let settings = Settings::new(
        aws_access_key_id,
        aws_secret_access_key,
        aws_ecr_public_registry,
    )
    .map_err(SandboxError::from)?;

    let path = config::dump_settings(&cache_dir, &settings).map_err(SandboxError::from)?;
    info!("Saved settings to {}", path.display());
    ui::print_success(&format!("Settings saved to {}", path.display()));
    Ok(())
}

/// Print saved settings with the secret masked
pub fn show() -> Result<()> {
    let cache_dir = config::init_cache().map_err(SandboxError::from)?;
    let settings = config::load_settings(&cache_dir).map_err(SandboxError::from)?;
    println!(
        "{}",
        settings.to_masked_json().map_err(SandboxError::from)?
    );
    Ok(())
}

/// Remove saved settings
pub fn clear() -> Result<()> {
    let cache_dir = config::init_cache().map_err(SandboxError::from)?;
    config::clear_settings(&cache_dir).map_err(SandboxError::from)?;
    ui::print_info(&format!(
        "Removed saved settings at {}",
        config::settings_path(&cache_dir).display()
    ));
    Ok(())
}
