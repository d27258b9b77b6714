//! Cache directory bootstrap

use std::path::PathBuf;
use tracing::debug;

use crate::error::ConfigError;

/// Environment variable overriding the cache directory
pub const CACHE_DIR_ENV: &str = "SANDBOX_CACHE_DIR";

const INFO_TEXT: &str = "This directory is used by Sandbox CLI for its cache.";

/// Locate the cache directory without touching the filesystem
pub fn cache_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os(CACHE_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    dirs::data_local_dir()
        .map(|dir| dir.join("sandbox"))
        .ok_or(ConfigError::NoCacheDir)
}

/// Create the cache directory (if needed) and write its marker file
pub fn init_cache() -> Result<PathBuf, ConfigError> {
    let dir = cache_dir()?;
    debug!("Initializing cache directory at {}", dir.display());

    let cache_err = |source| ConfigError::CacheDir {
        path: dir.clone(),
        source,
    };
    std::fs::create_dir_all(&dir).map_err(cache_err)?;
    std::fs::write(dir.join("info.txt"), INFO_TEXT).map_err(cache_err)?;

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cache_dir_from_env() {
        temp_env::with_var(CACHE_DIR_ENV, Some("/tmp/sandbox-cache"), || {
            assert_eq!(cache_dir().unwrap(), PathBuf::from("/tmp/sandbox-cache"));
        });
    }

    #[test]
    fn test_init_cache_creates_nested_dir() {
        let root = tempdir().unwrap();
        let nested = root.path().join("a/b/sandbox");

        temp_env::with_var(CACHE_DIR_ENV, Some(&nested), || {
            let dir = init_cache().unwrap();
            assert_eq!(dir, nested);
            let info = std::fs::read_to_string(dir.join("info.txt")).unwrap();
            assert!(info.contains("Sandbox CLI"));
        });
    }

    #[test]
    fn test_init_cache_unwritable() {
        let root = tempdir().unwrap();
        let blocker = root.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();

        temp_env::with_var(CACHE_DIR_ENV, Some(blocker.join("sandbox")), || {
            assert!(matches!(init_cache(), Err(ConfigError::CacheDir { .. })));
        });
    }
}
