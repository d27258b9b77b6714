//! # Sandbox Configuration
//!
//! Credentials are saved once with `set-config` and loaded at the start of
//! every `apptainer` command.
//!
//! ## Files
//!
//! - `<cache_dir>/sandbox.json` - saved [`Settings`]
//! - `<cache_dir>/info.txt` - marker explaining what the directory is for
//!
//! `<cache_dir>` is `$SANDBOX_CACHE_DIR` when set, otherwise
//! `~/.local/share/sandbox` (the platform's local data directory).
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let cache_dir = init_cache()?;
//! let settings = load_settings(&cache_dir)?;
//! println!("Registry: {}", settings.aws_ecr_public_registry);
//! ```

mod cache;
mod settings;

pub use cache::{cache_dir, init_cache};
pub use settings::{clear_settings, dump_settings, load_settings, settings_path, Settings};
