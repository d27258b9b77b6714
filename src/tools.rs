//! Runtime tool path resolution
//!
//! For each external tool (e.g., `apptainer`) we check for an environment
//! variable `{TOOL}_BIN` (e.g., `APPTAINER_BIN`) and fall back to PATH-based
//! invocation when it is not set.
//!
//! ```rust,ignore
//! // With APPTAINER_BIN="/opt/apptainer/bin/apptainer"
//! let apptainer = get_tool_path(tools::APPTAINER);
//! ```

use std::env;

/// Get the path to an external tool
///
/// Checks for an environment variable `{TOOL}_BIN` (uppercase tool name + "_BIN").
/// Falls back to the tool name itself if the envvar is not set, which relies on PATH.
pub fn get_tool_path(tool: &str) -> String {
    let env_var = format!("{}_BIN", tool.to_uppercase().replace('-', "_"));
    env::var(&env_var)
        .ok()
        .filter(|path| !path.is_empty())
        .unwrap_or_else(|| tool.to_string())
}

/// Common tool names
pub mod tools {
    pub const APPTAINER: &str = "apptainer";
}
