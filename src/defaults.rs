//! Default values for fixdoc configuration.
//!
//! This module provides centralized default values used by the configuration
//! schema and the CLI, ensuring consistency and avoiding duplication.

use std::path::{Path, PathBuf};

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "fixdoc.yaml";

pub const DOCS_ROOT: &str = "docs";
pub const BASE_BRANCH: &str = "main";
pub const BRANCH_PREFIX: &str = "fixdoc";
pub const FUZZY_THRESHOLD: f64 = 0.5;
pub const SECTION_DEPTH: u8 = 3;

pub const GENERATOR_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const GENERATOR_MODEL: &str = "gpt-4o-mini";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const GENERATOR_TIMEOUT_SECS: u64 = 60;

pub const BIND_ADDR: &str = "0.0.0.0:3000";
pub const ROUTE: &str = "/slack/fixdoc";
pub const WORKERS: usize = 4;
pub const CALLBACK_TIMEOUT_SECS: u64 = 10;

/// Returns the default configuration file path.
///
/// `fixdoc.yaml` in `cwd` when it exists, otherwise the platform config
/// directory:
/// - Linux: `~/.config/fixdoc/config.yaml`
/// - macOS: `~/Library/Application Support/fixdoc/config.yaml`
/// - Windows: `{FOLDERID_RoamingAppData}\fixdoc\config.yaml`
///
/// Falls back to `fixdoc.yaml` in `cwd` if the platform config directory
/// cannot be determined.
///
/// This can be overridden by the `--config` CLI flag or the `FIXDOC_CONFIG`
/// environment variable.
pub fn default_config_path(cwd: &Path) -> PathBuf {
    let local = cwd.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("fixdoc").join("config.yaml"))
        .unwrap_or(local)
}
