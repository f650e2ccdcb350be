//! # Error Suggestions
//!
//! Helper functions for CLI error messages with hints. Errors should tell
//! users what went wrong AND how to fix it.
//!
//! ```rust,ignore
//! use fixdoc::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Configuration file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::config_not_found(path));
//! ```

use std::path::Path;

use crate::error::Error;

/// Generate an error for when the configuration file is not found.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create a fixdoc.yaml file in the working directory\n\
         hint: Use -c/--config to specify a different path\n\
         hint: Set the FIXDOC_CONFIG environment variable",
        path = path.display()
    )
}

/// Generate an error for when the document repository does not exist.
pub fn repo_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Document repository not found: {path}\n\n\
         hint: Set host.repo in fixdoc.yaml to a local clone of the documentation\n\
         hint: Relative paths are resolved against the directory of the config file",
        path = path.display()
    )
}

/// Generate an error for when the generator has no API key.
pub fn missing_api_key(env_var: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "No API key for the content generator: {env_var} is not set\n\n\
         hint: Export {env_var} before starting fixdoc\n\
         hint: Set generator.api_key_env to use a different variable\n\
         hint: Use --replacement-file to supply the replacement text yourself"
    )
}

/// Convert a pipeline error into a CLI error, adding hints where they help.
pub fn pipeline_error(error: Error) -> anyhow::Error {
    let hint = match &error {
        Error::InvalidInput { .. } => {
            "hint: Start with the document path, for example: /widgets/button `## Sizing` ..."
        }
        Error::NotFound { .. } => {
            "hint: Run 'fixdoc locate <PATH>' to see which files were tried\n\
             hint: Set resolution.strategy: fuzzy to accept close matches"
        }
        Error::NoCloseMatch { .. } => {
            "hint: Lower resolution.threshold or check the path for typos"
        }
        Error::SectionNotFound { .. } => {
            "hint: Run 'fixdoc locate <PATH> --section <INDICATOR>' to test the indicator\n\
             hint: Prefix the indicator with # marks to pick the heading depth"
        }
        Error::Conflict { .. } => "hint: The document changed upstream; run the request again",
        Error::ConfigParse { .. } | Error::Yaml(_) => {
            "hint: Run 'fixdoc validate' to check your configuration"
        }
        _ => return anyhow::Error::new(error),
    };
    anyhow::anyhow!("{error}\n\n{hint}")
}
