//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `fixdoc`
//! command-line tool. Each subcommand is defined in its own file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the global
//!   [`Context`] and performs the command's logic.
//!
//! The helpers below turn configuration into the collaborators the pipeline
//! needs, so every command wires them the same way.

pub mod completions;
pub mod fix;
pub mod locate;
pub mod serve;
pub mod validate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use log::debug;

use fixdoc::config::{self, Config};
use fixdoc::defaults;
use fixdoc::generate::{ChatCompletionsGenerator, ContentGenerator, FixedGenerator};
use fixdoc::host::git::Author;
use fixdoc::host::{DocumentHost, GitHost};
use fixdoc::output::OutputConfig;
use fixdoc::suggestions;

/// Global flags shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    /// `--config` / `FIXDOC_CONFIG`
    pub config: Option<PathBuf>,
    /// `--color`
    pub color: String,
}

impl Context {
    pub fn output(&self) -> OutputConfig {
        OutputConfig::from_env_and_flag(&self.color)
    }

    /// The config file to read: the explicit one, or the default location.
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => {
                let cwd = std::env::current_dir().context("Cannot read working directory")?;
                Ok(defaults::default_config_path(&cwd))
            }
        }
    }

    /// Load the configuration.
    ///
    /// A missing explicit file is an error; a missing default file yields the
    /// built-in defaults.
    pub fn load_config(&self) -> Result<Config> {
        let path = self.config_path()?;
        if !path.exists() {
            if self.config.is_some() {
                return Err(suggestions::config_not_found(&path));
            }
            debug!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        debug!("Loading config from {}", path.display());
        config::from_file(&path).map_err(suggestions::pipeline_error)
    }
}

/// The git-backed document host described by `config`.
pub fn build_host(config: &Config) -> Result<Arc<dyn DocumentHost>> {
    let repo = &config.host.repo;
    if !repo.exists() {
        return Err(suggestions::repo_not_found(repo));
    }
    let host = GitHost::new(repo, &config.base_branch, config.host.remote.clone())
        .with_proposals(config.host.proposal, config.host.gh_repo.clone())
        .with_author(Author {
            name: config.host.author_name.clone(),
            email: config.host.author_email.clone(),
        });
    Ok(Arc::new(host))
}

/// The content generator: fixed text from `replacement_file` when given,
/// otherwise the configured chat completions endpoint.
pub fn build_generator(
    config: &Config,
    replacement_file: Option<&Path>,
) -> Result<Arc<dyn ContentGenerator>> {
    if let Some(path) = replacement_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replacement file {}", path.display()))?;
        return Ok(Arc::new(FixedGenerator(text)));
    }

    let generator = &config.generator;
    let api_key = generator.api_key();
    if api_key.is_none() && generator.endpoint == defaults::GENERATOR_ENDPOINT {
        return Err(suggestions::missing_api_key(&generator.api_key_env));
    }
    let client = ChatCompletionsGenerator::new(
        &generator.endpoint,
        &generator.model,
        api_key,
        generator.timeout(),
    )
    .map_err(suggestions::pipeline_error)?;
    Ok(Arc::new(client))
}
