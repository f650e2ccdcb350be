//! # Configuration Schema and Parsing
//!
//! This module defines the data structures that represent the `fixdoc.yaml`
//! configuration file and the logic for parsing and validating it.
//!
//! ## Key Components
//!
//! - **`Config`**: the whole file. Every field has a default, so an empty
//!   file is a valid configuration.
//!
//! - **Section structs** (`ResolutionConfig`, `SectionConfig`, `HostConfig`,
//!   `GeneratorConfig`, `ServerConfig`): one per top-level key.
//!
//! ## Parsing
//!
//! [`parse`] reads YAML and then runs [`Config::validate`], so a `Config`
//! obtained from it is always usable. Unknown keys are rejected to catch
//! typos. [`from_file`] additionally resolves relative paths (`host.repo`,
//! `generator.prompt_template`) against the directory of the file.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::corpus::compile_excludes;
use crate::defaults;
use crate::error::{Error, Result};
use crate::host::git::ProposalBackend;
use crate::locator::Resolver;
use crate::patch::SpliceMode;
use crate::section::SectionMode;

/// Which document resolution strategy is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    #[default]
    Probe,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolutionConfig {
    pub strategy: ResolutionStrategy,
    /// Minimum similarity for fuzzy matches
    pub threshold: f64,
    /// Glob patterns (relative to the docs root) left out of the corpus
    pub exclude: Vec<String>,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            strategy: ResolutionStrategy::Probe,
            threshold: defaults::FUZZY_THRESHOLD,
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SectionConfig {
    pub mode: SectionMode,
    /// Reference heading depth for indicators without a `#` prefix
    pub depth: u8,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            mode: SectionMode::Strict,
            depth: defaults::SECTION_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Local clone holding the documents
    pub repo: PathBuf,
    /// Remote to fetch from and push to
    pub remote: Option<String>,
    pub proposal: ProposalBackend,
    /// `owner/name` passed to `gh --repo`
    pub gh_repo: Option<String>,
    pub author_name: String,
    pub author_email: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            repo: PathBuf::from("."),
            remote: None,
            proposal: ProposalBackend::None,
            gh_repo: None,
            author_name: "fixdoc".to_string(),
            author_email: "fixdoc@localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub prompt_template: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::GENERATOR_ENDPOINT.to_string(),
            model: defaults::GENERATOR_MODEL.to_string(),
            api_key_env: defaults::API_KEY_ENV.to_string(),
            prompt_template: None,
            timeout_secs: defaults::GENERATOR_TIMEOUT_SECS,
        }
    }
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// API key from the configured environment variable, if set.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    /// Path the slash command is posted to
    pub route: String,
    /// Background worker threads
    pub workers: usize,
    pub callback_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::BIND_ADDR.to_string(),
            route: defaults::ROUTE.to_string(),
            workers: defaults::WORKERS,
            callback_timeout_secs: defaults::CALLBACK_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    /// Listen address, with the port replaced by `$PORT` when set.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let mut addr: SocketAddr = self.bind.parse().map_err(|e| Error::ConfigParse {
            message: format!("server.bind '{}' is not a socket address: {}", self.bind, e),
            hint: Some("Use host:port, for example 0.0.0.0:3000".to_string()),
        })?;
        if let Ok(port) = std::env::var("PORT") {
            let port: u16 = port.trim().parse().map_err(|_| Error::ConfigParse {
                message: format!("PORT '{}' is not a port number", port),
                hint: None,
            })?;
            addr.set_port(port);
        }
        Ok(addr)
    }

    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_secs)
    }
}

/// The whole configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory under the repository holding the documents
    pub docs_root: String,
    pub base_branch: String,
    pub branch_prefix: String,
    pub resolution: ResolutionConfig,
    pub section: SectionConfig,
    pub splice: SpliceMode,
    pub host: HostConfig,
    pub generator: GeneratorConfig,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docs_root: defaults::DOCS_ROOT.to_string(),
            base_branch: defaults::BASE_BRANCH.to_string(),
            branch_prefix: defaults::BRANCH_PREFIX.to_string(),
            resolution: ResolutionConfig::default(),
            section: SectionConfig::default(),
            splice: SpliceMode::Range,
            host: HostConfig::default(),
            generator: GeneratorConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

fn invalid(message: impl Into<String>, hint: &str) -> Error {
    Error::ConfigParse {
        message: message.into(),
        hint: Some(hint.to_string()),
    }
}

impl Config {
    /// Check value ranges that the YAML types cannot express.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.resolution.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(invalid(
                format!("resolution.threshold {} is outside [0, 1]", threshold),
                "Use a similarity between 0 and 1, such as 0.5",
            ));
        }
        compile_excludes(&self.resolution.exclude)?;

        if !(1..=6).contains(&self.section.depth) {
            return Err(invalid(
                format!("section.depth {} is outside 1..=6", self.section.depth),
                "Markdown headings range from # (1) to ###### (6)",
            ));
        }
        if self.base_branch.trim().is_empty() {
            return Err(invalid("base_branch is empty", "Set base_branch: main"));
        }
        if self.server.workers == 0 {
            return Err(invalid(
                "server.workers must be at least 1",
                "Set server.workers to the number of concurrent requests to run",
            ));
        }
        if !self.server.route.starts_with('/') {
            return Err(invalid(
                format!("server.route '{}' must start with '/'", self.server.route),
                "For example: route: /slack/fixdoc",
            ));
        }
        if self.generator.timeout_secs == 0 || self.server.callback_timeout_secs == 0 {
            return Err(invalid(
                "timeouts must be at least one second",
                "Set generator.timeout_secs and server.callback_timeout_secs to positive values",
            ));
        }
        Ok(())
    }

    /// The configured document resolver.
    pub fn resolver(&self) -> Result<Resolver> {
        Ok(match self.resolution.strategy {
            ResolutionStrategy::Probe => Resolver::Probe,
            ResolutionStrategy::Fuzzy => Resolver::Fuzzy {
                threshold: self.resolution.threshold,
                exclude: compile_excludes(&self.resolution.exclude)?,
            },
        })
    }

    /// Resolve relative paths against `base`.
    fn resolve_paths(&mut self, base: &Path) {
        if self.host.repo.is_relative() {
            self.host.repo = base.join(&self.host.repo);
        }
        if let Some(template) = &self.generator.prompt_template {
            if template.is_relative() {
                self.generator.prompt_template = Some(base.join(template));
            }
        }
    }
}

/// Parse and validate a configuration from YAML text.
pub fn parse(yaml_content: &str) -> Result<Config> {
    let config: Config = if yaml_content.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(yaml_content)?
    };
    config.validate()?;
    Ok(config)
}

/// Parse a configuration file, resolving relative paths against its directory.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    let mut config = parse(&content)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base);
    Ok(config)
}
