//! # Error Handling
//!
//! This module defines the error taxonomy shared by every stage of the
//! `fixdoc` pipeline. It uses `thiserror` to build a single `Error` enum
//! whose variants map one-to-one onto the ways a change request can fail.
//!
//! ## Key Components
//!
//! - **`Error`**: every failure mode of the pipeline plus the ambient ones
//!   (configuration, I/O, YAML).
//!
//! - **`Result<T>`**: a type alias for `std::result::Result<T, Error>`.
//!
//! Pipeline stages return these errors unchanged; the orchestrator catches
//! them exactly once and turns them into the short text delivered through the
//! callback channel via [`Error::user_message`].

use thiserror::Error;

/// Main error type for fixdoc operations
#[derive(Error, Debug)]
pub enum Error {
    /// The request itself is unusable: empty path, missing indicator in
    /// strict mode, malformed command text.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// No stored document exists for a canonical path.
    ///
    /// `tried` lists the stored paths that were probed, in order.
    #[error("Document not found: {path} (tried {})", tried.join(", "))]
    NotFound { path: String, tried: Vec<String> },

    /// Fuzzy resolution found no corpus entry scoring at or above the
    /// threshold.
    #[error("No document close to {query} (best: {}, threshold {threshold})", best.as_ref().map(|(p, s)| format!("{} at {:.2}", p, s)).unwrap_or_else(|| "none".to_string()))]
    NoCloseMatch {
        query: String,
        best: Option<(String, f64)>,
        threshold: f64,
    },

    /// The requested section does not exist in the document, or could no
    /// longer be found when splicing. An empty indicator means the request
    /// named no section at all.
    #[error("Section not found in {path}: {}", if indicator.is_empty() { "no section indicator given" } else { indicator.as_str() })]
    SectionNotFound { path: String, indicator: String },

    /// A remote collaborator (document host, generator, callback endpoint)
    /// failed or was unreachable.
    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable { service: String, message: String },

    /// The content generator returned nothing usable.
    #[error("Content generator returned an empty suggestion")]
    EmptySuggestion,

    /// A write was rejected because the document or branch moved since it
    /// was read.
    #[error("Write conflict on {path} in branch {branch}: {message}")]
    Conflict {
        path: String,
        branch: String,
        message: String,
    },

    /// An error occurred while parsing or validating the configuration.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Shorthand for an `UpstreamUnavailable` error.
    pub fn upstream(service: &str, message: impl Into<String>) -> Self {
        Error::UpstreamUnavailable {
            service: service.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for an `InvalidInput` error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput {
            message: message.into(),
        }
    }

    /// Short, human-readable text suitable for the callback channel.
    ///
    /// Unlike `Display`, this never includes internal details such as probe
    /// lists or subprocess stderr.
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidInput { message } => format!("I couldn't understand that request: {message}"),
            Error::NotFound { path, .. } => format!("I couldn't find a document at `{path}`."),
            Error::NoCloseMatch { query, .. } => {
                format!("I couldn't find any document resembling `{query}`.")
            }
            Error::SectionNotFound { path, indicator } if indicator.is_empty() => format!(
                "Which part of `{path}` should change? Name the section in backticks, for example `## Usage`."
            ),
            Error::SectionNotFound { path, indicator } => {
                format!("I couldn't find a section matching `{indicator}` in `{path}`.")
            }
            Error::UpstreamUnavailable { service, .. } => {
                format!("The {service} is unavailable right now, please try again later.")
            }
            Error::EmptySuggestion => {
                "The content generator came back empty, so nothing was changed.".to_string()
            }
            Error::Conflict { path, .. } => format!(
                "`{path}` changed while I was editing it. Please send the request again."
            ),
            Error::ConfigParse { .. } | Error::Io(_) | Error::Yaml(_) => INTERNAL_FAILURE.to_string(),
        }
    }
}

/// Callback text for failures whose details stay in the log
pub const INTERNAL_FAILURE: &str = "Something went wrong on our side while handling that request.";

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
