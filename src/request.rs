//! Inbound change requests
//!
//! A slash command arrives as a single line of text such as
//! `` /widgets/button `## Sizing` fix the pixel example ``. The first
//! whitespace-delimited token is the document path, the rest is the issue
//! description. The optional backtick-quoted token inside the issue selects
//! the section to edit.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

/// One change request, created per inbound trigger and consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Path exactly as typed by the user (not yet normalized)
    pub raw_path: String,
    /// Free-text issue description, possibly containing a backticked indicator
    pub issue: String,
    /// Name of the user who triggered the request
    pub username: String,
    /// Where the outcome is reported
    pub callback: String,
}

impl Request {
    /// Split slash-command text into path and issue.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the text is blank.
    pub fn from_command(text: &str, username: &str, callback: &str) -> Result<Self> {
        let text = text.trim();
        let mut parts = text.splitn(2, char::is_whitespace);
        let raw_path = parts.next().unwrap_or_default();
        if raw_path.is_empty() {
            return Err(Error::invalid_input(
                "expected `<document path> <issue description>`",
            ));
        }
        let issue = parts.next().unwrap_or_default().trim();

        Ok(Self {
            raw_path: raw_path.to_string(),
            issue: issue.to_string(),
            username: username.trim().to_string(),
            callback: callback.trim().to_string(),
        })
    }

    /// The section indicator carried by the issue text, if any.
    pub fn indicator(&self) -> Option<Indicator> {
        Indicator::extract(&self.issue)
    }
}

/// Section selector taken from the first backtick-quoted token of an issue.
///
/// A leading run of `#` characters fixes the heading depth to match
/// (`` `## Sizing` `` only matches level-2 headings); without it the
/// configured reference depth applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    /// The token as written between the backticks, trimmed
    pub raw: String,
    /// Heading text to look for, without `#` markers
    pub text: String,
    /// Heading depth requested by a `#` prefix
    pub depth: Option<u8>,
}

fn backtick_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`([^`\n]+)`").expect("static regex is valid"))
}

impl Indicator {
    /// Find the first non-blank backtick-quoted token in `issue`.
    pub fn extract(issue: &str) -> Option<Self> {
        backtick_regex()
            .captures_iter(issue)
            .filter_map(|caps| caps.get(1))
            .find_map(|m| Self::parse(m.as_str()))
    }

    /// Parse a raw token, splitting off a `#` depth prefix.
    pub fn parse(token: &str) -> Option<Self> {
        let raw = token.trim();
        let hashes = raw.chars().take_while(|c| *c == '#').count();
        let text = raw[hashes..].trim();
        if text.is_empty() {
            return None;
        }
        let depth = match hashes {
            0 => None,
            n => Some(n.min(6) as u8),
        };
        Some(Self {
            raw: raw.to_string(),
            text: text.to_string(),
            depth,
        })
    }
}
