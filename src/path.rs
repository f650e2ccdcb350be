//! Canonical document path handling
//!
//! A canonical path is the extensionless, leading-slash identifier of a
//! document (`/widgets/button`), independent of how the file is actually
//! stored (`docs/widgets/Button.mdx`).

use crate::error::{Error, Result};
use std::fmt;
use url::Url;

/// Markdown extensions recognised on stored documents, in probe order.
pub const DOC_EXTENSIONS: [&str; 2] = [".md", ".mdx"];

/// Normalized, extensionless document identifier starting with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    /// The canonical path as a string, always starting with `/`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments without the leading slash.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Last segment of the path (the document name).
    pub fn file_stem(&self) -> &str {
        self.segments().last().unwrap_or_default()
    }

    /// Everything before the last segment, without leading or trailing slash.
    pub fn parent(&self) -> &str {
        let trimmed = self.0.trim_start_matches('/');
        match trimmed.rfind('/') {
            Some(idx) => &trimmed[..idx],
            None => "",
        }
    }

    /// Build a canonical path from a stored file path relative to `root`.
    ///
    /// Returns `None` when the file is outside `root` or is not a markdown
    /// document.
    pub fn from_stored(root: &str, stored: &str) -> Option<Self> {
        let root = root.trim_matches('/');
        let relative = if root.is_empty() {
            stored
        } else {
            stored.strip_prefix(root)?.strip_prefix('/')?
        };
        if strip_doc_extension(relative) == relative {
            return None;
        }
        normalize(relative).ok()
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize raw user input into a canonical document path.
///
/// - A full `http(s)` URL contributes only its path component; its query
///   string and `#` anchor are dropped. Any other input is taken as a path,
///   so `?` and `#` are ordinary characters there (`/lang/c#`).
/// - Empty, `.` and `..` segments are removed, so the result has exactly one
///   leading slash and never escapes the document root.
/// - Whitespace runs inside a segment collapse to a single space.
/// - A trailing `.md`/`.mdx` extension is removed (repeatedly).
///
/// `normalize` is idempotent: feeding its output back in returns it unchanged.
///
/// # Errors
///
/// Returns `Error::InvalidInput` if nothing is left after normalization.
pub fn normalize(raw: &str) -> Result<CanonicalPath> {
    let raw = raw.trim();
    let path_part = match Url::parse(raw) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => url.path().to_string(),
        _ => raw.to_string(),
    };

    let mut segments: Vec<String> = path_part
        .split(['/', '\\'])
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .collect();

    while let Some(last) = segments.last_mut() {
        let stripped = strip_doc_extension(last).trim().to_string();
        if stripped.is_empty() || stripped == "." || stripped == ".." {
            segments.pop();
            continue;
        }
        *last = stripped;
        break;
    }

    if segments.is_empty() {
        return Err(Error::invalid_input(format!(
            "'{}' does not name a document",
            raw
        )));
    }

    Ok(CanonicalPath(format!("/{}", segments.join("/"))))
}

/// Remove every trailing markdown extension (`a.md.mdx` → `a`).
fn strip_doc_extension(name: &str) -> &str {
    let mut current = name;
    loop {
        let lower = current.to_ascii_lowercase();
        let Some(ext) = DOC_EXTENSIONS.iter().find(|ext| lower.ends_with(*ext)) else {
            return current;
        };
        current = &current[..current.len() - ext.len()];
    }
}

fn collapse_whitespace(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Capitalize the first character of a name (`button` → `Button`).
pub fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
