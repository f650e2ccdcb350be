//! Section patching
//!
//! Splices replacement text into a located section. Everything outside the
//! section is preserved byte-for-byte. Two splice strategies are available:
//!
//! - **Range**: replace the byte range recorded by the section locator.
//! - **Heading line**: find the section's heading line again by trimmed
//!   equality and replace up to the next heading line of any depth. Fails if
//!   the heading line is gone.

use std::ops::Range;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::section::SectionTarget;

/// How a replacement is spliced into the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpliceMode {
    #[default]
    Range,
    HeadingLine,
}

fn heading_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#+\s").expect("static regex is valid"))
}

fn fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\A(`{3,}|~{3,})[ \t]*[\w-]*[ \t]*\r?\n(.*?)\r?\n[ \t]*(`{3,}|~{3,})\z")
            .expect("static regex is valid")
    })
}

/// Turn generated text into a replacement section.
///
/// The text is trimmed and a single fenced code block wrapping the whole of
/// it is unwrapped (generators often answer with ```` ```markdown ````).
///
/// # Errors
///
/// Returns `Error::EmptySuggestion` if nothing is left.
pub fn prepare_replacement(generated: &str) -> Result<String> {
    let trimmed = generated.trim();
    let unwrapped = match fence().captures(trimmed) {
        Some(caps) if caps[1] == caps[3] => caps.get(2).map(|m| m.as_str()).unwrap_or_default(),
        _ => trimmed,
    };
    let replacement = unwrapped.trim();
    if replacement.is_empty() {
        return Err(Error::EmptySuggestion);
    }
    Ok(replacement.to_string())
}

/// Replace `range` of `content` with `replacement`.
///
/// The trailing whitespace of the replaced text is kept in place of the
/// replacement's own, so blank-line separation from the following block does
/// not change. Splicing a range's own text back returns `content` unchanged.
pub fn splice_range(content: &str, range: Range<usize>, replacement: &str) -> String {
    let original = &content[range.clone()];
    let separator = &original[original.trim_end().len()..];
    let body = replacement.trim_end();

    let mut patched = String::with_capacity(content.len() + replacement.len());
    patched.push_str(&content[..range.start]);
    patched.push_str(body);
    patched.push_str(separator);
    if separator.is_empty() && range.end < content.len() && !body.is_empty() {
        patched.push('\n');
    }
    patched.push_str(&content[range.end..]);
    patched
}

/// Byte range of the section starting at the line equal to `heading_line`
/// (after trimming) and ending before the next heading line.
pub fn heading_line_range(content: &str, heading_line: &str) -> Option<Range<usize>> {
    let wanted = heading_line.trim();
    let mut start = None;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        match start {
            None if line.trim() == wanted => start = Some(offset),
            Some(s) if heading_marker().is_match(line) => return Some(s..offset),
            _ => {}
        }
        offset += line.len();
    }
    start.map(|s| s..content.len())
}

/// Splice a replacement into a document
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionPatcher {
    mode: SpliceMode,
}

impl SectionPatcher {
    pub fn new(mode: SpliceMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> SpliceMode {
        self.mode
    }

    /// Byte range of `content` that `target` covers under this splice mode.
    ///
    /// This is both the text handed to the generator and the range the
    /// replacement is spliced over. In heading-line mode it ends at the next
    /// heading of any depth, so deeper subsections stay outside it.
    ///
    /// # Errors
    ///
    /// Returns `Error::SectionNotFound` in heading-line mode when the heading
    /// line no longer exists in `content`.
    pub fn source_range(
        &self,
        path: &str,
        content: &str,
        target: &SectionTarget,
    ) -> Result<Range<usize>> {
        match (self.mode, target) {
            (SpliceMode::HeadingLine, SectionTarget::Section(section)) => {
                heading_line_range(content, &section.heading_line).ok_or_else(|| {
                    Error::SectionNotFound {
                        path: path.to_string(),
                        indicator: section.heading_line.clone(),
                    }
                })
            }
            _ => Ok(target.range(content)),
        }
    }

    /// Replace the [`source_range`](Self::source_range) of `target` in
    /// `content` with `replacement`.
    ///
    /// `path` is only used in error messages.
    pub fn patch(
        &self,
        path: &str,
        content: &str,
        target: &SectionTarget,
        replacement: &str,
    ) -> Result<String> {
        let range = self.source_range(path, content, target)?;
        debug!("Splicing {} bytes into {} at {:?}", replacement.len(), path, range);
        Ok(splice_range(content, range, replacement))
    }
}
