//! Section location
//!
//! A document is parsed into its top-level nodes with `pulldown-cmark`. A
//! section (block) is a heading node plus every following node up to the next
//! heading of equal or shallower depth, or the end of the document.
//!
//! Matches carry byte offsets into the original text as well as node indices,
//! so the patcher can splice without re-rendering anything outside the block.

use std::ops::Range;

use log::debug;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::request::Indicator;

/// How the target section is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionMode {
    /// An indicator is required and matched case-sensitively against heading
    /// text at one depth.
    #[default]
    Strict,
    /// No indicator edits the whole document; an indicator is matched
    /// case-insensitively against any heading line.
    Permissive,
}

/// A top-level heading of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Index of the heading among the document's top-level nodes
    pub node: usize,
    pub depth: u8,
    /// Rendered heading text (inline markup removed)
    pub text: String,
    /// First source line of the heading, trimmed
    pub line: String,
    /// Byte offset of the start of the heading's line
    pub offset: usize,
}

/// Top-level structure of a markdown document
#[derive(Debug, Clone)]
pub struct Outline {
    /// Byte offset where each top-level node's line starts
    node_offsets: Vec<usize>,
    headings: Vec<Heading>,
    len: usize,
}

/// A located section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMatch {
    /// First node of the block (the heading)
    pub start_node: usize,
    /// One past the last node of the block; always greater than `start_node`
    pub end_node: usize,
    pub heading_text: String,
    pub heading_line: String,
    pub depth: u8,
    /// Byte range of the block in the original content
    pub range: Range<usize>,
}

impl SectionMatch {
    /// The block's source text.
    pub fn text<'a>(&self, content: &'a str) -> &'a str {
        &content[self.range.clone()]
    }
}

/// What a request is allowed to edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionTarget {
    Section(SectionMatch),
    WholeDocument,
}

impl SectionTarget {
    /// Byte range to replace in `content`.
    pub fn range(&self, content: &str) -> Range<usize> {
        match self {
            SectionTarget::Section(m) => m.range.clone(),
            SectionTarget::WholeDocument => 0..content.len(),
        }
    }

    /// Source text of the target.
    pub fn text<'a>(&self, content: &'a str) -> &'a str {
        &content[self.range(content)]
    }

    /// Heading text of the target, if it is a section.
    pub fn heading(&self) -> Option<&str> {
        match self {
            SectionTarget::Section(m) => Some(&m.heading_text),
            SectionTarget::WholeDocument => None,
        }
    }
}

fn line_start(content: &str, offset: usize) -> usize {
    content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
    options
}

impl Outline {
    /// Parse `content` into its top-level nodes.
    pub fn parse(content: &str) -> Self {
        let mut node_offsets = Vec::new();
        let mut headings = Vec::new();
        let mut nesting = 0usize;
        let mut current: Option<Heading> = None;

        for (event, range) in Parser::new_ext(content, parser_options()).into_offset_iter() {
            match event {
                Event::Start(tag) => {
                    if nesting == 0 {
                        let offset = line_start(content, range.start);
                        node_offsets.push(offset);
                        if let Tag::Heading { level, .. } = tag {
                            let line = content[offset..]
                                .lines()
                                .next()
                                .unwrap_or_default()
                                .trim()
                                .to_string();
                            current = Some(Heading {
                                node: node_offsets.len() - 1,
                                depth: level as u8,
                                text: String::new(),
                                line,
                                offset,
                            });
                        }
                    }
                    nesting += 1;
                }
                Event::End(tag) => {
                    nesting = nesting.saturating_sub(1);
                    if nesting == 0 {
                        if let (TagEnd::Heading(_), Some(mut heading)) = (tag, current.take()) {
                            heading.text = heading.text.trim().to_string();
                            headings.push(heading);
                        }
                    }
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some(heading) = current.as_mut() {
                        heading.text.push_str(&text);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if let Some(heading) = current.as_mut() {
                        heading.text.push(' ');
                    }
                }
                _ => {
                    // Leaf blocks such as thematic breaks have no Start/End
                    if nesting == 0 {
                        node_offsets.push(line_start(content, range.start));
                    }
                }
            }
        }

        Self {
            node_offsets,
            headings,
            len: content.len(),
        }
    }

    /// Top-level headings in document order.
    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    /// Number of top-level nodes.
    pub fn node_count(&self) -> usize {
        self.node_offsets.len()
    }

    /// The block headed by `heading`.
    pub fn block(&self, heading: &Heading) -> SectionMatch {
        let next = self
            .headings
            .iter()
            .find(|h| h.node > heading.node && h.depth <= heading.depth);
        let (end_node, end) = match next {
            Some(h) => (h.node, h.offset),
            None => (self.node_count(), self.len),
        };
        SectionMatch {
            start_node: heading.node,
            end_node,
            heading_text: heading.text.clone(),
            heading_line: heading.line.clone(),
            depth: heading.depth,
            range: heading.offset..end,
        }
    }

    /// Blocks at a fixed reference depth, in document order.
    pub fn blocks(&self, depth: u8) -> Vec<SectionMatch> {
        self.headings
            .iter()
            .filter(|h| h.depth == depth)
            .map(|h| self.block(h))
            .collect()
    }
}

/// Chooses the section a request edits
#[derive(Debug, Clone, Copy)]
pub struct SectionLocator {
    mode: SectionMode,
    depth: u8,
}

impl SectionLocator {
    /// `depth` is the reference heading depth used when an indicator carries
    /// no `#` prefix.
    pub fn new(mode: SectionMode, depth: u8) -> Self {
        Self {
            mode,
            depth: depth.clamp(1, 6),
        }
    }

    pub fn mode(&self) -> SectionMode {
        self.mode
    }

    /// Find the target of a request in `content`.
    ///
    /// `path` is only used in error messages. The first matching block in
    /// document order wins.
    ///
    /// # Errors
    ///
    /// `Error::SectionNotFound` when an indicator matches no heading, or in
    /// strict mode when there is no indicator (reported with an empty
    /// indicator).
    pub fn locate(
        &self,
        path: &str,
        content: &str,
        indicator: Option<&Indicator>,
    ) -> Result<SectionTarget> {
        let outline = Outline::parse(content);

        let found = match (self.mode, indicator) {
            (SectionMode::Strict, None) => {
                return Err(Error::SectionNotFound {
                    path: path.to_string(),
                    indicator: String::new(),
                });
            }
            (SectionMode::Permissive, None) => {
                debug!("No section indicator, editing all of {}", path);
                return Ok(SectionTarget::WholeDocument);
            }
            (SectionMode::Strict, Some(indicator)) => {
                let depth = indicator.depth.unwrap_or(self.depth);
                outline
                    .blocks(depth)
                    .into_iter()
                    .find(|block| block.heading_text.contains(&indicator.text))
            }
            (SectionMode::Permissive, Some(indicator)) => {
                let needle = indicator.raw.to_lowercase();
                outline
                    .headings()
                    .iter()
                    .find(|h| h.line.to_lowercase().contains(&needle))
                    .map(|h| outline.block(h))
            }
        };

        match found {
            Some(block) => {
                debug!(
                    "Located section '{}' in {} at bytes {:?}",
                    block.heading_text, path, block.range
                );
                Ok(SectionTarget::Section(block))
            }
            None => Err(Error::SectionNotFound {
                path: path.to_string(),
                indicator: indicator.map(|i| i.raw.clone()).unwrap_or_default(),
            }),
        }
    }
}
