//! Corpus index of every document under the docs root
//!
//! The index maps each stored markdown file to its canonical path and feeds
//! fuzzy document lookup. It is built once per process by walking the host's
//! directory listings and is never invalidated: documents added or renamed
//! upstream are not seen until restart.

use std::sync::{Arc, Mutex, MutexGuard};

use glob::{MatchOptions, Pattern};
use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::host::{DocumentHost, EntryKind};
use crate::path::{CanonicalPath, DOC_EXTENSIONS};

/// One indexed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    pub canonical: CanonicalPath,
    /// Path of the stored file relative to the host root
    pub stored: String,
}

/// Ordered, canonical-path-unique collection of documents
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    entries: Vec<CorpusEntry>,
}

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Similarity of two canonical paths in `[0, 1]`.
///
/// Sørensen–Dice over character bigrams of the lowercased strings; identical
/// paths score exactly `1.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    strsim::sorensen_dice(&a.to_lowercase(), &b.to_lowercase())
}

impl CorpusIndex {
    /// Build an index from entries, keeping the first entry for each
    /// canonical path.
    pub fn from_entries(entries: impl IntoIterator<Item = CorpusEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.push(entry);
        }
        index
    }

    fn push(&mut self, entry: CorpusEntry) {
        if let Some(existing) = self.get(&entry.canonical) {
            debug!(
                "Skipping {}: {} already indexed as {}",
                entry.stored, existing.stored, entry.canonical
            );
            return;
        }
        self.entries.push(entry);
    }

    /// Walk `root` on `branch` and index every markdown document below it.
    ///
    /// Failure to list a subdirectory is logged and that subtree is left out;
    /// failure to list `root` itself fails the build. Stored paths matching
    /// one of `exclude` (relative to `root`) are skipped.
    pub fn build(
        host: &dyn DocumentHost,
        root: &str,
        branch: &str,
        exclude: &[Pattern],
    ) -> Result<Self> {
        let root = root.trim_matches('/');
        let mut index = Self::default();

        let top = host.list_dir(root, branch)?;
        let mut pending: Vec<_> = top.into_iter().rev().collect();

        // Depth-first in listing order so tie-breaking follows the walk
        while let Some(entry) = pending.pop() {
            match entry.kind {
                EntryKind::Dir => match host.list_dir(&entry.path, branch) {
                    Ok(children) => pending.extend(children.into_iter().rev()),
                    Err(e) => warn!("Leaving {} out of the corpus: {}", entry.path, e),
                },
                EntryKind::File => {
                    if !is_document(&entry.path) || is_excluded(root, &entry.path, exclude) {
                        continue;
                    }
                    if let Some(canonical) = CanonicalPath::from_stored(root, &entry.path) {
                        index.push(CorpusEntry {
                            canonical,
                            stored: entry.path,
                        });
                    }
                }
            }
        }

        info!("Indexed {} documents under {}", index.len(), root);
        Ok(index)
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact canonical-path lookup.
    pub fn get(&self, canonical: &CanonicalPath) -> Option<&CorpusEntry> {
        self.entries.iter().find(|e| &e.canonical == canonical)
    }

    /// Highest-scoring entry for `query`; ties go to the earliest entry.
    pub fn best_match(&self, query: &CanonicalPath) -> Option<(&CorpusEntry, f64)> {
        let mut best: Option<(&CorpusEntry, f64)> = None;
        for entry in &self.entries {
            let score = similarity(query.as_str(), entry.canonical.as_str());
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((entry, score)),
            }
        }
        best
    }
}

fn is_document(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    DOC_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn is_excluded(root: &str, stored: &str, exclude: &[Pattern]) -> bool {
    let relative = if root.is_empty() {
        stored
    } else {
        stored
            .strip_prefix(root)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(stored)
    };
    exclude
        .iter()
        .any(|pattern| pattern.matches_with(relative, GLOB_OPTIONS))
}

/// Compile exclude globs, reporting the first invalid one.
pub fn compile_excludes(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| Error::ConfigParse {
                message: format!("invalid exclude pattern '{}': {}", p, e),
                hint: Some("Use glob syntax such as \"**/_*\" or \"drafts/**\"".to_string()),
            })
        })
        .collect()
}

/// Process-lifetime holder of the corpus index.
///
/// The first caller builds the index while holding the lock, so concurrent
/// requests wait for a single build instead of walking the host twice. A
/// failed build is not cached.
#[derive(Debug, Default)]
pub struct CorpusCache {
    slot: Mutex<Option<Arc<CorpusIndex>>>,
}

impl CorpusCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<CorpusIndex>>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get the cached index, or build and cache it if not present
    pub fn get_or_build<F>(&self, build: F) -> Result<Arc<CorpusIndex>>
    where
        F: FnOnce() -> Result<CorpusIndex>,
    {
        let mut slot = self.lock();
        if let Some(index) = slot.as_ref() {
            return Ok(Arc::clone(index));
        }
        let index = Arc::new(build()?);
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    /// The index, if it has been built.
    pub fn get(&self) -> Option<Arc<CorpusIndex>> {
        self.lock().clone()
    }

    pub fn is_built(&self) -> bool {
        self.lock().is_some()
    }
}
