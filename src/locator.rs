//! Document location
//!
//! Resolves a canonical path to a stored file on the document host and reads
//! it. Two strategies exist and exactly one is configured:
//!
//! - **Probe**: try a fixed list of stored-path candidates and take the first
//!   that exists. The order is `.md` with the name as given, `.md` with the
//!   first letter capitalized, then the same two for `.mdx`.
//! - **Fuzzy**: score every entry of the corpus index against the path and
//!   take the best one, provided it reaches the threshold. An exact
//!   canonical-path match always wins.

use std::sync::Arc;

use glob::Pattern;
use log::{debug, info};

use crate::corpus::{CorpusCache, CorpusIndex};
use crate::error::{Error, Result};
use crate::host::DocumentHost;
use crate::path::{capitalize_first, CanonicalPath, DOC_EXTENSIONS};

/// A document read from the host, ready to be edited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownDocument {
    /// Canonical path the document was resolved from
    pub canonical: CanonicalPath,
    /// Stored file path relative to the host root
    pub stored_path: String,
    pub content: String,
    /// Version identifier required to write the document back
    pub token: String,
}

/// How canonical paths are resolved to stored files
#[derive(Debug, Clone)]
pub enum Resolver {
    Probe,
    Fuzzy {
        /// Minimum similarity in `[0, 1]`
        threshold: f64,
        /// Stored paths (relative to the docs root) left out of the corpus
        exclude: Vec<Pattern>,
    },
}

/// Resolves canonical paths against one docs root on one branch
pub struct DocumentLocator {
    host: Arc<dyn DocumentHost>,
    docs_root: String,
    branch: String,
    resolver: Resolver,
    corpus: CorpusCache,
}

/// Stored-path candidates for `path` under `root`, in probe order.
pub fn probe_candidates(root: &str, path: &CanonicalPath) -> Vec<String> {
    let root = root.trim_matches('/');
    let parent = path.parent();
    let stem = path.file_stem();
    let names = [stem.to_string(), capitalize_first(stem)];

    let dir = [root, parent]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");

    let mut candidates = Vec::new();
    for ext in DOC_EXTENSIONS {
        for name in &names {
            let candidate = if dir.is_empty() {
                format!("{name}{ext}")
            } else {
                format!("{dir}/{name}{ext}")
            };
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }
    candidates
}

impl DocumentLocator {
    pub fn new(
        host: Arc<dyn DocumentHost>,
        docs_root: &str,
        branch: &str,
        resolver: Resolver,
    ) -> Self {
        Self {
            host,
            docs_root: docs_root.trim_matches('/').to_string(),
            branch: branch.to_string(),
            resolver,
            corpus: CorpusCache::new(),
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolve `path` and read the document it names.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` when no probe candidate exists.
    /// - `Error::NoCloseMatch` when no corpus entry reaches the threshold.
    /// - Host errors other than "not found" are returned unchanged.
    pub fn locate(&self, path: &CanonicalPath) -> Result<MarkdownDocument> {
        match &self.resolver {
            Resolver::Probe => self.probe(path),
            Resolver::Fuzzy { threshold, .. } => self.fuzzy(path, *threshold),
        }
    }

    fn probe(&self, path: &CanonicalPath) -> Result<MarkdownDocument> {
        let candidates = probe_candidates(&self.docs_root, path);
        for candidate in &candidates {
            match self.read(path, candidate) {
                Ok(document) => {
                    info!("Resolved {} to {}", path, candidate);
                    return Ok(document);
                }
                Err(Error::NotFound { .. }) => debug!("No document at {}", candidate),
                Err(e) => return Err(e),
            }
        }
        Err(Error::NotFound {
            path: path.to_string(),
            tried: candidates,
        })
    }

    fn fuzzy(&self, path: &CanonicalPath, threshold: f64) -> Result<MarkdownDocument> {
        let index = self.corpus()?;

        if let Some(entry) = index.get(path) {
            info!("Resolved {} to {} (exact)", path, entry.stored);
            return self.read(path, &entry.stored);
        }

        match index.best_match(path) {
            Some((entry, score)) if score >= threshold => {
                info!(
                    "Resolved {} to {} (similarity {:.2})",
                    path, entry.stored, score
                );
                self.read(path, &entry.stored)
            }
            best => Err(Error::NoCloseMatch {
                query: path.to_string(),
                best: best.map(|(entry, score)| (entry.canonical.to_string(), score)),
                threshold,
            }),
        }
    }

    /// The corpus index, built on first use.
    pub fn corpus(&self) -> Result<Arc<CorpusIndex>> {
        let exclude: &[Pattern] = match &self.resolver {
            Resolver::Fuzzy { exclude, .. } => exclude,
            Resolver::Probe => &[],
        };
        self.corpus.get_or_build(|| {
            CorpusIndex::build(self.host.as_ref(), &self.docs_root, &self.branch, exclude)
        })
    }

    fn read(&self, canonical: &CanonicalPath, stored: &str) -> Result<MarkdownDocument> {
        let file = self.host.read_file(stored, &self.branch)?;
        Ok(MarkdownDocument {
            canonical: canonical.clone(),
            stored_path: stored.to_string(),
            content: file.content,
            token: file.token,
        })
    }
}
