//! In-memory document host
//!
//! Branches are snapshots of path → content maps. Blob ids are content
//! hashes and commit ids come from a counter, so tokens behave like the ones
//! a real host hands out: identical content has an identical token, and any
//! change to a file changes its token.

use super::{DirEntry, DocumentHost, EntryKind, ProposalRequest, RemoteFile, WriteRequest};
use crate::error::{Error, Result};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

/// Snapshot of one branch
#[derive(Debug, Clone, Default)]
struct Branch {
    tip: String,
    files: BTreeMap<String, String>,
}

/// A change proposal recorded by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub number: usize,
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Default)]
struct State {
    branches: HashMap<String, Branch>,
    proposals: Vec<Proposal>,
    commits: u64,
    unlistable: BTreeSet<String>,
}

impl State {
    fn next_commit(&mut self) -> String {
        self.commits += 1;
        format!("commit-{:04}", self.commits)
    }
}

/// In-process document host for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<State>,
}

/// Content hash used as a blob id.
pub fn blob_id(content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

impl MemoryHost {
    /// Create a host with a single empty branch.
    pub fn new(base_branch: &str) -> Self {
        let host = Self::default();
        {
            let mut state = host.lock();
            let tip = state.next_commit();
            state.branches.insert(
                base_branch.to_string(),
                Branch {
                    tip,
                    files: BTreeMap::new(),
                },
            );
        }
        host
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock can only come from a test assertion;
        // the state itself is always consistent between statements.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Commit a file directly onto a branch, bypassing token checks.
    ///
    /// Creates the branch if needed. Used to seed content and to simulate
    /// concurrent upstream edits.
    pub fn commit_file(&self, branch: &str, path: &str, content: &str) {
        let mut state = self.lock();
        let tip = state.next_commit();
        let entry = state.branches.entry(branch.to_string()).or_default();
        entry.files.insert(path.trim_matches('/').to_string(), content.to_string());
        entry.tip = tip;
    }

    /// Builder-style variant of [`MemoryHost::commit_file`].
    pub fn with_file(self, branch: &str, path: &str, content: &str) -> Self {
        self.commit_file(branch, path, content);
        self
    }

    /// Make listing `dir` (and everything below it) fail.
    pub fn make_unlistable(&self, dir: &str) {
        self.lock().unlistable.insert(dir.trim_matches('/').to_string());
    }

    /// Content of a file on a branch, if present.
    pub fn file(&self, branch: &str, path: &str) -> Option<String> {
        self.lock()
            .branches
            .get(branch)
            .and_then(|b| b.files.get(path.trim_matches('/')).cloned())
    }

    /// Names of all branches, sorted.
    pub fn branches(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().branches.keys().cloned().collect();
        names.sort();
        names
    }

    /// All proposals opened so far, in order.
    pub fn proposals(&self) -> Vec<Proposal> {
        self.lock().proposals.clone()
    }
}

impl DocumentHost for MemoryHost {
    fn read_file(&self, path: &str, branch: &str) -> Result<RemoteFile> {
        let path = path.trim_matches('/');
        let state = self.lock();
        let content = state
            .branches
            .get(branch)
            .and_then(|b| b.files.get(path))
            .ok_or_else(|| Error::NotFound {
                path: path.to_string(),
                tried: vec![format!("{branch}:{path}")],
            })?;
        Ok(RemoteFile {
            content: content.clone(),
            token: blob_id(content),
        })
    }

    fn list_dir(&self, path: &str, branch: &str) -> Result<Vec<DirEntry>> {
        let dir = path.trim_matches('/');
        let state = self.lock();
        if state
            .unlistable
            .iter()
            .any(|u| dir == u || dir.starts_with(&format!("{u}/")))
        {
            return Err(Error::upstream(
                "document host",
                format!("listing {dir} is not permitted"),
            ));
        }
        let branch = state
            .branches
            .get(branch)
            .ok_or_else(|| Error::upstream("document host", format!("unknown branch {branch}")))?;

        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };
        let mut entries: Vec<DirEntry> = Vec::new();
        let mut seen_dirs = BTreeSet::new();
        for file in branch.files.keys() {
            let Some(rest) = file.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((child, _)) => {
                    if seen_dirs.insert(child.to_string()) {
                        entries.push(DirEntry {
                            path: format!("{prefix}{child}"),
                            kind: EntryKind::Dir,
                        });
                    }
                }
                None => entries.push(DirEntry {
                    path: file.clone(),
                    kind: EntryKind::File,
                }),
            }
        }
        if entries.is_empty() && !dir.is_empty() {
            return Err(Error::NotFound {
                path: dir.to_string(),
                tried: vec![dir.to_string()],
            });
        }
        Ok(entries)
    }

    fn branch_tip(&self, branch: &str) -> Result<String> {
        self.lock()
            .branches
            .get(branch)
            .map(|b| b.tip.clone())
            .ok_or_else(|| Error::upstream("document host", format!("unknown branch {branch}")))
    }

    fn create_branch(&self, name: &str, tip: &str) -> Result<()> {
        let mut state = self.lock();
        if state.branches.contains_key(name) {
            return Err(Error::Conflict {
                path: String::new(),
                branch: name.to_string(),
                message: "branch already exists".to_string(),
            });
        }
        let source = state
            .branches
            .values()
            .find(|b| b.tip == tip)
            .cloned()
            .ok_or_else(|| Error::upstream("document host", format!("unknown commit {tip}")))?;
        state.branches.insert(name.to_string(), source);
        Ok(())
    }

    fn write_file(&self, request: &WriteRequest<'_>) -> Result<()> {
        let path = request.path.trim_matches('/');
        let mut state = self.lock();
        let current = state
            .branches
            .get(request.branch)
            .ok_or_else(|| {
                Error::upstream("document host", format!("unknown branch {}", request.branch))
            })?
            .files
            .get(path)
            .map(|c| blob_id(c));
        if current.as_deref() != Some(request.token) {
            return Err(Error::Conflict {
                path: path.to_string(),
                branch: request.branch.to_string(),
                message: format!(
                    "expected blob {}, found {}",
                    request.token,
                    current.as_deref().unwrap_or("nothing")
                ),
            });
        }
        let tip = state.next_commit();
        if let Some(branch) = state.branches.get_mut(request.branch) {
            branch.files.insert(path.to_string(), request.content.to_string());
            branch.tip = tip;
        }
        Ok(())
    }

    fn open_proposal(&self, request: &ProposalRequest<'_>) -> Result<String> {
        let mut state = self.lock();
        for branch in [request.head, request.base] {
            if !state.branches.contains_key(branch) {
                return Err(Error::upstream(
                    "document host",
                    format!("unknown branch {branch}"),
                ));
            }
        }
        let number = state.proposals.len() + 1;
        state.proposals.push(Proposal {
            number,
            head: request.head.to_string(),
            base: request.base.to_string(),
            title: request.title.to_string(),
            body: request.body.to_string(),
        });
        Ok(format!("memory://proposals/{number}"))
    }
}
