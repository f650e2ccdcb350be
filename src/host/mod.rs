//! # Document Hosts
//!
//! The document host stores the markdown corpus and provides the versioning
//! primitives the publisher needs: read a file together with its concurrency
//! token, list a directory, read a branch tip, create a branch, write a file
//! under optimistic concurrency control, and open a change proposal.
//!
//! The pipeline only talks to the [`DocumentHost`] trait, so the backing
//! store can be swapped out:
//!
//! - **`MemoryHost`**: an in-process host used by tests and dry runs.
//! - **`GitHost`**: a local repository driven through the `git` command,
//!   optionally synchronised with a remote and opening pull requests through
//!   the `gh` command.

pub mod git;
pub mod memory;

pub use git::GitHost;
pub use memory::MemoryHost;

use crate::error::Result;

/// A file read from the host, with the version identifier required to write
/// it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// File content as UTF-8 text
    pub content: String,
    /// Opaque exact-version identifier (a blob id)
    pub token: String,
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry of a directory listing, with its path relative to the host root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: String,
    pub kind: EntryKind,
}

/// Write request for [`DocumentHost::write_file`].
#[derive(Debug, Clone)]
pub struct WriteRequest<'a> {
    pub path: &'a str,
    pub branch: &'a str,
    pub content: &'a str,
    pub message: &'a str,
    /// The token read together with the document; the host rejects the write
    /// with `Error::Conflict` if the file no longer has this version.
    pub token: &'a str,
}

/// Change proposal request for [`DocumentHost::open_proposal`].
#[derive(Debug, Clone)]
pub struct ProposalRequest<'a> {
    pub head: &'a str,
    pub base: &'a str,
    pub title: &'a str,
    pub body: &'a str,
}

/// Storage and versioning primitives of the document host.
///
/// Implementations must be safe to share across worker threads. None of the
/// methods retry; a failure is reported once and the caller decides.
pub trait DocumentHost: Send + Sync {
    /// Bring the local view of `branch` up to date before a request starts.
    ///
    /// Hosts without a separate local view do nothing.
    fn refresh(&self, _branch: &str) -> Result<()> {
        Ok(())
    }

    /// Read a file on a branch.
    ///
    /// Returns `Error::NotFound` if the file does not exist there.
    fn read_file(&self, path: &str, branch: &str) -> Result<RemoteFile>;

    /// List the immediate children of a directory on a branch.
    fn list_dir(&self, path: &str, branch: &str) -> Result<Vec<DirEntry>>;

    /// Current tip (commit id) of a branch.
    fn branch_tip(&self, branch: &str) -> Result<String>;

    /// Create `name` pointing at `tip`. Fails if the branch already exists.
    fn create_branch(&self, name: &str, tip: &str) -> Result<()>;

    /// Commit new content for one file onto a branch.
    fn write_file(&self, request: &WriteRequest<'_>) -> Result<()>;

    /// Open a change proposal from `head` into `base`, returning its
    /// user-facing location.
    fn open_proposal(&self, request: &ProposalRequest<'_>) -> Result<String>;
}
