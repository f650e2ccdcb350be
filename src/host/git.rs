//! Document host backed by a local Git repository
//!
//! All operations shell out to the system `git` command, which automatically
//! picks up SSH keys, credential helpers and any authentication configured in
//! `~/.gitconfig` for fetches and pushes.
//!
//! Writes never touch a working tree: the new blob, tree and commit are built
//! with plumbing commands against a temporary index, and the branch is moved
//! with a compare-and-swap `git update-ref`, so the repository may be bare.

use super::{DirEntry, DocumentHost, EntryKind, ProposalRequest, RemoteFile, WriteRequest};
use crate::error::{Error, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex};

const SERVICE: &str = "document host";

/// How change proposals are opened once a branch has been written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProposalBackend {
    /// No proposal service; the pushed branch is the proposal
    #[default]
    None,
    /// Open a pull request with `gh pr create`
    Gh,
}

/// Identity recorded on commits written by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            name: "fixdoc".to_string(),
            email: "fixdoc@localhost".to_string(),
        }
    }
}

/// Git-backed document host
#[derive(Debug, Clone)]
pub struct GitHost {
    repo: PathBuf,
    remote: Option<String>,
    base_branch: String,
    proposal: ProposalBackend,
    gh_repo: Option<String>,
    author: Author,
    /// Held while fetching; concurrent fetches of one ref fail on its lock file
    refresh_lock: Arc<Mutex<()>>,
}

impl GitHost {
    /// Create a host for the repository at `repo`.
    ///
    /// `base_branch` is the branch proposals target. When `remote` is set,
    /// reads of the base branch go through its remote-tracking ref.
    pub fn new(repo: impl Into<PathBuf>, base_branch: &str, remote: Option<String>) -> Self {
        Self {
            repo: repo.into(),
            remote,
            base_branch: base_branch.to_string(),
            proposal: ProposalBackend::None,
            gh_repo: None,
            author: Author::default(),
            refresh_lock: Arc::default(),
        }
    }

    /// Select how proposals are opened; `gh_repo` is passed to `gh --repo`.
    pub fn with_proposals(mut self, proposal: ProposalBackend, gh_repo: Option<String>) -> Self {
        self.proposal = proposal;
        self.gh_repo = gh_repo;
        self
    }

    /// Set the identity used for commits.
    pub fn with_author(mut self, author: Author) -> Self {
        self.author = author;
        self
    }

    /// Repository directory.
    pub fn repo(&self) -> &Path {
        &self.repo
    }

    /// Ref to read for `branch`: the remote-tracking ref for the base branch
    /// when a remote is configured, the local branch otherwise.
    fn read_ref(&self, branch: &str) -> String {
        match &self.remote {
            Some(remote) if branch == self.base_branch => {
                format!("refs/remotes/{remote}/{branch}")
            }
            _ => format!("refs/heads/{branch}"),
        }
    }

    fn command(&self, args: &[&str], envs: &[(&str, OsString)]) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo).args(args);
        cmd.env("GIT_AUTHOR_NAME", &self.author.name)
            .env("GIT_AUTHOR_EMAIL", &self.author.email)
            .env("GIT_COMMITTER_NAME", &self.author.name)
            .env("GIT_COMMITTER_EMAIL", &self.author.email);
        for (key, value) in envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run git, returning the raw output whatever the exit status.
    fn run(&self, args: &[&str], stdin: Option<&str>, envs: &[(&str, OsString)]) -> Result<Output> {
        debug!("git {}", args.join(" "));
        let mut cmd = self.command(args, envs);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::upstream(SERVICE, format!("failed to run git: {e}")))?;
        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes())?;
        }
        child
            .wait_with_output()
            .map_err(|e| Error::upstream(SERVICE, format!("git {}: {e}", args.join(" "))))
    }

    /// Run git and return trimmed stdout, failing on a non-zero exit.
    fn git(&self, args: &[&str]) -> Result<String> {
        self.git_with(args, None, &[])
    }

    fn git_with(
        &self,
        args: &[&str],
        stdin: Option<&str>,
        envs: &[(&str, OsString)],
    ) -> Result<String> {
        let output = self.run(args, stdin, envs)?;
        if !output.status.success() {
            return Err(command_failed(args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Object id at `rev:path`, or `None` if nothing exists there.
    fn object_at(&self, rev: &str, path: &str) -> Result<Option<String>> {
        let spec = format!("{rev}:{path}");
        let output = self.run(&["rev-parse", "--verify", "--quiet", &spec], None, &[])?;
        if output.status.success() {
            Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
        } else {
            Ok(None)
        }
    }

    fn commit_of(&self, reference: &str) -> Result<String> {
        self.git(&["rev-parse", "--verify", &format!("{reference}^{{commit}}")])
    }

    /// File mode of `path` at `rev`, defaulting to a regular file.
    fn mode_at(&self, rev: &str, path: &str) -> Result<String> {
        let listing = self.git(&["ls-tree", rev, "--", path])?;
        Ok(listing
            .split_whitespace()
            .next()
            .filter(|mode| mode.starts_with("100"))
            .unwrap_or("100644")
            .to_string())
    }

    fn open_with_gh(&self, request: &ProposalRequest<'_>) -> Result<String> {
        let mut cmd = Command::new("gh");
        cmd.current_dir(&self.repo).args([
            "pr",
            "create",
            "--head",
            request.head,
            "--base",
            request.base,
            "--title",
            request.title,
            "--body",
            request.body,
        ]);
        if let Some(repo) = &self.gh_repo {
            cmd.args(["--repo", repo]);
        }
        let output = cmd
            .output()
            .map_err(|e| Error::upstream("proposal service", format!("failed to run gh: {e}")))?;
        if !output.status.success() {
            return Err(Error::upstream(
                "proposal service",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

fn command_failed(args: &[&str], output: &Output) -> Error {
    let stderr = String::from_utf8_lossy(&output.stderr);
    Error::upstream(
        SERVICE,
        format!("git {} failed: {}", args.join(" "), stderr.trim()),
    )
}

fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

impl DocumentHost for GitHost {
    fn refresh(&self, branch: &str) -> Result<()> {
        let Some(remote) = &self.remote else {
            return Ok(());
        };
        let refspec = format!("+refs/heads/{branch}:refs/remotes/{remote}/{branch}");
        let _fetching = self.refresh_lock.lock().unwrap_or_else(|p| p.into_inner());
        self.git(&["fetch", "--quiet", remote, &refspec])?;
        Ok(())
    }

    fn read_file(&self, path: &str, branch: &str) -> Result<RemoteFile> {
        let path = path.trim_matches('/');
        let rev = self.read_ref(branch);
        let not_found = || Error::NotFound {
            path: path.to_string(),
            tried: vec![format!("{branch}:{path}")],
        };

        let token = self.object_at(&rev, path)?.ok_or_else(not_found)?;
        if self.git(&["cat-file", "-t", &token])? != "blob" {
            return Err(not_found());
        }

        let output = self.run(&["cat-file", "blob", &token], None, &[])?;
        if !output.status.success() {
            return Err(command_failed(&["cat-file", "blob", &token], &output));
        }
        let content = String::from_utf8(output.stdout)
            .map_err(|_| Error::invalid_input(format!("{path} is not valid UTF-8")))?;

        Ok(RemoteFile { content, token })
    }

    fn list_dir(&self, path: &str, branch: &str) -> Result<Vec<DirEntry>> {
        let dir = path.trim_matches('/');
        let rev = self.read_ref(branch);
        let treeish = if dir.is_empty() {
            rev
        } else {
            format!("{rev}:{dir}")
        };

        let output = self.run(&["ls-tree", "-z", &treeish], None, &[])?;
        if !output.status.success() {
            return Err(Error::NotFound {
                path: dir.to_string(),
                tried: vec![treeish],
            });
        }

        // Entries are "<mode> SP <type> SP <object> TAB <name>" separated by NUL
        let stdout = String::from_utf8_lossy(&output.stdout);
        let entries = stdout
            .split('\0')
            .filter_map(|record| {
                let (meta, name) = record.split_once('\t')?;
                let kind = match meta.split_whitespace().nth(1)? {
                    "blob" => EntryKind::File,
                    "tree" => EntryKind::Dir,
                    _ => return None,
                };
                Some(DirEntry {
                    path: join_path(dir, name),
                    kind,
                })
            })
            .collect();
        Ok(entries)
    }

    fn branch_tip(&self, branch: &str) -> Result<String> {
        self.commit_of(&self.read_ref(branch))
    }

    fn create_branch(&self, name: &str, tip: &str) -> Result<()> {
        let reference = format!("refs/heads/{name}");
        let args = ["update-ref", reference.as_str(), tip, ""];
        let output = self.run(&args, None, &[])?;
        if output.status.success() {
            info!("Created branch {} at {}", name, tip);
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("already exists") {
            return Err(Error::Conflict {
                path: String::new(),
                branch: name.to_string(),
                message: "branch already exists".to_string(),
            });
        }
        Err(command_failed(&args, &output))
    }

    fn write_file(&self, request: &WriteRequest<'_>) -> Result<()> {
        let path = request.path.trim_matches('/');
        let reference = format!("refs/heads/{}", request.branch);
        let conflict = |message: String| Error::Conflict {
            path: path.to_string(),
            branch: request.branch.to_string(),
            message,
        };

        let old_tip = self.commit_of(&reference)?;
        let current = self.object_at(&old_tip, path)?;
        if current.as_deref() != Some(request.token) {
            return Err(conflict(format!(
                "expected blob {}, found {}",
                request.token,
                current.as_deref().unwrap_or("nothing")
            )));
        }

        let mode = self.mode_at(&old_tip, path)?;
        let blob = self.git_with(
            &["hash-object", "-w", "--stdin"],
            Some(request.content),
            &[],
        )?;

        // Build the new tree on a scratch index so no working tree is needed
        let scratch = tempfile::tempdir()?;
        let index: OsString = scratch.path().join("index").into_os_string();
        let envs = [("GIT_INDEX_FILE", index)];
        self.git_with(&["read-tree", &old_tip], None, &envs)?;
        let cacheinfo = format!("{mode},{blob},{path}");
        self.git_with(
            &["update-index", "--add", "--cacheinfo", &cacheinfo],
            None,
            &envs,
        )?;
        let tree = self.git_with(&["write-tree"], None, &envs)?;

        let commit = self.git(&["commit-tree", &tree, "-p", &old_tip, "-m", request.message])?;

        let args = [
            "update-ref",
            "-m",
            request.message,
            reference.as_str(),
            commit.as_str(),
            old_tip.as_str(),
        ];
        let output = self.run(&args, None, &[])?;
        if !output.status.success() {
            return Err(conflict(format!(
                "branch moved while writing: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        info!("Committed {} to {} as {}", path, request.branch, commit);
        Ok(())
    }

    fn open_proposal(&self, request: &ProposalRequest<'_>) -> Result<String> {
        if let Some(remote) = &self.remote {
            let refspec = format!("refs/heads/{0}:refs/heads/{0}", request.head);
            self.git(&["push", "--quiet", remote, &refspec])?;
            info!("Pushed {} to {}", request.head, remote);
        }

        match self.proposal {
            ProposalBackend::Gh => self.open_with_gh(request),
            ProposalBackend::None => Ok(match &self.remote {
                Some(remote) => format!("{remote}/{}", request.head),
                None => format!("refs/heads/{}", request.head),
            }),
        }
    }
}
