//! Change proposal publishing
//!
//! Publishing is an ordered sequence of host mutations with no rollback:
//! read the base tip, create a uniquely named branch from it, write the
//! patched document with the token read at fetch time, open a proposal. A
//! failing step stops the sequence; a branch left behind by a later failure is
//! cleaned up out of band.

use std::sync::Arc;

use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::error::Result;
use crate::host::{DocumentHost, ProposalRequest, WriteRequest};
use crate::locator::MarkdownDocument;
use crate::path::CanonicalPath;

const MAX_SLUG_LEN: usize = 40;

/// Result of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub branch: String,
    /// User-facing location of the proposal
    pub location: String,
}

/// Who asked for a change and why
#[derive(Debug, Clone, Copy)]
pub struct ChangeContext<'a> {
    pub user: &'a str,
    pub issue: &'a str,
    /// Heading of the edited section, if a section was targeted
    pub heading: Option<&'a str>,
}

/// Publishes patched documents as branch + commit + proposal
pub struct Publisher {
    host: Arc<dyn DocumentHost>,
    base_branch: String,
    branch_prefix: String,
}

/// Branch-name-safe slug of a canonical path (`/Widgets/Big Button` →
/// `widgets-big-button`).
pub fn slug(path: &CanonicalPath) -> String {
    let mut slug = String::new();
    for c in path.as_str().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let mut slug = slug.trim_end_matches('-').to_string();
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        slug = slug.trim_end_matches('-').to_string();
    }
    if slug.is_empty() {
        "doc".to_string()
    } else {
        slug
    }
}

impl Publisher {
    pub fn new(host: Arc<dyn DocumentHost>, base_branch: &str, branch_prefix: &str) -> Self {
        Self {
            host,
            base_branch: base_branch.to_string(),
            branch_prefix: branch_prefix.trim_matches('/').to_string(),
        }
    }

    /// A fresh, unique branch name for a change to `path`.
    pub fn branch_name(&self, path: &CanonicalPath) -> String {
        let stamp = Utc::now().format("%Y%m%d%H%M%S");
        let unique = Uuid::new_v4().simple().to_string();
        let name = format!("{}-{}-{}", slug(path), stamp, &unique[..8]);
        if self.branch_prefix.is_empty() {
            name
        } else {
            format!("{}/{}", self.branch_prefix, name)
        }
    }

    /// Publish `patched` as a new version of `document`.
    ///
    /// # Errors
    ///
    /// Host errors are returned unchanged. A stale token surfaces as
    /// `Error::Conflict` from the write step, and no proposal is opened.
    pub fn publish(
        &self,
        document: &MarkdownDocument,
        patched: &str,
        change: &ChangeContext<'_>,
    ) -> Result<Publication> {
        let tip = self.host.branch_tip(&self.base_branch)?;
        let branch = self.branch_name(&document.canonical);
        self.host.create_branch(&branch, &tip)?;
        info!("Created {} from {} at {}", branch, self.base_branch, tip);

        let target = change.heading.unwrap_or("document");
        let message = format!(
            "docs: fix {} in {}\n\nRequested by {}.",
            target, document.stored_path, change.user
        );
        self.host.write_file(&WriteRequest {
            path: &document.stored_path,
            branch: &branch,
            content: patched,
            message: &message,
            token: &document.token,
        })?;

        let title = match change.heading {
            Some(heading) => format!("Fix {} in {}", heading, document.canonical),
            None => format!("Fix {}", document.canonical),
        };
        let body = format!(
            "Requested by @{} for `{}`.\n\n> {}\n",
            change.user,
            document.stored_path,
            change.issue.replace('\n', "\n> ")
        );
        let location = self.host.open_proposal(&ProposalRequest {
            head: &branch,
            base: &self.base_branch,
            title: &title,
            body: &body,
        })?;
        info!("Opened proposal for {} at {}", document.canonical, location);

        Ok(Publication { branch, location })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::host::MemoryHost;
    use crate::path::normalize;

    fn document(host: &MemoryHost) -> MarkdownDocument {
        let file = host.read_file("docs/widgets/button.md", "main").unwrap();
        MarkdownDocument {
            canonical: normalize("/widgets/button").unwrap(),
            stored_path: "docs/widgets/button.md".to_string(),
            content: file.content,
            token: file.token,
        }
    }

    fn change() -> ChangeContext<'static> {
        ChangeContext {
            user: "alice",
            issue: "wrong unit",
            heading: Some("Sizing"),
        }
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug(&normalize("/Widgets/Big  Button").unwrap()), "widgets-big-button");
        assert_eq!(slug(&normalize("/ünïcode").unwrap()), "n-code");
        assert_eq!(slug(&normalize("/…").unwrap()), "doc");
        let long = normalize(&format!("/{}", "a-".repeat(40))).unwrap();
        assert!(slug(&long).len() <= MAX_SLUG_LEN);
        assert!(!slug(&long).ends_with('-'));
    }

    #[test]
    fn test_branch_names_are_unique() {
        let host: Arc<dyn DocumentHost> = Arc::new(MemoryHost::new("main"));
        let publisher = Publisher::new(host, "main", "fixdoc/");
        let path = normalize("/widgets/button").unwrap();
        let a = publisher.branch_name(&path);
        let b = publisher.branch_name(&path);
        assert!(a.starts_with("fixdoc/widgets-button-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_publish_creates_branch_commit_and_proposal() {
        let host = Arc::new(
            MemoryHost::new("main").with_file("main", "docs/widgets/button.md", "# Button\n"),
        );
        let publisher = Publisher::new(host.clone(), "main", "fixdoc");
        let document = document(&host);

        let publication = publisher
            .publish(&document, "# Button\n\nFixed.\n", &change())
            .unwrap();

        assert_eq!(
            host.file(&publication.branch, "docs/widgets/button.md").as_deref(),
            Some("# Button\n\nFixed.\n")
        );
        assert_eq!(
            host.file("main", "docs/widgets/button.md").as_deref(),
            Some("# Button\n")
        );
        let proposals = host.proposals();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].title, "Fix Sizing in /widgets/button");
        assert!(proposals[0].body.contains("@alice"));
        assert_eq!(publication.location, "memory://proposals/1");
    }

    #[test]
    fn test_stale_token_conflicts_without_proposal() {
        let host = Arc::new(
            MemoryHost::new("main").with_file("main", "docs/widgets/button.md", "# Button\n"),
        );
        let publisher = Publisher::new(host.clone(), "main", "fixdoc");
        let document = document(&host);
        host.commit_file("main", "docs/widgets/button.md", "# Button\n\nEdited upstream.\n");

        let result = publisher.publish(&document, "# Button\n\nFixed.\n", &change());
        assert!(matches!(result, Err(Error::Conflict { .. })));
        assert!(host.proposals().is_empty());
    }
}
