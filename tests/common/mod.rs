//! Shared test utilities for integration and E2E tests.
//!
//! This module provides common fixtures and helper functions to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_docs_repo(&[("docs/widgets/button.md", "# Button\n")])
//!         .with_config(configs::MINIMAL);
//!     fixture.command().args(["locate", "/widgets/button"]).assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::docs;
    pub use super::TestFixture;
}

/// Common configuration YAML snippets for testing.
///
/// Every snippet points `host.repo` at the `repo` directory created by
/// [`TestFixture::with_docs_repo`].
#[allow(dead_code)]
pub mod configs {
    /// Probe resolution, strict sections.
    pub const MINIMAL: &str = r#"
docs_root: docs
base_branch: main
host:
  repo: repo
"#;

    /// Fuzzy resolution against the corpus index.
    pub const FUZZY: &str = r#"
docs_root: docs
base_branch: main
resolution:
  strategy: fuzzy
  threshold: 0.5
  exclude: ["drafts/**"]
host:
  repo: repo
"#;

    /// Permissive section matching.
    pub const PERMISSIVE: &str = r#"
docs_root: docs
base_branch: main
section:
  mode: permissive
host:
  repo: repo
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "docs_root: [unclosed";

    /// Well-formed YAML with an out-of-range value.
    pub const INVALID_DEPTH: &str = r#"
section:
  depth: 9
host:
  repo: repo
"#;

    /// Unknown top-level key.
    pub const UNKNOWN_KEY: &str = r#"
docs_root: docs
colour: blue
"#;
}

/// Markdown documents shared by the tests.
#[allow(dead_code)]
pub mod docs {
    pub const BUTTON: &str = "# Button\n\
\n\
Buttons trigger actions.\n\
\n\
### Sizing\n\
\n\
Use the `size` prop with a pixel value.\n\
\n\
### Colors\n\
\n\
Use theme tokens.\n";

    pub const INSTALL: &str = "# Installation\n\
\n\
## Requirements\n\
\n\
Node 16 or newer.\n\
\n\
## Steps\n\
\n\
Run the installer.\n";
}

/// A test fixture that provides a temporary directory with optional config
/// and a git repository of documents.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_docs_repo(&[("docs/widgets/button.md", docs::BUTTON)])
///     .with_config(configs::MINIMAL);
///
/// fixture
///     .command()
///     .args(["locate", "/widgets/button"])
///     .assert()
///     .success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `fixdoc.yaml` configuration file with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child("fixdoc.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Create a git repository at `repo/` whose `main` branch holds `files`.
    #[allow(dead_code)]
    pub fn with_docs_repo(self, files: &[(&str, &str)]) -> Self {
        let repo = self.repo_path();
        std::fs::create_dir_all(&repo).expect("Failed to create repo directory");
        self.git(&["init", "--quiet"]);
        self.git(&["symbolic-ref", "HEAD", "refs/heads/main"]);
        for (path, content) in files {
            self.temp_dir
                .child("repo")
                .child(path)
                .write_str(content)
                .expect("Failed to write document");
        }
        self.git(&["add", "--all"]);
        self.git(&["commit", "--quiet", "-m", "Initial documents"]);
        self
    }

    /// Run git inside `repo/` and return its trimmed stdout.
    #[allow(dead_code)]
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.repo_path())
            .env("GIT_AUTHOR_NAME", "Test")
            .env("GIT_AUTHOR_EMAIL", "test@example.com")
            .env("GIT_COMMITTER_NAME", "Test")
            .env("GIT_COMMITTER_EMAIL", "test@example.com")
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the config file.
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("fixdoc.yaml")
    }

    /// Get the path to the documents repository.
    pub fn repo_path(&self) -> PathBuf {
        self.temp_dir.path().join("repo")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Create a command configured to run in this fixture's directory.
    ///
    /// The platform config directory is pointed into the fixture so a config
    /// on the developer's machine is never picked up.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("fixdoc");
        cmd.current_dir(self.path())
            .env_remove("FIXDOC_CONFIG")
            .env_remove("PORT")
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env("NO_COLOR", "1");
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_config() {
        let fixture = TestFixture::new().with_config("docs_root: docs");
        assert!(fixture.config_path().exists());
    }

    #[test]
    fn test_configs_are_valid_yaml() {
        let configs = [
            configs::MINIMAL,
            configs::FUZZY,
            configs::PERMISSIVE,
            configs::INVALID_DEPTH,
            configs::UNKNOWN_KEY,
        ];

        for config in configs {
            serde_yaml::from_str::<serde_yaml::Value>(config).expect("Config should be valid YAML");
        }
    }

    #[test]
    fn test_invalid_yaml_is_actually_invalid() {
        let result = serde_yaml::from_str::<serde_yaml::Value>(configs::INVALID_YAML);
        assert!(result.is_err(), "INVALID_YAML should not parse");
    }
}
