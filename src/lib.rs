//! # fixdoc
//!
//! This library turns a free-text documentation change request ("document
//! path" + "issue description") into a scoped edit of a markdown document and
//! an automated change proposal. It is used by the `fixdoc` command-line tool
//! and server but can be embedded anywhere a request can be delivered.
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//! use fixdoc::config;
//! use fixdoc::generate::FixedGenerator;
//! use fixdoc::host::MemoryHost;
//! use fixdoc::notify::Notifier;
//! use fixdoc::pipeline::{Outcome, Pipeline};
//! use fixdoc::request::Request;
//!
//! struct Quiet;
//! impl Notifier for Quiet {
//!     fn notify(&self, _callback: &str, _text: &str) -> fixdoc::error::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let host = Arc::new(MemoryHost::new("main").with_file(
//!     "main",
//!     "docs/widgets/button.md",
//!     "# Button\n\n### Sizing\n\nUse px.\n",
//! ));
//! let pipeline = Pipeline::new(
//!     &config::parse("").unwrap(),
//!     host.clone(),
//!     Arc::new(FixedGenerator("### Sizing\n\nUse rem.".to_string())),
//!     Arc::new(Quiet),
//! )
//! .unwrap();
//!
//! let request = Request::from_command("/widgets/button `Sizing` wrong unit", "alice", "").unwrap();
//! let outcome = pipeline.run(&request).unwrap();
//! assert!(matches!(outcome, Outcome::Published { .. }));
//! assert_eq!(host.proposals().len(), 1);
//! ```
//!
//! ## Core Concepts
//!
//! - **Requests (`request`)**: command text split into path and issue, and the
//!   backtick-quoted section indicator.
//! - **Paths (`path`)**: canonical, extensionless document identifiers.
//! - **Location (`corpus`, `locator`)**: resolving a canonical path to a
//!   stored file, by probing or by fuzzy match against the corpus index.
//! - **Sections (`section`, `patch`)**: finding the heading-delimited block a
//!   request targets and splicing a replacement into it.
//! - **Collaborators (`host`, `generate`, `notify`)**: the document host, the
//!   content generator and the callback channel, each behind a trait.
//! - **Orchestration (`publish`, `pipeline`, `server`)**: publishing the
//!   patched document and running requests in the background.
//!
//! ## Execution Flow
//!
//! 1. **Normalize** the raw path.
//! 2. **Locate** and read the document.
//! 3. **Select** the target section.
//! 4. **Generate** replacement text.
//! 5. **Patch** the document.
//! 6. **Publish** a branch, commit and change proposal.
//! 7. **Notify** the requester through the callback.

pub mod config;
pub mod corpus;
pub mod defaults;
pub mod error;
pub mod generate;
pub mod host;
pub mod locator;
pub mod notify;
pub mod output;
pub mod patch;
pub mod path;
pub mod pipeline;
pub mod publish;
pub mod request;
pub mod section;
pub mod server;
pub mod suggestions;

#[cfg(test)]
mod path_proptest;
