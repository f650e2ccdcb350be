//! # Request Pipeline
//!
//! Sequences the stages of a change request:
//!
//! 1. normalize the raw path,
//! 2. locate and read the document,
//! 3. select the target section,
//! 4. ask the content generator for a replacement,
//! 5. splice the replacement in,
//! 6. publish the patched document as a change proposal.
//!
//! [`Pipeline::run`] returns the first stage error unchanged.
//! [`Pipeline::handle`] is the single boundary where errors are caught: the
//! outcome or the error's short message is delivered through the request's
//! callback, and nothing propagates further.
//!
//! [`Dispatcher`] acknowledges inbound commands immediately and runs
//! `handle` on a bounded worker pool.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};

use log::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result, INTERNAL_FAILURE};
use crate::generate::{ContentGenerator, PromptContext, PromptTemplate};
use crate::host::DocumentHost;
use crate::locator::{DocumentLocator, MarkdownDocument};
use crate::notify::Notifier;
use crate::patch::{prepare_replacement, splice_range, SectionPatcher};
use crate::path::normalize;
use crate::publish::{ChangeContext, Publisher};
use crate::request::{Indicator, Request};
use crate::section::{SectionLocator, SectionTarget};

/// Usage text returned for malformed commands
pub const USAGE: &str = "Usage: /fixdoc <document path> <what is wrong>, \
for example: /fixdoc /widgets/button `## Sizing` the pixel example is wrong";

/// A patched document that has not been published
#[derive(Debug, Clone)]
pub struct Draft {
    pub document: MarkdownDocument,
    pub target: SectionTarget,
    pub patched: String,
}

impl Draft {
    pub fn is_unchanged(&self) -> bool {
        self.patched == self.document.content
    }
}

/// How a request ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Published {
        path: String,
        stored_path: String,
        branch: String,
        location: String,
    },
    /// The suggestion matched the current text; nothing was published
    Unchanged { path: String },
}

impl Outcome {
    /// Text delivered through the callback.
    pub fn message(&self) -> String {
        match self {
            Outcome::Published { path, location, .. } => {
                format!("I opened a change for `{path}`: {location}")
            }
            Outcome::Unchanged { path } => {
                format!("`{path}` already says what was suggested, so nothing was changed.")
            }
        }
    }
}

/// The orchestrator
pub struct Pipeline {
    host: Arc<dyn DocumentHost>,
    base_branch: String,
    locator: DocumentLocator,
    sections: SectionLocator,
    patcher: SectionPatcher,
    publisher: Publisher,
    generator: Arc<dyn ContentGenerator>,
    notifier: Arc<dyn Notifier>,
    prompt: PromptTemplate,
}

impl Pipeline {
    /// Wire the stages from configuration and the external collaborators.
    pub fn new(
        config: &Config,
        host: Arc<dyn DocumentHost>,
        generator: Arc<dyn ContentGenerator>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let prompt = match &config.generator.prompt_template {
            Some(path) => PromptTemplate::load(path)?,
            None => PromptTemplate::default(),
        };
        Ok(Self {
            locator: DocumentLocator::new(
                Arc::clone(&host),
                &config.docs_root,
                &config.base_branch,
                config.resolver()?,
            ),
            sections: SectionLocator::new(config.section.mode, config.section.depth),
            patcher: SectionPatcher::new(config.splice),
            publisher: Publisher::new(
                Arc::clone(&host),
                &config.base_branch,
                &config.branch_prefix,
            ),
            host,
            base_branch: config.base_branch.clone(),
            generator,
            notifier,
            prompt,
        })
    }

    /// Normalize `raw_path` and read the document it names.
    pub fn resolve(&self, raw_path: &str) -> Result<MarkdownDocument> {
        let canonical = normalize(raw_path)?;
        debug!("Normalized '{}' to {}", raw_path, canonical);
        self.locator.locate(&canonical)
    }

    /// Select the section of `document` that `indicator` targets.
    pub fn target(
        &self,
        document: &MarkdownDocument,
        indicator: Option<&Indicator>,
    ) -> Result<SectionTarget> {
        self.sections
            .locate(document.canonical.as_str(), &document.content, indicator)
    }

    /// Run every stage up to, but not including, publishing.
    pub fn draft(&self, request: &Request) -> Result<Draft> {
        self.host.refresh(&self.base_branch)?;

        let document = self.resolve(&request.raw_path)?;
        let target = self.target(&document, request.indicator().as_ref())?;

        let instruction = self.prompt.render(&PromptContext {
            path: document.canonical.as_str(),
            issue: &request.issue,
            heading: target.heading().unwrap_or_default(),
            user: &request.username,
        });
        let range = self.patcher.source_range(
            document.canonical.as_str(),
            &document.content,
            &target,
        )?;
        let generated = self
            .generator
            .generate(&instruction, &document.content[range.clone()])?;
        let replacement = prepare_replacement(&generated)?;

        let patched = splice_range(&document.content, range, &replacement);
        Ok(Draft {
            document,
            target,
            patched,
        })
    }

    /// Run a request to completion, returning the first stage error.
    pub fn run(&self, request: &Request) -> Result<Outcome> {
        let draft = self.draft(request)?;
        let path = draft.document.canonical.to_string();

        if draft.is_unchanged() {
            info!("Suggestion for {} changes nothing, not publishing", path);
            return Ok(Outcome::Unchanged { path });
        }

        let publication = self.publisher.publish(
            &draft.document,
            &draft.patched,
            &ChangeContext {
                user: &request.username,
                issue: &request.issue,
                heading: draft.target.heading(),
            },
        )?;
        Ok(Outcome::Published {
            path,
            stored_path: draft.document.stored_path,
            branch: publication.branch,
            location: publication.location,
        })
    }

    /// Run a request and report its outcome through the callback.
    ///
    /// Never fails: stage errors become the callback message, a panic in any
    /// stage is logged and reported with a generic message, and a failed
    /// delivery is logged.
    pub fn handle(&self, request: &Request) {
        let message = match panic::catch_unwind(AssertUnwindSafe(|| self.run(request))) {
            Ok(Ok(outcome)) => {
                info!("Request from {} for {} done", request.username, request.raw_path);
                outcome.message()
            }
            Ok(Err(e)) => {
                error!(
                    "Request from {} for {} failed: {}",
                    request.username, request.raw_path, e
                );
                e.user_message()
            }
            Err(payload) => {
                error!(
                    "Request from {} for {} panicked: {}",
                    request.username,
                    request.raw_path,
                    panic_text(payload.as_ref())
                );
                INTERNAL_FAILURE.to_string()
            }
        };

        if let Err(e) = self.notifier.notify(&request.callback, &message) {
            warn!("Could not notify {}: {}", request.username, e);
        }
    }
}

fn panic_text(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Count of queued and running tasks, waitable until zero
#[derive(Debug, Default)]
struct Pending {
    count: Mutex<usize>,
    idle: Condvar,
}

impl Pending {
    fn add(&self) {
        *self.count.lock().unwrap_or_else(|p| p.into_inner()) += 1;
    }

    fn done(&self) {
        let mut count = self.count.lock().unwrap_or_else(|p| p.into_inner());
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn get(&self) -> usize {
        *self.count.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn wait_idle(&self) {
        let mut count = self.count.lock().unwrap_or_else(|p| p.into_inner());
        while *count > 0 {
            count = self.idle.wait(count).unwrap_or_else(|p| p.into_inner());
        }
    }
}

/// Marks a task finished when its closure exits
struct DoneGuard(Arc<Pending>);

impl Drop for DoneGuard {
    fn drop(&mut self) {
        self.0.done();
    }
}

/// Hands accepted requests to a fixed-size worker pool
pub struct Dispatcher {
    pipeline: Arc<Pipeline>,
    pool: rayon::ThreadPool,
    pending: Arc<Pending>,
}

impl Dispatcher {
    pub fn new(pipeline: Arc<Pipeline>, workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("fixdoc-worker-{i}"))
            .build()
            .map_err(|e| Error::invalid_input(format!("cannot start worker pool: {e}")))?;
        Ok(Self {
            pipeline,
            pool,
            pending: Arc::new(Pending::default()),
        })
    }

    /// Accept a slash command and schedule it, returning the acknowledgment.
    ///
    /// Returns immediately; the request runs in the background.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for blank command text, in which case
    /// nothing is scheduled.
    pub fn submit(&self, text: &str, user: &str, callback: &str) -> Result<String> {
        let request = Request::from_command(text, user, callback)?;
        info!("[{}] submitted: {}", request.username, text.trim());

        let ack = format!(
            "✅ Thanks <@{}>! We'll fix: *{}*",
            request.username,
            text.trim()
        );

        self.pending.add();
        let guard = DoneGuard(Arc::clone(&self.pending));
        let pipeline = Arc::clone(&self.pipeline);
        self.pool.spawn(move || {
            let _guard = guard;
            pipeline.handle(&request);
        });
        Ok(ack)
    }

    /// Number of requests queued or running.
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Block until every submitted request has finished.
    pub fn wait_idle(&self) {
        self.pending.wait_idle();
    }
}
