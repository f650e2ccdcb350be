//! Whole-pipeline scenarios against the in-memory document host.
//!
//! The content generator is replaced by fixed text, so each scenario checks
//! resolution, section selection, splicing and publishing end to end without
//! any network access.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fixdoc::config::{self, Config};
use fixdoc::error::{Error, Result};
use fixdoc::generate::{ContentGenerator, FixedGenerator};
use fixdoc::host::{DirEntry, DocumentHost, MemoryHost, ProposalRequest, RemoteFile, WriteRequest};
use fixdoc::notify::Notifier;
use fixdoc::pipeline::{Dispatcher, Outcome, Pipeline};
use fixdoc::request::Request;
use fixdoc::section::SectionTarget;

const BUTTON: &str = r#"# Button

Buttons trigger actions.

## Sizing

Set `size` to a pixel value like `16px`.

```jsx
<Button size="16px" />
```

## Colors

Use theme tokens.
"#;

const SIZING_FIX: &str = r#"## Sizing

Set `size` to a rem value like `1rem`.

```jsx
<Button size="1rem" />
```"#;

#[derive(Default)]
struct Recorder(Mutex<Vec<(String, String)>>);

impl Notifier for Recorder {
    fn notify(&self, callback: &str, text: &str) -> Result<()> {
        self.0
            .lock()
            .unwrap()
            .push((callback.to_string(), text.to_string()));
        Ok(())
    }
}

/// Records the instruction and source it was asked about.
struct Capturing {
    reply: String,
    seen: Mutex<Vec<(String, String)>>,
}

impl ContentGenerator for Capturing {
    fn generate(&self, instruction: &str, source: &str) -> Result<String> {
        self.seen
            .lock()
            .unwrap()
            .push((instruction.to_string(), source.to_string()));
        Ok(self.reply.clone())
    }
}

fn button_host() -> Arc<MemoryHost> {
    Arc::new(
        MemoryHost::new("main")
            .with_file("main", "docs/widgets/button.md", BUTTON)
            .with_file("main", "docs/index.md", "# Home\n"),
    )
}

fn pipeline_with(
    config: &Config,
    host: Arc<dyn DocumentHost>,
    generator: Arc<dyn ContentGenerator>,
) -> Pipeline {
    Pipeline::new(config, host, generator, Arc::new(Recorder::default())).unwrap()
}

fn fixed(text: &str) -> Arc<dyn ContentGenerator> {
    Arc::new(FixedGenerator(text.to_string()))
}

#[test]
fn test_request_without_indicator_strict_mode_stops() {
    let host = button_host();
    let pipeline = pipeline_with(&config::parse("").unwrap(), host.clone(), fixed("# Button\n"));
    let request = Request::from_command("/widgets/button How do I resize it?", "alice", "").unwrap();

    // The document itself resolves
    let document = pipeline.resolve(&request.raw_path).unwrap();
    assert_eq!(document.stored_path, "docs/widgets/button.md");

    assert!(matches!(
        pipeline.run(&request),
        Err(Error::SectionNotFound { ref indicator, .. }) if indicator.is_empty()
    ));
    assert!(host.proposals().is_empty());
    assert_eq!(host.branches(), vec!["main".to_string()]);
}

#[test]
fn test_request_without_indicator_permissive_mode_edits_whole_document() {
    let host = button_host();
    let config = config::parse("section:\n  mode: permissive\n").unwrap();
    let generator = Arc::new(Capturing {
        reply: "# Button\n\nButtons trigger actions. Resize them with `size`.\n".to_string(),
        seen: Mutex::default(),
    });
    let pipeline = pipeline_with(&config, host.clone(), generator.clone());
    let request = Request::from_command("/widgets/button How do I resize it?", "alice", "").unwrap();

    let draft = pipeline.draft(&request).unwrap();
    assert_eq!(draft.target, SectionTarget::WholeDocument);
    assert_eq!(
        draft.patched,
        "# Button\n\nButtons trigger actions. Resize them with `size`.\n"
    );

    let seen = generator.seen.lock().unwrap();
    assert_eq!(seen[0].1, BUTTON);
    assert!(seen[0].0.contains("How do I resize it?"));
    assert!(seen[0].0.contains("(whole document)"));
}

#[test]
fn test_patch_is_confined_to_selected_block() {
    let host = button_host();
    let pipeline = pipeline_with(&config::parse("").unwrap(), host.clone(), fixed(SIZING_FIX));
    let request = Request::from_command(
        "/widgets/button `## Sizing` - fix the pixel example",
        "alice",
        "",
    )
    .unwrap();

    let document = pipeline.resolve(&request.raw_path).unwrap();
    let target = pipeline
        .target(&document, request.indicator().as_ref())
        .unwrap();
    let range = target.range(&document.content);
    assert_eq!(target.heading(), Some("Sizing"));

    let Outcome::Published { branch, .. } = pipeline.run(&request).unwrap() else {
        panic!("expected a publication");
    };
    let patched = host.file(&branch, "docs/widgets/button.md").unwrap();

    assert_eq!(&patched[..range.start], &BUTTON[..range.start]);
    assert!(patched.ends_with(&BUTTON[range.end..]));

    insta::assert_snapshot!(patched, @r#"
    # Button

    Buttons trigger actions.

    ## Sizing

    Set `size` to a rem value like `1rem`.

    ```jsx
    <Button size="1rem" />
    ```

    ## Colors

    Use theme tokens.
    "#);
}

#[test]
fn test_fenced_suggestion_is_unwrapped() {
    let host = button_host();
    let fenced = "```markdown\n## Colors\n\nUse theme tokens only.\n```";
    let pipeline = pipeline_with(&config::parse("").unwrap(), host.clone(), fixed(fenced));
    let request =
        Request::from_command("/widgets/button `## Colors` be stricter", "bob", "").unwrap();

    let draft = pipeline.draft(&request).unwrap();
    assert!(draft.patched.ends_with("## Colors\n\nUse theme tokens only.\n"));
    assert!(!draft.patched.contains("```markdown"));
}

#[test]
fn test_proposal_describes_the_change() {
    let host = button_host();
    let pipeline = pipeline_with(&config::parse("").unwrap(), host.clone(), fixed(SIZING_FIX));
    let request =
        Request::from_command("/widgets/button `## Sizing` use rem", "alice", "").unwrap();

    pipeline.run(&request).unwrap();

    let proposals = host.proposals();
    assert_eq!(proposals.len(), 1);
    assert_eq!(proposals[0].base, "main");
    assert!(proposals[0].head.starts_with("fixdoc/widgets-button-"));
    assert!(proposals[0].title.contains("Sizing"));
    assert!(proposals[0].body.contains("alice"));
    assert!(proposals[0].body.contains("use rem"));
}

#[test]
fn test_concurrent_requests_get_distinct_branches() {
    let host = button_host();
    let notifier = Arc::new(Recorder::default());
    let pipeline = Arc::new(
        Pipeline::new(
            &config::parse("").unwrap(),
            host.clone(),
            fixed(SIZING_FIX),
            notifier.clone(),
        )
        .unwrap(),
    );
    let dispatcher = Dispatcher::new(pipeline, 2).unwrap();

    dispatcher
        .submit("/widgets/button `## Sizing` use rem", "alice", "https://cb/a")
        .unwrap();
    dispatcher
        .submit("/widgets/button `## Sizing` rem please", "bob", "https://cb/b")
        .unwrap();
    dispatcher.wait_idle();

    let branches: BTreeSet<String> = host.branches().into_iter().collect();
    assert_eq!(branches.len(), 3, "branches: {branches:?}");

    let proposals = host.proposals();
    assert_eq!(proposals.len(), 2);
    assert_ne!(proposals[0].head, proposals[1].head);

    let sent = notifier.0.lock().unwrap();
    assert_eq!(sent.len(), 2);
    for (_, message) in sent.iter() {
        assert!(message.starts_with("I opened a change"), "{message}");
    }
}

#[test]
fn test_concurrent_runs_on_threads() {
    let host = button_host();
    let pipeline = pipeline_with(&config::parse("").unwrap(), host.clone(), fixed(SIZING_FIX));
    let request =
        Request::from_command("/widgets/button `## Sizing` use rem", "alice", "").unwrap();

    let outcomes: Vec<Outcome> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| pipeline.run(&request).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let heads: BTreeSet<String> = outcomes
        .into_iter()
        .map(|outcome| match outcome {
            Outcome::Published { branch, .. } => branch,
            other => panic!("unexpected outcome {other:?}"),
        })
        .collect();
    assert_eq!(heads.len(), 4);
    assert_eq!(host.proposals().len(), 4);
}

/// Edits the document on the base branch between the read and the branch
/// creation of every request, as a concurrent writer would.
struct Racing {
    inner: MemoryHost,
    edits: AtomicUsize,
}

impl DocumentHost for Racing {
    fn read_file(&self, path: &str, branch: &str) -> Result<RemoteFile> {
        self.inner.read_file(path, branch)
    }

    fn list_dir(&self, path: &str, branch: &str) -> Result<Vec<DirEntry>> {
        self.inner.list_dir(path, branch)
    }

    fn branch_tip(&self, branch: &str) -> Result<String> {
        let edit = self.edits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit_file(
            branch,
            "docs/widgets/button.md",
            &format!("{BUTTON}\n<!-- edit {edit} -->\n"),
        );
        self.inner.branch_tip(branch)
    }

    fn create_branch(&self, name: &str, tip: &str) -> Result<()> {
        self.inner.create_branch(name, tip)
    }

    fn write_file(&self, request: &WriteRequest<'_>) -> Result<()> {
        self.inner.write_file(request)
    }

    fn open_proposal(&self, request: &ProposalRequest<'_>) -> Result<String> {
        self.inner.open_proposal(request)
    }
}

#[test]
fn test_stale_document_conflicts_without_proposal() {
    let host = Arc::new(Racing {
        inner: MemoryHost::new("main").with_file("main", "docs/widgets/button.md", BUTTON),
        edits: AtomicUsize::new(0),
    });
    let notifier = Arc::new(Recorder::default());
    let pipeline = Pipeline::new(
        &config::parse("").unwrap(),
        host.clone(),
        fixed(SIZING_FIX),
        notifier.clone(),
    )
    .unwrap();
    let request =
        Request::from_command("/widgets/button `## Sizing` use rem", "alice", "https://cb/c")
            .unwrap();

    assert!(matches!(pipeline.run(&request), Err(Error::Conflict { .. })));
    assert!(host.inner.proposals().is_empty());

    // Reported once through the callback
    pipeline.handle(&request);
    let sent = notifier.0.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("changed while I was editing it"));
    assert!(host.inner.proposals().is_empty());
}

#[test]
fn test_fuzzy_resolution_finds_near_miss() {
    let host = button_host();
    let config = config::parse("resolution:\n  strategy: fuzzy\n").unwrap();
    let pipeline = pipeline_with(&config, host, fixed(SIZING_FIX));

    let document = pipeline.resolve("https://docs.example.com/widget/buttons").unwrap();
    assert_eq!(document.stored_path, "docs/widgets/button.md");

    assert!(matches!(
        pipeline.resolve("/completely/unrelated/page"),
        Err(Error::NoCloseMatch { .. })
    ));
}

const NESTED: &str = "# Button\n\n## Sizing\n\nUse `px`.\n\n### Limits\n\nMax 100.\n\n## Props\n\nNone.\n";

/// Answers with the source text it was given, unchanged.
struct Echo;

impl ContentGenerator for Echo {
    fn generate(&self, _instruction: &str, source: &str) -> Result<String> {
        Ok(source.to_string())
    }
}

#[test]
fn test_heading_line_splice_keeps_subsections_once() {
    let host = Arc::new(MemoryHost::new("main").with_file("main", "docs/widgets/button.md", NESTED));
    let config = config::parse("splice: heading-line\n").unwrap();
    let generator = Arc::new(Capturing {
        reply: "## Sizing\n\nUse `rem`.".to_string(),
        seen: Mutex::default(),
    });
    let pipeline = pipeline_with(&config, host.clone(), generator.clone());
    let request =
        Request::from_command("/widgets/button `## Sizing` use rem", "alice", "").unwrap();

    let draft = pipeline.draft(&request).unwrap();
    assert_eq!(generator.seen.lock().unwrap()[0].1, "## Sizing\n\nUse `px`.\n\n");
    assert_eq!(
        draft.patched,
        "# Button\n\n## Sizing\n\nUse `rem`.\n\n### Limits\n\nMax 100.\n\n## Props\n\nNone.\n"
    );
    assert_eq!(draft.patched.matches("### Limits").count(), 1);
}

#[test]
fn test_heading_line_echo_is_unchanged() {
    let host = Arc::new(MemoryHost::new("main").with_file("main", "docs/widgets/button.md", NESTED));
    let config = config::parse("splice: heading-line\n").unwrap();
    let pipeline = pipeline_with(&config, host.clone(), Arc::new(Echo));
    let request =
        Request::from_command("/widgets/button `## Sizing` tidy up", "alice", "").unwrap();

    assert!(matches!(
        pipeline.run(&request).unwrap(),
        Outcome::Unchanged { .. }
    ));
    assert!(host.proposals().is_empty());
}

/// Panics on the first call, then answers normally.
struct PanicsOnce {
    calls: AtomicUsize,
}

impl ContentGenerator for PanicsOnce {
    fn generate(&self, _instruction: &str, _source: &str) -> Result<String> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("generator blew up");
        }
        Ok(SIZING_FIX.to_string())
    }
}

#[test]
fn test_panicking_request_is_reported_and_workers_survive() {
    let host = button_host();
    let notifier = Arc::new(Recorder::default());
    let pipeline = Arc::new(
        Pipeline::new(
            &config::parse("").unwrap(),
            host.clone(),
            Arc::new(PanicsOnce {
                calls: AtomicUsize::new(0),
            }),
            notifier.clone(),
        )
        .unwrap(),
    );
    let dispatcher = Dispatcher::new(pipeline, 1).unwrap();

    dispatcher
        .submit("/widgets/button `## Sizing` use rem", "alice", "https://cb/a")
        .unwrap();
    dispatcher.wait_idle();
    assert_eq!(dispatcher.pending(), 0);

    dispatcher
        .submit("/widgets/button `## Sizing` use rem", "bob", "https://cb/b")
        .unwrap();
    dispatcher.wait_idle();

    let sent = notifier.0.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0, "https://cb/a");
    assert!(sent[0].1.contains("Something went wrong"), "{}", sent[0].1);
    assert_eq!(sent[1].0, "https://cb/b");
    assert!(sent[1].1.starts_with("I opened a change"), "{}", sent[1].1);
    assert_eq!(host.proposals().len(), 1);
}
