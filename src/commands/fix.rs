//! # Fix Command Implementation
//!
//! Runs one change request synchronously, the same way the server runs it in
//! the background, and prints the outcome instead of posting it to a
//! callback.
//!
//! With `--dry-run` nothing is written: the patched document is printed to
//! stdout (status lines go to stderr so the output can be redirected).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use fixdoc::notify::SilentNotifier;
use fixdoc::output::Status;
use fixdoc::pipeline::{Outcome, Pipeline};
use fixdoc::request::Request;
use fixdoc::suggestions;

use super::{build_generator, build_host, Context};

/// Run a change request in the foreground
#[derive(Args, Debug)]
pub struct FixArgs {
    /// Command text: the document path followed by the issue description
    ///
    /// Quote the section indicator so the shell keeps the backticks:
    /// fixdoc fix /widgets/button '`## Sizing`' the pixel example is wrong
    #[arg(required = true, value_name = "TEXT")]
    pub text: Vec<String>,

    /// Name recorded as the requesting user
    #[arg(long, default_value = "fixdoc-cli")]
    pub user: String,

    /// Use the contents of FILE as the replacement instead of calling the
    /// content generator
    #[arg(long, value_name = "FILE")]
    pub replacement_file: Option<PathBuf>,

    /// Print the patched document instead of publishing it
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `fix` command.
pub fn execute(args: FixArgs, context: &Context) -> Result<()> {
    let out = context.output();
    let config = context.load_config()?;
    let host = build_host(&config)?;
    let generator = build_generator(&config, args.replacement_file.as_deref())?;
    let pipeline = Pipeline::new(&config, host, generator, Arc::new(SilentNotifier))
        .map_err(suggestions::pipeline_error)?;

    let text = args.text.join(" ");
    let request = Request::from_command(&text, &args.user, "").map_err(suggestions::pipeline_error)?;

    if args.dry_run {
        let draft = pipeline.draft(&request).map_err(suggestions::pipeline_error)?;
        eprintln!(
            "{} {} ({})",
            out.status(Status::Doc),
            draft.document.canonical,
            draft.document.stored_path
        );
        if draft.is_unchanged() {
            eprintln!("{} No changes", out.status(Status::Ok));
        }
        print!("{}", draft.patched);
        return Ok(());
    }

    match pipeline.run(&request).map_err(suggestions::pipeline_error)? {
        Outcome::Published {
            path,
            stored_path,
            branch,
            location,
        } => {
            println!("{} {} ({})", out.status(Status::Doc), path, stored_path);
            println!("{} Branch: {}", out.status(Status::Ok), branch);
            println!("{} Proposal: {}", out.status(Status::Publish), location);
        }
        outcome @ Outcome::Unchanged { .. } => {
            println!("{} {}", out.status(Status::Ok), outcome.message());
        }
    }
    Ok(())
}
