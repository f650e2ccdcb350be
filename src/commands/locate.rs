//! # Locate Command Implementation
//!
//! Read-only: resolves a document path the way a request would and prints
//! the stored file. With `--section`, also prints the section an indicator
//! selects; without it, prints the document's heading outline.

use anyhow::Result;
use clap::Args;

use fixdoc::locator::DocumentLocator;
use fixdoc::output::Status;
use fixdoc::path::normalize;
use fixdoc::request::Indicator;
use fixdoc::section::{Outline, SectionLocator, SectionTarget};
use fixdoc::suggestions;

use super::{build_host, Context};

/// Show which document and section a request would edit
#[derive(Args, Debug)]
pub struct LocateArgs {
    /// Document path or URL as a user would type it
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Section indicator, with or without backticks (e.g. "## Sizing")
    #[arg(short, long, value_name = "INDICATOR")]
    pub section: Option<String>,
}

/// Execute the `locate` command.
pub fn execute(args: LocateArgs, context: &Context) -> Result<()> {
    let out = context.output();
    let config = context.load_config()?;
    let host = build_host(&config)?;
    host.refresh(&config.base_branch)
        .map_err(suggestions::pipeline_error)?;

    let canonical = normalize(&args.path).map_err(suggestions::pipeline_error)?;
    let locator = DocumentLocator::new(
        host,
        &config.docs_root,
        &config.base_branch,
        config.resolver().map_err(suggestions::pipeline_error)?,
    );
    let document = locator
        .locate(&canonical)
        .map_err(suggestions::pipeline_error)?;
    println!(
        "{} {} -> {}",
        out.status(Status::Doc),
        canonical,
        document.stored_path
    );

    let Some(section) = args.section else {
        let outline = Outline::parse(&document.content);
        for heading in outline.headings() {
            println!(
                "   {}{}",
                "  ".repeat(usize::from(heading.depth.saturating_sub(1))),
                heading.line
            );
        }
        return Ok(());
    };

    let indicator = Indicator::extract(&section)
        .or_else(|| Indicator::parse(&section))
        .ok_or_else(|| anyhow::anyhow!("Section indicator is empty"))?;
    let sections = SectionLocator::new(config.section.mode, config.section.depth);
    let target = sections
        .locate(canonical.as_str(), &document.content, Some(&indicator))
        .map_err(suggestions::pipeline_error)?;

    if let SectionTarget::Section(found) = &target {
        let first_line = document.content[..found.range.start].lines().count() + 1;
        let last_line = first_line + found.text(&document.content).trim_end().lines().count() - 1;
        println!(
            "{} Section \"{}\" (lines {}-{})",
            out.status(Status::Ok),
            found.heading_text,
            first_line,
            last_line
        );
    }
    println!();
    print!("{}", target.text(&document.content));
    Ok(())
}
