//! # Validate Command Implementation
//!
//! Parses and validates the configuration file without contacting any
//! collaborator, then reports the effective settings and anything that would
//! stop `serve` or `fix` from starting (missing repository, unreadable prompt
//! template, unset API key).

use anyhow::Result;
use clap::Args;

use fixdoc::config::{self, ResolutionStrategy};
use fixdoc::generate::PromptTemplate;
use fixdoc::output::Status;
use fixdoc::suggestions;

use super::Context;

/// Validate a fixdoc.yaml configuration file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Use strict validation (fail on warnings).
    #[arg(long)]
    pub strict: bool,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, context: &Context) -> Result<()> {
    let out = context.output();
    let path = context.config_path()?;
    println!(
        "{} Validating configuration: {}",
        out.status(Status::Scan),
        path.display()
    );

    if !path.exists() {
        return Err(suggestions::config_not_found(&path));
    }

    let config = match config::from_file(&path) {
        Ok(config) => {
            println!(
                "{} Configuration file parsed successfully",
                out.status(Status::Ok)
            );
            config
        }
        Err(e) => {
            println!(
                "{} Configuration parsing failed: {}",
                out.status(Status::Error),
                e
            );
            return Err(suggestions::pipeline_error(e));
        }
    };

    println!("\n{} Configuration Summary:", out.status(Status::Doc));
    println!("   Documents: {} on {}", config.docs_root, config.base_branch);
    match config.resolution.strategy {
        ResolutionStrategy::Probe => println!("   Resolution: probe"),
        ResolutionStrategy::Fuzzy => println!(
            "   Resolution: fuzzy (threshold {}, {} exclude patterns)",
            config.resolution.threshold,
            config.resolution.exclude.len()
        ),
    }
    println!(
        "   Sections: {:?}, reference depth {}",
        config.section.mode, config.section.depth
    );
    println!("   Splice: {:?}", config.splice);
    println!("   Server: {}{}", config.server.bind, config.server.route);

    let mut warnings = Vec::new();
    if !config.host.repo.exists() {
        warnings.push(format!(
            "host.repo {} does not exist",
            config.host.repo.display()
        ));
    }
    if let Some(template) = &config.generator.prompt_template {
        if let Err(e) = PromptTemplate::load(template) {
            warnings.push(format!(
                "prompt template {} cannot be used: {}",
                template.display(),
                e
            ));
        }
    }
    if config.generator.api_key().is_none() {
        warnings.push(format!(
            "{} is not set; the generator will be called without a key",
            config.generator.api_key_env
        ));
    }

    for warning in &warnings {
        println!("{} {}", out.status(Status::Warn), warning);
    }

    if args.strict && !warnings.is_empty() {
        anyhow::bail!(
            "Validation failed with {} warning(s) in strict mode",
            warnings.len()
        );
    }

    println!("\n{} Configuration is valid", out.status(Status::Ok));
    Ok(())
}
