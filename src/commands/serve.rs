//! # Serve Command Implementation
//!
//! Starts the slash-command server. Commands are acknowledged immediately and
//! processed by a fixed-size worker pool. On Ctrl-C the listener stops
//! accepting connections and the command waits for queued requests to finish
//! before exiting.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use log::info;

use fixdoc::notify::HttpNotifier;
use fixdoc::output::Status;
use fixdoc::pipeline::{Dispatcher, Pipeline};
use fixdoc::server;
use fixdoc::suggestions;

use super::{build_generator, build_host, Context};

/// Run the slash-command server
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides server.bind and $PORT)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// Number of background workers (overrides server.workers)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,
}

/// Execute the `serve` command.
pub fn execute(args: ServeArgs, context: &Context) -> Result<()> {
    let out = context.output();
    let mut config = context.load_config()?;
    if let Some(workers) = args.workers {
        config.server.workers = workers;
    }
    config.validate().map_err(suggestions::pipeline_error)?;

    let addr = match args.bind {
        Some(addr) => addr,
        None => config
            .server
            .bind_addr()
            .map_err(suggestions::pipeline_error)?,
    };

    let host = build_host(&config)?;
    let generator = build_generator(&config, None)?;
    let notifier = Arc::new(
        HttpNotifier::new(config.server.callback_timeout()).map_err(suggestions::pipeline_error)?,
    );
    let pipeline = Arc::new(
        Pipeline::new(&config, host, generator, notifier).map_err(suggestions::pipeline_error)?,
    );
    let dispatcher = Arc::new(
        Dispatcher::new(pipeline, config.server.workers).map_err(suggestions::pipeline_error)?,
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let app = server::router(Arc::clone(&dispatcher), &config.server.route);
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to listen on {addr}"))?;
        println!(
            "{} fixdoc listening on http://{}{}",
            out.status(Status::Publish),
            addr,
            config.server.route
        );
        server::serve(listener, app, server::ctrl_c())
            .await
            .context("Server error")
    })?;
    drop(runtime);

    let pending = dispatcher.pending();
    if pending > 0 {
        info!("Waiting for {} queued request(s)", pending);
    }
    dispatcher.wait_idle();
    println!("{} Stopped", out.status(Status::Ok));
    Ok(())
}
