//! Inbound slash-command endpoint
//!
//! The handler only parses the command and hands it to the [`Dispatcher`];
//! the response is sent before any document host or generator call starts.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Form, Router,
};
use log::{info, warn};
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::pipeline::{Dispatcher, USAGE};

/// Form fields of a slash command post
#[derive(Debug, Default, Deserialize)]
pub struct SlashCommand {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub response_url: String,
}

async fn liveness() -> &'static str {
    "fixdoc is running ✅"
}

async fn slash_command(
    State(dispatcher): State<Arc<Dispatcher>>,
    Form(command): Form<SlashCommand>,
) -> (StatusCode, String) {
    match dispatcher.submit(&command.text, &command.user_name, &command.response_url) {
        Ok(ack) => (StatusCode::OK, ack),
        Err(e) => {
            warn!("Rejected command from {}: {}", command.user_name, e);
            (StatusCode::OK, USAGE.to_string())
        }
    }
}

/// Routes: `GET /` for liveness and `POST route` for commands.
pub fn router(dispatcher: Arc<Dispatcher>, route: &str) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route(route, post(slash_command))
        .with_state(dispatcher)
}

/// Serve `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on {}", addr);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl-C.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down, waiting for queued requests");
}
