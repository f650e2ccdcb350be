//! Outcome notification through the request's callback address

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::Serialize;
use url::Url;

use crate::error::{Error, Result};

const SERVICE: &str = "callback endpoint";

/// Delivers the final message of a request
pub trait Notifier: Send + Sync {
    /// Send `text` to `callback`. Called at most once per request.
    fn notify(&self, callback: &str, text: &str) -> Result<()>;
}

/// Drops every message; for runs whose outcome is reported another way
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, callback: &str, _text: &str) -> Result<()> {
        debug!("Not notifying {:?}", callback);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    text: &'a str,
}

/// Posts `{"text": ...}` as JSON to the callback URL
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: Client,
}

impl HttpNotifier {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(concat!("fixdoc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::upstream(SERVICE, format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Notifier for HttpNotifier {
    fn notify(&self, callback: &str, text: &str) -> Result<()> {
        let url = Url::parse(callback)
            .map_err(|e| Error::invalid_input(format!("bad callback address '{callback}': {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::invalid_input(format!(
                "callback address '{callback}' is not an http(s) URL"
            )));
        }

        debug!("Posting outcome to {}", url.host_str().unwrap_or_default());
        let response = self
            .client
            .post(url)
            .json(&Message { text })
            .send()
            .map_err(|e| Error::upstream(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(SERVICE, format!("HTTP {}", status.as_u16())));
        }
        Ok(())
    }
}
