//! Webhook notification of the final build outcome.
//!
//! When `BUILDPREP_WEBHOOK_URL` is set, the sequencer posts a short JSON
//! message (`{"content": "..."}`) describing how the sequence ended.
//! Delivery is best-effort: failures are logged and never change the
//! process exit code, and an unset variable disables notification silently.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;

/// Environment variable naming the webhook endpoint
pub const WEBHOOK_URL_ENV: &str = "BUILDPREP_WEBHOOK_URL";

/// Timeout for the webhook POST
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON body the webhook endpoint expects
#[derive(Debug, Serialize)]
struct WebhookPayload {
    content: String,
}

/// Best-effort outcome notifier.
pub struct WebhookNotifier {
    url: Option<String>,
}

impl WebhookNotifier {
    /// Build a notifier from the environment. An unset or blank
    /// `BUILDPREP_WEBHOOK_URL` yields a disabled notifier.
    pub fn from_env() -> Self {
        let url = std::env::var(WEBHOOK_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());
        Self { url }
    }

    /// Build a notifier for a fixed endpoint (used by tests).
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }

    /// Build a disabled notifier.
    pub fn disabled() -> Self {
        Self { url: None }
    }

    /// Returns true if a webhook endpoint is configured
    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Report a fully successful sequence.
    pub fn notify_success(&self) {
        self.send("Dependency bootstrap succeeded: all dependencies installed.");
    }

    /// Report an aborted sequence.
    pub fn notify_failure(&self, detail: &str) {
        self.send(&format!("Dependency bootstrap failed: {}", detail));
    }

    /// Deliver a message, logging (never propagating) any failure.
    fn send(&self, content: &str) {
        let Some(url) = &self.url else {
            log::debug!("No webhook configured, skipping notification");
            return;
        };

        match post_message(url, content) {
            Ok(()) => log::info!("Webhook notification delivered"),
            Err(e) => log::warn!("Webhook notification failed: {:#}", e),
        }
    }
}

/// POST one message to the webhook endpoint.
fn post_message(url: &str, content: &str) -> Result<()> {
    let client = Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .post(url)
        .json(&WebhookPayload {
            content: content.to_string(),
        })
        .send()
        .context("Failed to reach webhook endpoint")?;

    if !response.status().is_success() {
        anyhow::bail!("Webhook endpoint returned status {}", response.status());
    }

    Ok(())
}
