//! Best-effort progress notifications.
//!
//! Callers never inspect the result of [`Notifier::send`]; it is returned only so
//! implementations can be tested and so the discard is visible at the call site.

use crate::Result;
use crate::config::NotificationConfig;
use crate::error::NotifyError;
use async_trait::async_trait;
use std::time::Duration;

/// Sink for human-readable progress messages
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message`. Failures must not affect the caller's control flow.
    async fn send(&self, message: &str) -> std::result::Result<(), NotifyError>;
}

/// Notifier that drops every message
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, _message: &str) -> std::result::Result<(), NotifyError> {
        Ok(())
    }
}

/// POSTs each message as a plain-text body (ntfy-style topic URLs work as-is)
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: url::Url,
    auth_header: Option<String>,
    timeout: Duration,
}

impl WebhookNotifier {
    /// Create a notifier posting to `url`
    pub fn new(url: url::Url, auth_header: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            url,
            auth_header,
            timeout,
        })
    }

    async fn post(&self, message: &str) -> std::result::Result<(), NotifyError> {
        let mut request = self
            .client
            .post(self.url.clone())
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(message.to_string())
            .timeout(self.timeout);

        if let Some(auth) = &self.auth_header {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status().as_u16()));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, message: &str) -> std::result::Result<(), NotifyError> {
        let result = self.post(message).await;
        match &result {
            Ok(()) => tracing::debug!(url = %self.url, "notification sent"),
            Err(e) => tracing::warn!(url = %self.url, error = %e, "notification failed"),
        }
        result
    }
}

/// Build the notifier described by `config`: a webhook when a URL is set, otherwise a no-op
pub fn from_config(config: &NotificationConfig) -> Result<Box<dyn Notifier>> {
    match &config.url {
        Some(url) => Ok(Box::new(WebhookNotifier::new(
            url.clone(),
            config.auth_header.clone(),
            config.timeout,
        )?)),
        None => Ok(Box::new(NoopNotifier)),
    }
}
