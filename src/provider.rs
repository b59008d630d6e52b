//! Upstream mailbox provider client.
//!
//! The provider exposes two read-only HTTPS endpoints, both unauthenticated
//! and JSON-in/JSON-out: one listing the messages of a mailbox and one
//! returning a single message with its body. Availability and rate limits are
//! not guaranteed; callers are expected to fail soft.
//!
//! [`MailProvider`] is the seam used by tests to substitute a scripted
//! provider for the real HTTP client.

use crate::address::MailAddress;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// One entry of the provider's mailbox listing.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageSummary {
    /// Provider-assigned message id.
    pub id: u64,
    /// Sender address.
    pub from: String,
    /// Subject line; the provider omits it for subjectless mail.
    #[serde(default)]
    pub subject: Option<String>,
    /// Provider timestamp string.
    pub date: String,
}

/// Full message detail as returned by the read endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    /// Plain-text body, possibly empty.
    #[serde(default)]
    pub text_body: Option<String>,
    /// HTML body, possibly empty.
    #[serde(default)]
    pub html_body: Option<String>,
}

impl MessageDetail {
    /// Returns the first non-empty body variant, or an empty string.
    #[must_use]
    pub fn body(&self) -> String {
        for candidate in [&self.text_body, &self.html_body] {
            if let Some(body) = candidate {
                if !body.is_empty() {
                    return body.clone();
                }
            }
        }
        String::new()
    }
}

/// Read-only access to the upstream mailbox provider.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Lists the messages currently in a mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout, or a malformed payload.
    async fn list_messages(&self, address: &MailAddress) -> Result<Vec<MessageSummary>>;

    /// Reads a single message, including its body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout, or a malformed payload.
    async fn read_message(&self, address: &MailAddress, id: u64) -> Result<MessageDetail>;
}

/// HTTP client for the 1secmail-style provider API.
#[derive(Debug, Clone)]
pub struct OneSecMailProvider {
    http: reqwest::Client,
    base_url: String,
}

impl OneSecMailProvider {
    /// Creates a provider client with a bounded per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl MailProvider for OneSecMailProvider {
    async fn list_messages(&self, address: &MailAddress) -> Result<Vec<MessageSummary>> {
        debug!(address = %address, "listing mailbox");

        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("action", "getMessages"),
                ("login", address.local()),
                ("domain", address.domain()),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|source| Error::UpstreamRequest {
                action: "getMessages",
                source,
            })?;

        response
            .json::<Vec<MessageSummary>>()
            .await
            .map_err(|source| Error::UpstreamDecode {
                action: "getMessages",
                source,
            })
    }

    async fn read_message(&self, address: &MailAddress, id: u64) -> Result<MessageDetail> {
        debug!(address = %address, id, "reading message");

        let id_param = id.to_string();
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("action", "readMessage"),
                ("login", address.local()),
                ("domain", address.domain()),
                ("id", id_param.as_str()),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|source| Error::UpstreamRequest {
                action: "readMessage",
                source,
            })?;

        response
            .json::<MessageDetail>()
            .await
            .map_err(|source| Error::UpstreamDecode {
                action: "readMessage",
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_prefers_text() {
        let detail = MessageDetail {
            text_body: Some("plain".into()),
            html_body: Some("<p>html</p>".into()),
        };
        assert_eq!(detail.body(), "plain");
    }

    #[test]
    fn test_body_empty_text_falls_through_to_html() {
        // Mirrors the truthy fallback chain: an empty text part is not a body.
        let detail = MessageDetail {
            text_body: Some(String::new()),
            html_body: Some("<p>html</p>".into()),
        };
        assert_eq!(detail.body(), "<p>html</p>");
    }

    #[test]
    fn test_body_defaults_to_empty() {
        assert_eq!(MessageDetail::default().body(), "");
    }

    #[test]
    fn test_summary_subject_optional() {
        let summary: MessageSummary = serde_json::from_str(
            r#"{"id": 3, "from": "a@b.c", "date": "2024-03-01 12:00:00"}"#,
        )
        .unwrap();
        assert_eq!(summary.subject, None);
    }
}
