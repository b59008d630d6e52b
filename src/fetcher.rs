//! Mailbox fetching and message normalization.

use crate::address::MailAddress;
use crate::extractor::extract_otp;
use crate::message::{parse_timestamp_ms, Message, DEFAULT_SUBJECT};
use crate::provider::{MailProvider, MessageDetail, MessageSummary};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Fetches and normalizes the contents of one mailbox.
///
/// Designed to be resilient: a failed listing degrades to an empty result and
/// a failed per-message detail fetch drops only that message, so callers are
/// never blocked or failed by upstream unavailability. Retry cadence is the
/// scheduler's next tick, never inside a fetch.
pub struct MailboxFetcher {
    provider: Arc<dyn MailProvider>,
}

impl MailboxFetcher {
    /// Creates a fetcher over the given provider.
    #[must_use]
    pub fn new(provider: Arc<dyn MailProvider>) -> Self {
        Self { provider }
    }

    /// Fetches every readable message in the mailbox, in provider order.
    ///
    /// For each listed item one detail request retrieves the body; subject and
    /// body are concatenated and run through the OTP extractor. Failures are
    /// logged, never propagated.
    #[instrument(name = "MailboxFetcher::fetch", skip(self), fields(address = %address))]
    pub async fn fetch(&self, address: &MailAddress) -> Vec<Message> {
        let summaries = match self.provider.list_messages(address).await {
            Ok(summaries) => summaries,
            Err(e) => {
                warn!(
                    error = %e,
                    category = %e.category(),
                    "mailbox listing failed, returning no messages"
                );
                return Vec::new();
            }
        };

        let mut messages = Vec::with_capacity(summaries.len());
        for summary in summaries {
            match self.provider.read_message(address, summary.id).await {
                Ok(detail) => messages.push(normalize(summary, &detail)),
                Err(e) => {
                    warn!(
                        id = summary.id,
                        error = %e,
                        "message detail fetch failed, skipping message"
                    );
                }
            }
        }

        debug!(count = messages.len(), "mailbox fetched");
        messages
    }
}

impl std::fmt::Debug for MailboxFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxFetcher").finish_non_exhaustive()
    }
}

/// Builds a [`Message`] from the listing entry and its detail.
fn normalize(summary: MessageSummary, detail: &MessageDetail) -> Message {
    let subject = summary
        .subject
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
    let body = detail.body();

    let full_text = format!("{subject} {body}");
    let otp = extract_otp(&full_text);
    if let Some(code) = &otp {
        debug!(id = summary.id, code = %code, "passcode found in message");
    }

    Message {
        id: summary.id,
        from: summary.from,
        subject,
        body,
        timestamp: parse_timestamp_ms(&summary.date),
        date: summary.date,
        otp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// Scripted provider: a fixed listing plus a set of ids whose detail
    /// fetch fails, or a listing that fails outright.
    struct ScriptedProvider {
        summaries: Result<Vec<MessageSummary>>,
        failing_details: HashSet<u64>,
    }

    impl ScriptedProvider {
        fn with_messages(summaries: Vec<MessageSummary>) -> Self {
            Self {
                summaries: Ok(summaries),
                failing_details: HashSet::new(),
            }
        }

        fn failing_list() -> Self {
            Self {
                summaries: Err(Error::InvalidConfig {
                    message: "scripted list failure".into(),
                }),
                failing_details: HashSet::new(),
            }
        }
    }

    #[async_trait]
    impl MailProvider for ScriptedProvider {
        async fn list_messages(&self, _address: &MailAddress) -> Result<Vec<MessageSummary>> {
            match &self.summaries {
                Ok(s) => Ok(s.clone()),
                Err(_) => Err(Error::InvalidConfig {
                    message: "scripted list failure".into(),
                }),
            }
        }

        async fn read_message(&self, _address: &MailAddress, id: u64) -> Result<MessageDetail> {
            if self.failing_details.contains(&id) {
                return Err(Error::InvalidConfig {
                    message: "scripted detail failure".into(),
                });
            }
            Ok(MessageDetail {
                text_body: Some(format!("Your code is 12345{id}")),
                html_body: None,
            })
        }
    }

    fn summary(id: u64, subject: Option<&str>) -> MessageSummary {
        MessageSummary {
            id,
            from: "sender@example.com".into(),
            subject: subject.map(str::to_string),
            date: "2024-03-01 12:00:00".into(),
        }
    }

    fn address() -> MailAddress {
        MailAddress::parse("abc123@esiix.com").unwrap()
    }

    #[tokio::test]
    async fn test_fetch_normalizes_and_extracts() {
        let provider = ScriptedProvider::with_messages(vec![summary(1, Some("Login code"))]);
        let fetcher = MailboxFetcher::new(Arc::new(provider));

        let messages = fetcher.fetch(&address()).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].subject, "Login code");
        assert_eq!(messages[0].otp.as_deref(), Some("123451"));
        assert_eq!(messages[0].timestamp, 1_709_294_400_000);
    }

    #[tokio::test]
    async fn test_fetch_defaults_missing_subject() {
        let provider = ScriptedProvider::with_messages(vec![summary(1, None)]);
        let fetcher = MailboxFetcher::new(Arc::new(provider));

        let messages = fetcher.fetch(&address()).await;
        assert_eq!(messages[0].subject, DEFAULT_SUBJECT);
    }

    #[tokio::test]
    async fn test_failed_detail_drops_only_that_message() {
        let mut provider = ScriptedProvider::with_messages(vec![
            summary(1, Some("a")),
            summary(2, Some("b")),
            summary(3, Some("c")),
        ]);
        provider.failing_details.insert(2);
        let fetcher = MailboxFetcher::new(Arc::new(provider));

        let messages = fetcher.fetch(&address()).await;
        let ids: Vec<u64> = messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_failed_listing_fails_soft() {
        let fetcher = MailboxFetcher::new(Arc::new(ScriptedProvider::failing_list()));
        let messages = fetcher.fetch(&address()).await;
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_provider_order_preserved() {
        let provider = ScriptedProvider::with_messages(vec![
            summary(9, Some("newest")),
            summary(5, Some("older")),
        ]);
        let fetcher = MailboxFetcher::new(Arc::new(provider));

        let messages = fetcher.fetch(&address()).await;
        assert_eq!(messages[0].id, 9);
        assert_eq!(messages[1].id, 5);
    }
}
