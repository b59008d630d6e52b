//! # mailwatch
//!
//! Disposable-email inbox watcher: polls mailboxes on an upstream temp-mail
//! provider, extracts one-time passcodes from incoming messages, and pushes
//! new results to subscribed realtime clients.
//!
//! The crate is built around four pieces:
//!
//! - [`extractor`] — pure OTP extraction from message text
//! - [`MailboxFetcher`] — soft-failing inbox fetch against the provider
//! - [`PollScheduler`] — one cancellable recurring poll task per address
//! - [`NotificationHub`] — live connection registry and message fanout
//!
//! [`MailwatchService`] wires them together and is what the HTTP layer in
//! [`api`] talks to.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailwatch::{api, MailwatchConfig, MailwatchService};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MailwatchConfig::from_env()?;
//! let service = Arc::new(MailwatchService::new(config.clone())?);
//! service.spawn_idle_sweeper();
//!
//! let router = api::build_router(Arc::clone(&service));
//! let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees (and non-guarantees)
//!
//! Everything is memory-resident and best-effort: no message persistence, no
//! delivery guarantees across restarts, no exactly-once notification
//! semantics. Upstream unavailability degrades to "no messages this tick" and
//! is never surfaced to realtime subscribers as an error.
//!
//! ## Observability
//!
//! The crate uses `tracing` for instrumentation. The fetch path emits spans
//! (`MailboxFetcher::fetch`, `MailwatchService::fetch_once`) with the address
//! as a structured field; scheduler and hub lifecycle events are logged at
//! `info`, per-message skips at `warn`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod address;
pub mod api;
pub mod config;
pub mod domains;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod hub;
pub mod message;
pub mod provider;
pub mod scheduler;
pub mod service;

// Re-exports for ergonomic API
pub use address::MailAddress;
pub use config::{MailwatchConfig, MailwatchConfigBuilder};
pub use error::{Error, ErrorCategory, Result};
pub use fetcher::MailboxFetcher;
pub use hub::{ClientCommand, NotificationHub, OutboundEvent};
pub use message::Message;
pub use provider::{MailProvider, OneSecMailProvider};
pub use scheduler::PollScheduler;
pub use service::{MailwatchService, ServiceStats, VerifyStatus};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // Ensure all public types are accessible
        let _ = MailwatchConfig::builder();
        let _ = NotificationHub::new();
        let _ = extractor::extract_otp("code: 123456");
    }
}
