//! Service coordinator: wires the polling scheduler to the notification hub
//! and exposes the operations the routing layer calls into.

use crate::address::MailAddress;
use crate::config::MailwatchConfig;
use crate::domains;
use crate::error::Result;
use crate::fetcher::MailboxFetcher;
use crate::hub::NotificationHub;
use crate::message::Message;
use crate::provider::{MailProvider, OneSecMailProvider};
use crate::scheduler::{MessageSink, PollScheduler};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

/// Result of checking one address in a batch.
#[derive(Debug)]
pub struct AddressCheck {
    /// The address that was checked.
    pub email: String,
    /// Messages (newest first) or the per-address failure.
    pub outcome: Result<Vec<Message>>,
}

/// Whether an address could be verified against the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStatus {
    /// The domain is not part of the provider pool (or the address is malformed).
    InvalidDomain,
    /// The provider answered for this mailbox.
    Active,
    /// The provider could not be reached within the verification timeout.
    Unreachable,
}

/// Counters and metadata exposed by the stats endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    /// Number of actively polled addresses.
    pub active_accounts: usize,
    /// Number of live realtime connections.
    pub live_connections: usize,
    /// Size of the disposable domain pool.
    pub domains_available: usize,
    /// Poll cadence, rendered as e.g. `"5 seconds"`.
    pub check_interval: String,
    /// Current server time, ISO-8601.
    pub server_time: String,
}

/// The inbox-watching engine.
///
/// Owns the mailbox fetcher, the per-address polling scheduler, and the
/// realtime notification hub, and wires scheduler output to hub fanout.
pub struct MailwatchService {
    config: MailwatchConfig,
    provider: Arc<dyn MailProvider>,
    fetcher: Arc<MailboxFetcher>,
    scheduler: PollScheduler,
    hub: Arc<NotificationHub>,
}

impl MailwatchService {
    /// Creates a service backed by the real HTTP provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream HTTP client cannot be built.
    pub fn new(config: MailwatchConfig) -> Result<Self> {
        let provider = Arc::new(OneSecMailProvider::new(
            config.provider_base_url.clone(),
            config.fetch_timeout,
        )?);
        Ok(Self::with_provider(config, provider))
    }

    /// Creates a service over an arbitrary provider implementation.
    ///
    /// This is the seam tests use to substitute a scripted provider.
    #[must_use]
    pub fn with_provider(config: MailwatchConfig, provider: Arc<dyn MailProvider>) -> Self {
        let fetcher = Arc::new(MailboxFetcher::new(Arc::clone(&provider)));
        let scheduler = PollScheduler::new(Arc::clone(&fetcher), config.check_interval);

        Self {
            config,
            provider,
            fetcher,
            scheduler,
            hub: Arc::new(NotificationHub::new()),
        }
    }

    /// Generates disposable addresses locally. No network call is made.
    pub fn create_addresses(&self, prefix: Option<&str>, count: usize) -> Vec<String> {
        (0..count)
            .map(|_| {
                let email = domains::generate_address(prefix);
                info!(email = %email, "generated disposable address");
                email
            })
            .collect()
    }

    /// One-shot mailbox fetch, bypassing the scheduler. Newest first.
    ///
    /// Upstream failures degrade to an empty list inside the fetcher.
    ///
    /// # Errors
    ///
    /// Returns an error only for a malformed address.
    #[instrument(name = "MailwatchService::fetch_once", skip(self))]
    pub async fn fetch_once(&self, email: &str) -> Result<Vec<Message>> {
        let address = MailAddress::parse(email)?;
        let mut messages = self.fetcher.fetch(&address).await;
        messages.reverse();
        Ok(messages)
    }

    /// Fetch-once over a batch of addresses; each failure stays isolated to
    /// its own entry.
    pub async fn check_many(&self, emails: &[String]) -> Vec<AddressCheck> {
        let checks = emails.iter().map(|email| async move {
            AddressCheck {
                email: email.clone(),
                outcome: self.fetch_once(email).await,
            }
        });
        futures::future::join_all(checks).await
    }

    /// Checks whether an address looks live: pool domain plus a bounded
    /// provider probe.
    pub async fn verify(&self, email: &str) -> VerifyStatus {
        let Ok(address) = MailAddress::parse(email) else {
            return VerifyStatus::InvalidDomain;
        };
        if !domains::is_pool_domain(address.domain()) {
            return VerifyStatus::InvalidDomain;
        }

        let probe = self.provider.list_messages(&address);
        match tokio::time::timeout(self.config.verify_timeout, probe).await {
            Ok(Ok(_)) => VerifyStatus::Active,
            Ok(Err(e)) => {
                debug!(email = %email, error = %e, "verification probe failed");
                VerifyStatus::Unreachable
            }
            Err(_) => {
                debug!(email = %email, "verification probe timed out");
                VerifyStatus::Unreachable
            }
        }
    }

    /// Starts realtime tracking: polling for the address, with every
    /// non-empty tick fanned out to the hub's matching subscriptions.
    ///
    /// Re-registering an already tracked address replaces its timer.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed address.
    pub fn start_realtime(&self, email: &str) -> Result<()> {
        let address = MailAddress::parse(email)?;

        let hub = Arc::clone(&self.hub);
        let sink: MessageSink = Arc::new(move |address, messages| {
            hub.broadcast_to_address(&address.to_string(), &messages);
        });

        self.scheduler.start(&address, sink);
        Ok(())
    }

    /// Stops polling an address. Idempotent; unknown addresses are a no-op.
    pub fn stop(&self, email: &str) {
        self.scheduler.stop(email);
    }

    /// Snapshot of service counters.
    #[must_use]
    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            active_accounts: self.scheduler.tracked_count(),
            live_connections: self.hub.connection_count(),
            domains_available: domains::DOMAINS.len(),
            check_interval: format!("{} seconds", self.config.check_interval.as_secs()),
            server_time: Utc::now().to_rfc3339(),
        }
    }

    /// The realtime hub, for the transport layer.
    #[must_use]
    pub fn hub(&self) -> Arc<NotificationHub> {
        Arc::clone(&self.hub)
    }

    /// Cancels every poll timer. Called at shutdown.
    pub fn shutdown(&self) {
        self.scheduler.stop_all();
    }

    /// Spawns the periodic idle-connection sweep.
    pub fn spawn_idle_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(service.config.sweep_interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = service.hub.sweep_idle(service.config.idle_timeout);
                if removed > 0 {
                    info!(removed, "idle connection sweep");
                }
            }
        })
    }
}

impl std::fmt::Debug for MailwatchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailwatchService")
            .field("tracked", &self.scheduler.tracked_count())
            .field("connections", &self.hub.connection_count())
            .finish_non_exhaustive()
    }
}
