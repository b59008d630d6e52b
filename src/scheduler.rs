//! Per-address polling scheduler.
//!
//! One recurring timer per tracked address, each running as its own tokio
//! task so a slow fetch for one address never delays any other. All mutation
//! of the tracking registry funnels through [`PollScheduler`] methods.

use crate::address::MailAddress;
use crate::fetcher::MailboxFetcher;
use crate::message::Message;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Callback invoked with the messages produced by a tick.
pub type MessageSink = Arc<dyn Fn(&MailAddress, Vec<Message>) + Send + Sync>;

struct Tracker {
    generation: u64,
    handle: JoinHandle<()>,
}

type TrackerMap = Arc<Mutex<HashMap<String, Tracker>>>;

/// Owns one recurring poll timer per tracked address.
///
/// Invariant: at most one active timer per address. Re-registering an address
/// cancels and replaces its prior timer (last writer wins), and each timer
/// carries a generation tag so an in-flight fetch whose address was stopped
/// or replaced can never deliver a late result.
pub struct PollScheduler {
    trackers: TrackerMap,
    fetcher: Arc<MailboxFetcher>,
    interval: Duration,
    next_generation: AtomicU64,
}

impl PollScheduler {
    /// Creates a scheduler polling at the given fixed interval.
    #[must_use]
    pub fn new(fetcher: Arc<MailboxFetcher>, interval: Duration) -> Self {
        Self {
            trackers: Arc::new(Mutex::new(HashMap::new())),
            fetcher,
            interval,
            next_generation: AtomicU64::new(0),
        }
    }

    /// Starts (or restarts) polling an address.
    ///
    /// Idempotent with respect to timer count: if the address is already
    /// tracked its existing timer is cancelled first, so duplicate concurrent
    /// polls for one address cannot exist. Each tick fetches the mailbox and,
    /// when at least one message comes back, hands the batch to `sink` in the
    /// provider's original order.
    pub fn start(&self, address: &MailAddress, sink: MessageSink) {
        let key = address.to_string();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let mut trackers = lock(&self.trackers);
        if let Some(previous) = trackers.remove(&key) {
            previous.handle.abort();
            debug!(address = %key, "replaced existing poll timer");
        }

        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.fetcher),
            address.clone(),
            self.interval,
            generation,
            Arc::clone(&self.trackers),
            sink,
        ));

        trackers.insert(key.clone(), Tracker { generation, handle });
        info!(address = %key, interval_secs = self.interval.as_secs(), "started polling");
    }

    /// Stops polling an address. No-op if the address is not tracked.
    pub fn stop(&self, address: &str) {
        let mut trackers = lock(&self.trackers);
        if let Some(tracker) = trackers.remove(address) {
            tracker.handle.abort();
            info!(address = %address, "stopped polling");
        }
    }

    /// Cancels every timer. Used at shutdown.
    pub fn stop_all(&self) {
        let mut trackers = lock(&self.trackers);
        let count = trackers.len();
        for (_, tracker) in trackers.drain() {
            tracker.handle.abort();
        }
        if count > 0 {
            info!(count, "stopped all poll timers");
        }
    }

    /// Number of actively tracked addresses.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        lock(&self.trackers).len()
    }

    /// Returns `true` if the address currently has a poll timer.
    #[must_use]
    pub fn is_tracked(&self, address: &str) -> bool {
        lock(&self.trackers).contains_key(address)
    }
}

impl std::fmt::Debug for PollScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollScheduler")
            .field("tracked", &self.tracked_count())
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// The recurring per-address poll task.
///
/// Ticks never overlap for one address: the next tick cannot fire until the
/// previous one returns (a slow fetch delays the schedule, which is accepted
/// degraded behavior). Fetch failures degrade to an empty batch inside the
/// fetcher, so the timer never self-terminates on error.
async fn poll_loop(
    fetcher: Arc<MailboxFetcher>,
    address: MailAddress,
    interval: Duration,
    generation: u64,
    trackers: TrackerMap,
    sink: MessageSink,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; consume it so the first fetch
    // happens one interval after registration.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let messages = fetcher.fetch(&address).await;
        if messages.is_empty() {
            continue;
        }

        if !is_current(&trackers, &address, generation) {
            debug!(address = %address, generation, "dropping late poll result");
            return;
        }

        debug!(address = %address, count = messages.len(), "delivering poll result");
        sink(&address, messages);
    }
}

/// Checks whether `generation` is still the registered timer for the address.
fn is_current(trackers: &TrackerMap, address: &MailAddress, generation: u64) -> bool {
    lock(trackers)
        .get(&address.to_string())
        .is_some_and(|tracker| tracker.generation == generation)
}

fn lock(trackers: &TrackerMap) -> MutexGuard<'_, HashMap<String, Tracker>> {
    trackers.lock().expect("tracker map lock poisoned")
}
