//! Live connection registry and notification fanout.
//!
//! The hub tracks realtime client connections and the single address each one
//! is subscribed to, and pushes fetched messages to every matching
//! subscription. It owns no polling state: a subscription is advisory and
//! does not create tracking as a side effect.

use crate::message::Message;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Greeting sent to every new connection.
const WELCOME_TEXT: &str = "Connected to mailwatch realtime channel";

/// Commands a realtime client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientCommand {
    /// Subscribe this connection to an address (overwrites any prior one).
    Register {
        /// The address to watch.
        email: String,
    },
    /// Liveness probe; answered with a `pong`.
    Ping,
}

/// Events pushed from the server to a realtime client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundEvent {
    /// Sent once immediately after the connection is registered.
    Welcome {
        /// The id assigned to this connection.
        #[serde(rename = "clientId")]
        client_id: String,
        /// Human-readable greeting.
        message: String,
    },
    /// Reply to a client `ping`.
    Pong {
        /// Current server time in epoch milliseconds.
        timestamp: i64,
    },
    /// New messages for the subscribed address.
    Messages {
        /// The address the messages belong to.
        email: String,
        /// The fetched batch, in provider order.
        messages: Vec<Message>,
        /// Batch size.
        count: usize,
    },
}

struct Subscription {
    email: Option<String>,
    last_activity: Instant,
    sender: UnboundedSender<OutboundEvent>,
}

/// Registry of live realtime connections.
///
/// All mutation funnels through these methods; the connection map is guarded
/// by a mutex so the hub can be driven from any task.
#[derive(Default)]
pub struct NotificationHub {
    connections: Mutex<HashMap<String, Subscription>>,
}

impl NotificationHub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection.
    ///
    /// Returns the generated connection id and the event stream for the
    /// connection; a `welcome` event is already queued on it. The id is an
    /// epoch-millisecond timestamp with a random suffix, which makes
    /// collisions negligible.
    pub fn connect(&self) -> (String, UnboundedReceiver<OutboundEvent>) {
        let client_id = format!(
            "{}-{:08x}",
            Utc::now().timestamp_millis(),
            rand::thread_rng().gen::<u32>()
        );

        let (sender, receiver) = mpsc::unbounded_channel();
        let _ = sender.send(OutboundEvent::Welcome {
            client_id: client_id.clone(),
            message: WELCOME_TEXT.to_string(),
        });

        self.lock().insert(
            client_id.clone(),
            Subscription {
                email: None,
                last_activity: Instant::now(),
                sender,
            },
        );

        info!(client_id = %client_id, "realtime client connected");
        (client_id, receiver)
    }

    /// Handles one raw payload from a client.
    ///
    /// Malformed or unrecognized payloads are logged and ignored; they never
    /// close the connection.
    pub fn handle_message(&self, client_id: &str, raw: &str) {
        let command = match serde_json::from_str::<ClientCommand>(raw) {
            Ok(command) => command,
            Err(e) => {
                warn!(client_id = %client_id, error = %e, "ignoring malformed client payload");
                return;
            }
        };

        let mut connections = self.lock();
        let Some(subscription) = connections.get_mut(client_id) else {
            debug!(client_id = %client_id, "message from unknown connection");
            return;
        };
        subscription.last_activity = Instant::now();

        match command {
            ClientCommand::Register { email } => {
                info!(client_id = %client_id, email = %email, "client registered for address");
                subscription.email = Some(email);
            }
            ClientCommand::Ping => {
                let _ = subscription.sender.send(OutboundEvent::Pong {
                    timestamp: Utc::now().timestamp_millis(),
                });
            }
        }
    }

    /// Removes a connection. Used for disconnects and transport errors alike.
    pub fn disconnect(&self, client_id: &str) {
        if self.lock().remove(client_id).is_some() {
            info!(client_id = %client_id, "realtime client disconnected");
        }
    }

    /// Pushes a batch of messages to every connection subscribed to `email`.
    ///
    /// Zero matching subscriptions is a valid no-op. Connections whose event
    /// channel is gone are pruned on the way.
    pub fn broadcast_to_address(&self, email: &str, messages: &[Message]) {
        let mut connections = self.lock();
        let mut dead = Vec::new();
        let mut delivered = 0usize;

        for (client_id, subscription) in connections.iter() {
            if subscription.email.as_deref() != Some(email) {
                continue;
            }

            let event = OutboundEvent::Messages {
                email: email.to_string(),
                messages: messages.to_vec(),
                count: messages.len(),
            };
            if subscription.sender.send(event).is_ok() {
                delivered += 1;
            } else {
                dead.push(client_id.clone());
            }
        }

        for client_id in dead {
            connections.remove(&client_id);
            debug!(client_id = %client_id, "pruned dead connection during broadcast");
        }

        if delivered > 0 {
            debug!(email = %email, delivered, count = messages.len(), "broadcast delivered");
        }
    }

    /// Closes and removes connections idle longer than `max_idle`.
    ///
    /// Dropping a subscription's sender closes its event stream, which in
    /// turn tears down the transport. Returns the number of removed
    /// connections.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let mut connections = self.lock();
        let before = connections.len();
        connections.retain(|client_id, subscription| {
            let keep = subscription.last_activity.elapsed() <= max_idle;
            if !keep {
                info!(client_id = %client_id, "sweeping idle connection");
            }
            keep
        });
        before - connections.len()
    }

    /// Number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Subscription>> {
        self.connections.lock().expect("connection map lock poisoned")
    }
}

impl std::fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHub")
            .field("connections", &self.connection_count())
            .finish()
    }
}
