//! End-to-end realtime tests: poll timers feeding subscribed connections
//! through the notification hub, driven on a paused clock.

use async_trait::async_trait;
use mailwatch::provider::{MessageDetail, MessageSummary};
use mailwatch::{
    hub::OutboundEvent, MailAddress, MailProvider, MailwatchConfig, MailwatchService, Result,
};
use std::sync::Arc;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Test Harness
// ─────────────────────────────────────────────────────────────────────────────

const WATCHED: &str = "abc123@esiix.com";

/// Provider that always has one message with a passcode waiting.
struct CodeProvider;

#[async_trait]
impl MailProvider for CodeProvider {
    async fn list_messages(&self, _address: &MailAddress) -> Result<Vec<MessageSummary>> {
        Ok(vec![MessageSummary {
            id: 1,
            from: "noreply@example.com".into(),
            subject: Some("Login code".into()),
            date: "2024-03-01 12:00:00".into(),
        }])
    }

    async fn read_message(&self, _address: &MailAddress, _id: u64) -> Result<MessageDetail> {
        Ok(MessageDetail {
            text_body: Some("Your code is 123456".into()),
            html_body: None,
        })
    }
}

fn service() -> Arc<MailwatchService> {
    Arc::new(MailwatchService::with_provider(
        MailwatchConfig::default(),
        Arc::new(CodeProvider),
    ))
}

async fn settle() {
    // Let spawned poll tasks run between clock advances.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

fn assert_code_push(event: OutboundEvent) {
    match event {
        OutboundEvent::Messages {
            email,
            messages,
            count,
        } => {
            assert_eq!(email, WATCHED);
            assert_eq!(count, 1);
            assert_eq!(messages[0].otp.as_deref(), Some("123456"));
        }
        other => panic!("expected messages push, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fanout
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_poll_tick_fans_out_to_every_subscriber() {
    let service = service();
    let hub = service.hub();

    let (id_a, mut events_a) = hub.connect();
    let (id_b, mut events_b) = hub.connect();
    let (_id_c, mut events_c) = hub.connect();
    let _ = events_a.recv().await; // welcome
    let _ = events_b.recv().await;
    let _ = events_c.recv().await;

    hub.handle_message(&id_a, &format!(r#"{{"type":"register","email":"{WATCHED}"}}"#));
    hub.handle_message(&id_b, &format!(r#"{{"type":"register","email":"{WATCHED}"}}"#));

    service.start_realtime(WATCHED).unwrap();
    settle().await;

    // Nothing is pushed before the first interval elapses.
    assert!(events_a.try_recv().is_err());

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;

    assert_code_push(events_a.try_recv().expect("subscriber a gets push"));
    assert_code_push(events_b.try_recv().expect("subscriber b gets push"));
    assert!(
        events_c.try_recv().is_err(),
        "unregistered connection gets nothing"
    );

    service.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_each_tick_pushes_again() {
    let service = service();
    let hub = service.hub();

    let (client_id, mut events) = hub.connect();
    let _ = events.recv().await;
    hub.handle_message(
        &client_id,
        &format!(r#"{{"type":"register","email":"{WATCHED}"}}"#),
    );

    service.start_realtime(WATCHED).unwrap();
    settle().await;

    for _ in 0..3 {
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert_code_push(events.try_recv().expect("push on every tick"));
    }

    service.shutdown();
}

// ─────────────────────────────────────────────────────────────────────────────
// Stopping
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_stop_prevents_further_pushes() {
    let service = service();
    let hub = service.hub();

    let (client_id, mut events) = hub.connect();
    let _ = events.recv().await;
    hub.handle_message(
        &client_id,
        &format!(r#"{{"type":"register","email":"{WATCHED}"}}"#),
    );

    service.start_realtime(WATCHED).unwrap();
    settle().await;

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert_code_push(events.try_recv().expect("push while tracked"));

    service.stop(WATCHED);
    assert_eq!(service.stats().active_accounts, 0);

    tokio::time::advance(Duration::from_secs(60)).await;
    settle().await;
    assert!(events.try_recv().is_err(), "no pushes after stop");
}

#[tokio::test(start_paused = true)]
async fn test_disconnected_subscriber_is_pruned_on_broadcast() {
    let service = service();
    let hub = service.hub();

    let (client_id, events) = hub.connect();
    hub.handle_message(
        &client_id,
        &format!(r#"{{"type":"register","email":"{WATCHED}"}}"#),
    );
    drop(events); // client went away without a clean disconnect

    service.start_realtime(WATCHED).unwrap();
    settle().await;

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;

    assert_eq!(service.stats().live_connections, 0);
    service.shutdown();
}
