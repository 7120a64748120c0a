// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use px_adapters::FakeNotifyAdapter;

fn event(chain: &str) -> NotificationEvent {
    NotificationEvent::ChainComplete {
        chain_id: chain.to_string(),
    }
}

#[tokio::test]
async fn events_reach_the_adapter() {
    let adapter = FakeNotifyAdapter::new();
    let (sender, handle) = spawn_notify_task(adapter.clone());
    sender.send(event("c1"));
    sender.send(NotificationEvent::GateFailed {
        gate_id: "quality".to_string(),
        chain_id: None,
        reasons: vec!["too short".to_string()],
    });
    drop(sender);
    handle.await.unwrap();

    let titles = adapter.titles();
    assert_eq!(titles, vec!["chain_complete", "gate_failed"]);
    assert!(adapter.calls()[1].message.contains("too short"));
}

#[tokio::test]
async fn adapter_failures_never_propagate() {
    let adapter = FakeNotifyAdapter::new();
    adapter.set_fail(true);
    let (sender, handle) = spawn_notify_task(adapter.clone());
    sender.send(event("c1"));
    drop(sender);
    handle.await.unwrap();
    assert_eq!(adapter.calls().len(), 1);
}

#[tokio::test]
async fn disabled_sender_drops_everything() {
    let sender = NotificationSender::disabled();
    // No panic, no effect
    sender.send(event("c1"));
}

#[tokio::test]
async fn full_channel_drops_instead_of_blocking() {
    let (tx, rx) = tokio::sync::mpsc::channel(1);
    let sender = NotificationSender::new(tx);
    sender.send(event("first"));
    sender.send(event("second")); // dropped, channel full
    drop(sender);

    let mut rx = rx;
    let mut received = Vec::new();
    while let Some(e) = rx.recv().await {
        received.push(e);
    }
    assert_eq!(received.len(), 1);
}
