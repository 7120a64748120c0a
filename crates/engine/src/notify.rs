// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification emission.
//!
//! Events travel over a bounded channel with `try_send`: when the channel
//! is full they are dropped. Events are observability, not protocol; the
//! forwarding task logs adapter failures and never surfaces them.

use px_adapters::NotifyAdapter;
use px_core::NotificationEvent;
use tokio::sync::mpsc;

/// Default channel capacity before events are dropped.
pub const NOTIFY_CHANNEL_CAPACITY: usize = 64;

/// Non-blocking event sender handed to the engine.
#[derive(Clone)]
pub struct NotificationSender {
    tx: Option<mpsc::Sender<NotificationEvent>>,
}

impl NotificationSender {
    /// A sender that silently drops everything (tests, headless runs).
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn new(tx: mpsc::Sender<NotificationEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Best-effort send; drops on a full or closed channel.
    pub fn send(&self, event: NotificationEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        if let Err(e) = tx.try_send(event) {
            tracing::debug!(error = %e, "notification dropped");
        }
    }
}

/// Spawn the forwarding task for an adapter. Returns the sender and the
/// task handle (dropping the sender ends the task).
pub fn spawn_notify_task<N: NotifyAdapter>(
    adapter: N,
) -> (NotificationSender, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<NotificationEvent>(NOTIFY_CHANNEL_CAPACITY);
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let title = event.name().to_string();
            let message = serde_json::to_string(&event).unwrap_or_default();
            if let Err(e) = adapter.notify(&title, &message).await {
                tracing::warn!(%title, error = %e, "notification adapter failed");
            }
        }
    });
    (NotificationSender::new(tx), handle)
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
