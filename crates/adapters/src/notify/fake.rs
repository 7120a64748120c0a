// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording notification adapter for tests.

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// One recorded notify call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyCall {
    pub title: String,
    pub message: String,
}

/// Adapter that records every call; optionally fails on demand.
#[derive(Clone, Default)]
pub struct FakeNotifyAdapter {
    calls: Arc<Mutex<Vec<NotifyCall>>>,
    fail: Arc<Mutex<bool>>,
}

impl FakeNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<NotifyCall> {
        self.calls.lock().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.title.clone()).collect()
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock() = fail;
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotifyAdapter {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        self.calls.lock().push(NotifyCall {
            title: title.to_string(),
            message: message.to_string(),
        });
        if *self.fail.lock() {
            return Err(NotifyError::SendFailed("forced failure".to_string()));
        }
        Ok(())
    }
}
