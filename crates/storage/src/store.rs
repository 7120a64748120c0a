// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory session store with journal persistence, CAS, and TTL eviction.

use crate::journal::{Journal, JournalError};
use parking_lot::Mutex;
use px_core::{Clock, SessionBlueprint};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// A blueprint plus store bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub blueprint: SessionBlueprint,
    /// Bumped on every successful write; CAS checks `current_step`, the
    /// version exists for diagnostics
    pub version: u64,
    pub touched_at_ms: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("current step conflict for {session_id}: expected {expected}, found {actual}")]
    Conflict {
        session_id: String,
        expected: u32,
        actual: u32,
    },
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),
}

struct StoreInner {
    sessions: HashMap<String, StoredSession>,
    journal: Option<Journal>,
}

/// The chain session store.
pub struct SessionStore<C: Clock> {
    inner: Mutex<StoreInner>,
    ttl_ms: u64,
    clock: C,
}

impl<C: Clock> SessionStore<C> {
    /// Pure in-memory store (no persistence).
    pub fn in_memory(ttl: Duration, clock: C) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                sessions: HashMap::new(),
                journal: None,
            }),
            ttl_ms: ttl.as_millis() as u64,
            clock,
        }
    }

    /// Journal-backed store; replays existing sessions on open.
    pub fn open(path: &Path, ttl: Duration, clock: C) -> Result<Self, StoreError> {
        let (journal, sessions) = Journal::open(path)?;
        Ok(Self {
            inner: Mutex::new(StoreInner {
                sessions,
                journal: Some(journal),
            }),
            ttl_ms: ttl.as_millis() as u64,
            clock,
        })
    }

    /// Fetch a blueprint by session ID. Expired entries are evicted on
    /// touch and read as absent.
    pub fn get(&self, session_id: &str) -> Option<SessionBlueprint> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();
        if self.expired(inner.sessions.get(session_id)?, now) {
            Self::remove_locked(&mut inner, session_id);
            return None;
        }
        inner
            .sessions
            .get(session_id)
            .map(|s| s.blueprint.clone())
    }

    /// Fetch by the caller-facing chain ID. Sessions parked in
    /// `pending_review` are dormant and only returned when asked for.
    pub fn get_by_chain_id(
        &self,
        chain_id: &str,
        include_dormant: bool,
    ) -> Option<SessionBlueprint> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();
        let key = inner
            .sessions
            .iter()
            .find(|(_, s)| s.blueprint.chain_id.as_str() == chain_id)
            .map(|(k, _)| k.clone())?;
        if self.expired(&inner.sessions[&key], now) {
            Self::remove_locked(&mut inner, &key);
            return None;
        }
        let session = &inner.sessions[&key];
        if session.blueprint.pending_review && !include_dormant {
            return None;
        }
        Some(session.blueprint.clone())
    }

    /// Insert or replace a blueprint unconditionally.
    pub fn put(&self, blueprint: SessionBlueprint) -> Result<(), StoreError> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();
        let key = blueprint.session_id.as_str().to_string();
        let version = inner
            .sessions
            .get(&key)
            .map(|s| s.version + 1)
            .unwrap_or(1);
        let superseded = inner.sessions.contains_key(&key);
        let session = StoredSession {
            blueprint,
            version,
            touched_at_ms: now,
        };
        inner.sessions.insert(key, session.clone());
        Self::journal_put(&mut inner, &session, superseded)?;
        Ok(())
    }

    /// Atomic compare-and-swap on the session's `current_step`.
    ///
    /// Succeeds only when the stored blueprint's `current_step` equals
    /// `expected_current_step`; the loser of a concurrent resume gets a
    /// `Conflict` and must re-read before retrying.
    pub fn compare_and_swap(
        &self,
        session_id: &str,
        expected_current_step: u32,
        new_blueprint: SessionBlueprint,
    ) -> Result<(), StoreError> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();
        let current = inner
            .sessions
            .get(session_id)
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))?;
        let actual = current.blueprint.current_step;
        if actual != expected_current_step {
            return Err(StoreError::Conflict {
                session_id: session_id.to_string(),
                expected: expected_current_step,
                actual,
            });
        }
        let session = StoredSession {
            blueprint: new_blueprint,
            version: current.version + 1,
            touched_at_ms: now,
        };
        inner.sessions.insert(session_id.to_string(), session.clone());
        Self::journal_put(&mut inner, &session, true)?;
        Ok(())
    }

    /// Delete a blueprint; a no-op when absent.
    pub fn delete(&self, session_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        Ok(Self::remove_locked(&mut inner, session_id))
    }

    /// The chain-global variable namespace accumulated by a session.
    pub fn chain_context(&self, session_id: &str) -> Option<HashMap<String, String>> {
        self.get(session_id).map(|bp| bp.variables)
    }

    /// Evict entries older than the TTL. Returns how many were dropped.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();
        let expired: Vec<String> = inner
            .sessions
            .iter()
            .filter(|(_, s)| self.expired(s, now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            Self::remove_locked(&mut inner, key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().sessions.is_empty()
    }

    fn expired(&self, session: &StoredSession, now_ms: u64) -> bool {
        self.ttl_ms > 0 && session.touched_at_ms.saturating_add(self.ttl_ms) < now_ms
    }

    fn remove_locked(inner: &mut StoreInner, session_id: &str) -> bool {
        let removed = inner.sessions.remove(session_id).is_some();
        if removed {
            if let Some(journal) = inner.journal.as_mut() {
                if let Err(e) = journal.append_delete(session_id) {
                    tracing::warn!(%session_id, error = %e, "failed to journal session delete");
                }
            }
            Self::maybe_compact(inner);
        }
        removed
    }

    fn journal_put(
        inner: &mut StoreInner,
        session: &StoredSession,
        superseded: bool,
    ) -> Result<(), StoreError> {
        if let Some(journal) = inner.journal.as_mut() {
            journal.append_put(session, superseded)?;
        }
        Self::maybe_compact(inner);
        Ok(())
    }

    fn maybe_compact(inner: &mut StoreInner) {
        let needs = inner
            .journal
            .as_ref()
            .is_some_and(Journal::needs_compaction);
        if !needs {
            return;
        }
        let sessions = inner.sessions.clone();
        if let Some(journal) = inner.journal.as_mut() {
            if let Err(e) = journal.compact(&sessions) {
                tracing::warn!(error = %e, "session journal compaction failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
