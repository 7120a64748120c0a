// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL session journal with append-or-replace semantics.
//!
//! Each line is one record: a `put` carrying a full session snapshot or a
//! `delete` tombstone. Replay applies lines in order; the final state per
//! session ID wins. When tombstones and superseded puts outnumber live
//! entries the file is rewritten with live entries only.

use crate::store::StoredSession;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Dead records tolerated before a compaction rewrite.
const COMPACT_THRESHOLD: usize = 64;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One journal line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum JournalRecord {
    Put { session: StoredSession },
    Delete { session_id: String },
}

/// Append-or-replace session journal.
pub struct Journal {
    path: PathBuf,
    file: File,
    /// Records superseded by later puts or deletes
    dead: usize,
}

impl Journal {
    /// Open the journal, replaying existing records. Corrupt lines are
    /// skipped with a warning. Returns the journal and the live sessions.
    pub fn open(path: &Path) -> Result<(Self, HashMap<String, StoredSession>), JournalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut live: HashMap<String, StoredSession> = HashMap::new();
        let mut dead = 0usize;
        if path.is_file() {
            let reader = BufReader::new(File::open(path)?);
            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<JournalRecord>(&line) {
                    Ok(JournalRecord::Put { session }) => {
                        let id = session.blueprint.session_id.as_str().to_string();
                        if live.insert(id, session).is_some() {
                            dead += 1;
                        }
                    }
                    Ok(JournalRecord::Delete { session_id }) => {
                        if live.remove(&session_id).is_some() {
                            dead += 2;
                        } else {
                            dead += 1;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            line = line_no + 1,
                            error = %e,
                            "skipping corrupt session journal line"
                        );
                    }
                }
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok((
            Self {
                path: path.to_path_buf(),
                file,
                dead,
            },
            live,
        ))
    }

    pub fn append_put(&mut self, session: &StoredSession, superseded: bool) -> Result<(), JournalError> {
        if superseded {
            self.dead += 1;
        }
        self.append(&JournalRecord::Put {
            session: session.clone(),
        })
    }

    pub fn append_delete(&mut self, session_id: &str) -> Result<(), JournalError> {
        self.dead += 2;
        self.append(&JournalRecord::Delete {
            session_id: session_id.to_string(),
        })
    }

    fn append(&mut self, record: &JournalRecord) -> Result<(), JournalError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn needs_compaction(&self) -> bool {
        self.dead > COMPACT_THRESHOLD
    }

    /// Rewrite the journal with live entries only.
    pub fn compact(&mut self, live: &HashMap<String, StoredSession>) -> Result<(), JournalError> {
        let tmp_path = self.path.with_extension("jsonl.tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            for session in live.values() {
                let mut line = serde_json::to_vec(&JournalRecord::Put {
                    session: session.clone(),
                })?;
                line.push(b'\n');
                tmp.write_all(&line)?;
            }
            tmp.flush()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.dead = 0;
        tracing::debug!(entries = live.len(), "session journal compacted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
