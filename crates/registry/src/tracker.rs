// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content-hash journal for resource changes.
//!
//! Every observed change is appended to a JSONL journal with a SHA-256
//! content hash, tagged with its origin (filesystem watcher vs tool-driven
//! edit). At startup the journal is compared against the on-disk tree to
//! surface external changes made while the process was down.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

fn epoch_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Who made the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrigin {
    /// Observed by the directory watcher
    Filesystem,
    /// Performed through a management tool while the process was running
    Tool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One journaled change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub path: PathBuf,
    /// Hex SHA-256 of the file contents; empty for removals
    pub sha256: String,
    pub origin: ChangeOrigin,
    pub kind: ChangeKind,
    pub at_ms: u64,
}

/// A change detected at startup that nobody journaled: it happened while
/// the process was down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Journals resource changes and answers the startup external-change diff.
pub struct ResourceChangeTracker {
    journal_path: PathBuf,
    last_seen: parking_lot::Mutex<HashMap<PathBuf, String>>,
}

impl ResourceChangeTracker {
    /// Open (or create) the journal at `path`, replaying it to rebuild the
    /// last-seen hash map. Corrupt lines are skipped with a warning.
    pub fn open(path: &Path) -> Result<Self, TrackerError> {
        let mut last_seen = HashMap::new();
        if path.is_file() {
            let file = std::fs::File::open(path)?;
            for (line_no, line) in BufReader::new(file).lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<ChangeRecord>(&line) {
                    Ok(record) => {
                        if record.kind == ChangeKind::Removed {
                            last_seen.remove(&record.path);
                        } else {
                            last_seen.insert(record.path, record.sha256);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(line = line_no + 1, error = %e, "skipping corrupt journal line");
                    }
                }
            }
        } else if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            journal_path: path.to_path_buf(),
            last_seen: parking_lot::Mutex::new(last_seen),
        })
    }

    /// Hex SHA-256 of file contents.
    pub fn hash_bytes(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    /// Journal a change to `path`. For removals pass `None` contents.
    pub fn record(
        &self,
        path: &Path,
        contents: Option<&[u8]>,
        origin: ChangeOrigin,
    ) -> Result<ChangeRecord, TrackerError> {
        let mut last_seen = self.last_seen.lock();
        let (kind, sha256) = match contents {
            None => (ChangeKind::Removed, String::new()),
            Some(bytes) => {
                let hash = Self::hash_bytes(bytes);
                let kind = if last_seen.contains_key(path) {
                    ChangeKind::Modified
                } else {
                    ChangeKind::Added
                };
                (kind, hash)
            }
        };
        let record = ChangeRecord {
            path: path.to_path_buf(),
            sha256: sha256.clone(),
            origin,
            kind,
            at_ms: epoch_ms_now(),
        };
        if kind == ChangeKind::Removed {
            last_seen.remove(path);
        } else {
            last_seen.insert(path.to_path_buf(), sha256);
        }
        drop(last_seen);
        self.append(&record)?;
        Ok(record)
    }

    fn append(&self, record: &ChangeRecord) -> Result<(), TrackerError> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.journal_path)?;
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        file.write_all(&line)?;
        Ok(())
    }

    /// Compare the on-disk YAML tree against the journal, surfacing
    /// changes made while the process was down.
    pub fn startup_diff(&self, roots: &[PathBuf]) -> Vec<ExternalChange> {
        let last_seen = self.last_seen.lock();
        let mut current = HashMap::new();
        for root in roots {
            collect_yaml_hashes(root, &mut current);
        }

        let mut changes = Vec::new();
        for (path, hash) in &current {
            match last_seen.get(path) {
                None => changes.push(ExternalChange {
                    path: path.clone(),
                    kind: ChangeKind::Added,
                }),
                Some(seen) if seen != hash => changes.push(ExternalChange {
                    path: path.clone(),
                    kind: ChangeKind::Modified,
                }),
                Some(_) => {}
            }
        }
        for path in last_seen.keys() {
            let under_roots = roots.iter().any(|r| path.starts_with(r));
            if under_roots && !current.contains_key(path) {
                changes.push(ExternalChange {
                    path: path.clone(),
                    kind: ChangeKind::Removed,
                });
            }
        }
        changes.sort_by(|a, b| a.path.cmp(&b.path));
        changes
    }
}

fn collect_yaml_hashes(dir: &Path, out: &mut HashMap<PathBuf, String>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        if path.is_dir() {
            collect_yaml_hashes(&path, out);
        } else if path.extension().is_some_and(|e| e == "yaml" || e == "yml") {
            if let Ok(bytes) = std::fs::read(&path) {
                out.insert(path, ResourceChangeTracker::hash_bytes(&bytes));
            }
        }
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
