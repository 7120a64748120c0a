// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier folding for case-insensitive registry lookup

/// Fold a prompt/gate/style/framework identifier for lookup.
///
/// Registry lookup is case-insensitive by both ID and name; every map key
/// goes through this fold before insertion and before lookup.
pub fn fold_id(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}
