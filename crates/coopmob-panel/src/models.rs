// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the panel's storage entities.

use serde::{Deserialize, Serialize};

/// A recruiting lead as stored in the `leads` table.
///
/// `phone` is the unique natural key; upserts resolve against it. `step` and
/// `status` start at the schema defaults (`INTRO` / `NEW`) and are advanced
/// by panel operators, not by this API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub created_at: String,
    pub name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub city: Option<String>,
    pub source: Option<String>,
    pub step: String,
    pub status: String,
    pub owner: Option<String>,
    pub form_token: Option<String>,
}

/// An audit-trail entry in the `events` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub ts: String,
    pub actor: String,
    pub kind: String,
    pub lead_id: Option<i64>,
    pub payload: Option<String>,
}
