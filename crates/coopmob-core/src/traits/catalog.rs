// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job-catalog port sourcing open positions from the spreadsheet feed.

use async_trait::async_trait;

use crate::error::CoopmobError;
use crate::types::Listing;

/// Port over the open-positions directory (city -> listings).
///
/// Errors from the feed are soft at the funnel layer: the caller treats
/// "cannot fetch" as "no cities available" and keeps the conversation alive.
#[async_trait]
pub trait CatalogPort: Send + Sync {
    /// Canonical names of cities that currently have open listings, sorted.
    async fn open_cities(&self) -> Result<Vec<String>, CoopmobError>;

    /// Resolves a user-entered label to its canonical city name.
    ///
    /// Matching is case-insensitive and exact after trimming; substrings do
    /// not match.
    async fn match_city(&self, label: &str) -> Result<Option<String>, CoopmobError>;

    /// Open listings for a canonical city name (case-insensitive exact match).
    async fn listings_for(&self, city: &str) -> Result<Vec<Listing>, CoopmobError>;
}
