// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Published city catalog feed and Google Sheets lead sink.
//!
//! [`CityCatalog`] serves the cities/listings menus from the cooperative's
//! published vacancy sheet (CSV export, cached, served stale on fetch
//! failure). [`SheetSink`] appends finished leads to the operator
//! spreadsheet following its live header row.

pub mod append;
pub mod feed;

pub use append::SheetSink;
pub use feed::CityCatalog;
