// SPDX-FileCopyrightText: 2026 CoopMob Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead-record sink port for the external spreadsheet.

use async_trait::async_trait;

use crate::error::CoopmobError;
use crate::types::LeadRecord;

/// Port over the credentialed spreadsheet sink for finished leads.
///
/// Sinks are attempted independently of the durable-log write; a failure
/// here is logged by the recorder and never blocks the funnel.
#[async_trait]
pub trait LeadSink: Send + Sync {
    /// Appends one lead row, mapped to the sheet's existing header order.
    async fn append_lead(
        &self,
        record: &LeadRecord,
        analysis: Option<&str>,
    ) -> Result<(), CoopmobError>;
}
