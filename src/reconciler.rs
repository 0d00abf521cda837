// Batch -> table body reconciliation.
// Rows are created once per identity and appended; cells are only written when the
// snapshot carries their field(s), so a missing field never clears a cell.

use crate::error::MonitorError;
use crate::models::ContainerSnapshot;
use crate::table::{Column, Document, Row, TableBody};
use crate::units::{format_byte_pair, format_percent};
use std::time::{Duration, Instant};

/// What one reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub rows_created: usize,
    pub rows_updated: usize,
    /// Records dropped for lack of a usable identity.
    pub records_skipped: usize,
    /// Rows flagged stale after this pass.
    pub rows_stale: usize,
}

pub struct TableReconciler {
    body_id: String,
    stale_after: Option<Duration>,
    missing_reported: bool,
}

impl TableReconciler {
    /// Reconciles into the table body element `body_id`. With `stale_after` set, rows
    /// not refreshed for that long are flagged stale (never removed).
    pub fn new(body_id: impl Into<String>, stale_after: Option<Duration>) -> Self {
        Self {
            body_id: body_id.into(),
            stale_after,
            missing_reported: false,
        }
    }

    pub fn body_id(&self) -> &str {
        &self.body_id
    }

    /// Apply one batch, in order, to the document's table body.
    ///
    /// Fails with `MissingContainerElement` when the body is absent; that is logged
    /// only on the first occurrence.
    pub fn reconcile(
        &mut self,
        document: &mut Document,
        batch: &[ContainerSnapshot],
        now: Instant,
    ) -> Result<ReconcileSummary, MonitorError> {
        let Some(body) = document.table_body_mut(&self.body_id) else {
            if !self.missing_reported {
                tracing::error!(
                    table_id = %self.body_id,
                    operation = "reconcile",
                    "table body element missing; rows cannot be created"
                );
                self.missing_reported = true;
            }
            return Err(MonitorError::MissingContainerElement(self.body_id.clone()));
        };

        let mut summary = ReconcileSummary::default();
        for snapshot in batch {
            let Some(identity) = snapshot.identity() else {
                tracing::warn!(
                    id = snapshot.id.as_deref().unwrap_or(""),
                    name = snapshot.name.as_deref().unwrap_or(""),
                    "skipping snapshot without a usable name"
                );
                summary.records_skipped += 1;
                continue;
            };
            if ensure_row(body, identity, now) {
                summary.rows_created += 1;
            } else {
                summary.rows_updated += 1;
            }
            apply_snapshot(body, identity, snapshot, now);
        }

        if let Some(stale_after) = self.stale_after {
            summary.rows_stale = mark_stale_rows(body, now, stale_after).1;
        }
        Ok(summary)
    }

    /// Re-evaluate staleness without a batch, e.g. while the stream is down.
    /// Returns how many rows were newly flagged.
    pub fn sweep_stale(
        &mut self,
        document: &mut Document,
        now: Instant,
    ) -> Result<usize, MonitorError> {
        let Some(stale_after) = self.stale_after else {
            return Ok(0);
        };
        let body = document
            .table_body_mut(&self.body_id)
            .ok_or_else(|| MonitorError::MissingContainerElement(self.body_id.clone()))?;
        Ok(mark_stale_rows(body, now, stale_after).0)
    }
}

/// Create the row for `identity` if it is not there yet. Returns whether it was created.
fn ensure_row(body: &mut TableBody, identity: &str, now: Instant) -> bool {
    if body.row(identity).is_some() {
        return false;
    }
    tracing::debug!(identity, "new container row");
    body.append_row(Row::new(identity, now))
}

fn apply_snapshot(body: &mut TableBody, identity: &str, s: &ContainerSnapshot, now: Instant) {
    for column in Column::ALL {
        if let Some(text) = display_text(column, identity, s) {
            body.set_cell(identity, column, text);
        }
    }
    if let Some(row) = body.row_mut(identity) {
        row.touch(now);
    }
}

/// Display string for one column, or `None` when the snapshot does not carry it.
/// Paired columns need both halves.
pub fn display_text(column: Column, identity: &str, s: &ContainerSnapshot) -> Option<String> {
    match column {
        Column::Name => Some(identity.to_string()),
        Column::Cpu => s.cpu_percent.map(format_percent),
        Column::Mem => pair(s.memory_used_bytes, s.memory_limit_bytes),
        Column::MemPerc => s.memory_percent.map(format_percent),
        Column::Net => pair(s.net_in_bytes, s.net_out_bytes),
        Column::Block => pair(s.block_in_bytes, s.block_out_bytes),
    }
}

fn pair(a: Option<f64>, b: Option<f64>) -> Option<String> {
    Some(format_byte_pair(a?, b?))
}

/// Flag rows not seen for `stale_after`. Returns (newly flagged, stale in total).
fn mark_stale_rows(body: &mut TableBody, now: Instant, stale_after: Duration) -> (usize, usize) {
    let (mut newly, mut stale) = (0, 0);
    for row in body.rows_mut() {
        if !row.is_stale() && now.saturating_duration_since(row.last_seen()) >= stale_after {
            tracing::debug!(identity = row.id(), "container stopped reporting");
            row.mark_stale();
            newly += 1;
        }
        if row.is_stale() {
            stale += 1;
        }
    }
    (newly, stale)
}
