// Session driver: resolve -> connect -> (per message) decode -> reconcile -> redraw.
// Everything runs on one task; one message is fully applied before the next is read.

use crate::config::AppConfig;
use crate::decoder::decode_batch;
use crate::endpoint::{EndpointResolver, PageOrigin};
use crate::error::MonitorError;
use crate::reconciler::{ReconcileSummary, TableReconciler};
use crate::reconnect::Backoff;
use crate::render::render_frame;
use crate::stream::{StreamConnection, stream_url};
use crate::table::Document;
use std::io::Write;
use std::time::Instant;
use tokio::sync::oneshot;
use tokio::time::{Duration, Interval, interval_at};

/// How often staleness is re-evaluated between batches, including while reconnecting.
const STALE_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Counters reported in the periodic stats log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub batches_applied: u64,
    pub batches_dropped: u64,
    pub reconnects: u64,
}

enum StreamEnd {
    Disconnected,
    Shutdown,
}

pub struct Monitor<W: Write> {
    config: AppConfig,
    document: Document,
    reconciler: TableReconciler,
    output: W,
    stats: SessionStats,
}

impl<W: Write> Monitor<W> {
    /// `document` must already contain the table body named by `monitor.table_id`.
    pub fn new(config: AppConfig, document: Document, output: W) -> Self {
        let reconciler = TableReconciler::new(
            config.monitor.table_id.clone(),
            config.display.stale_after(),
        );
        Self {
            config,
            document,
            reconciler,
            output,
            stats: SessionStats::default(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Flag rows that stopped reporting, without waiting for a batch. Redraws when
    /// any row changed. Returns the number of rows newly flagged.
    pub fn sweep_stale_at(&mut self, now: Instant) -> usize {
        match self.reconciler.sweep_stale(&mut self.document, now) {
            Ok(0) => 0,
            Ok(marked) => {
                tracing::debug!(rows_marked = marked, "Rows went stale");
                self.redraw();
                marked
            }
            Err(e) => {
                tracing::debug!(error = %e, operation = "sweep_stale", "Stale sweep skipped");
                0
            }
        }
    }

    fn sweep_stale(&mut self) {
        self.sweep_stale_at(Instant::now());
    }

    /// Decode and apply one payload, then redraw. Decode and reconcile failures drop
    /// the batch and leave the table as it was.
    pub fn handle_payload(&mut self, payload: &str) -> Option<ReconcileSummary> {
        self.handle_payload_at(payload, Instant::now())
    }

    pub fn handle_payload_at(&mut self, payload: &str, now: Instant) -> Option<ReconcileSummary> {
        let batch = match decode_batch(payload) {
            Ok(batch) => batch,
            Err(e) => {
                self.stats.batches_dropped += 1;
                tracing::warn!(
                    error = %e,
                    operation = "decode_batch",
                    payload_len = payload.len(),
                    "Dropping undecodable batch"
                );
                return None;
            }
        };
        match self.reconciler.reconcile(&mut self.document, &batch, now) {
            Ok(summary) => {
                self.stats.batches_applied += 1;
                tracing::debug!(
                    records = batch.len(),
                    rows_created = summary.rows_created,
                    rows_updated = summary.rows_updated,
                    records_skipped = summary.records_skipped,
                    rows_stale = summary.rows_stale,
                    "Batch applied"
                );
                self.redraw();
                Some(summary)
            }
            Err(e) => {
                self.stats.batches_dropped += 1;
                tracing::debug!(error = %e, operation = "reconcile", "Batch not applied");
                None
            }
        }
    }

    /// Run until shutdown, or until the stream ends when reconnecting is disabled.
    /// Returns the final document.
    ///
    /// Startup is strict: a missing table body, a bad origin or a failed first
    /// `/baseurl` request ends the session with an error before any socket is opened.
    pub async fn run(
        mut self,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<Document, MonitorError> {
        let table_id = self.reconciler.body_id().to_string();
        if self.document.table_body(&table_id).is_none() {
            tracing::error!(table_id = %table_id, "table body element missing");
            return Err(MonitorError::MissingContainerElement(table_id));
        }

        let origin = PageOrigin::parse(&self.config.monitor.origin)?;
        let resolver = EndpointResolver::new(
            origin,
            Duration::from_millis(self.config.monitor.resolve_timeout_ms),
        )?;
        let base = tokio::select! {
            _ = &mut shutdown_rx => return Ok(self.document),
            r = resolver.resolve() => r?,
        };
        let mut url = stream_url(resolver.origin(), &base);

        let reconnect_enabled = self.config.reconnect.enabled;
        let mut backoff = Backoff::new(self.config.reconnect.clone());
        let stats_period = Duration::from_secs(self.config.monitor.stats_log_interval_secs);
        let mut stats_tick = interval_at(tokio::time::Instant::now() + stats_period, stats_period);
        stats_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut sweep_tick = interval_at(
            tokio::time::Instant::now() + STALE_SWEEP_INTERVAL,
            STALE_SWEEP_INTERVAL,
        );
        sweep_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::info!(table_id = %table_id, url = %url, "Monitoring stats stream");

        loop {
            let opened = tokio::select! {
                _ = &mut shutdown_rx => return Ok(self.document),
                r = StreamConnection::open(&url) => r,
            };
            match opened {
                Ok(mut conn) => {
                    backoff.reset();
                    match self
                        .consume(&mut conn, &mut shutdown_rx, &mut stats_tick, &mut sweep_tick)
                        .await
                    {
                        StreamEnd::Shutdown => return Ok(self.document),
                        StreamEnd::Disconnected => {}
                    }
                }
                Err(e) if !reconnect_enabled => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, operation = "open_stream", "Stream connection failed");
                }
            }

            if !reconnect_enabled {
                tracing::info!("Stats stream ended; reconnecting is disabled");
                return Ok(self.document);
            }
            match self
                .reconnect(&resolver, &mut backoff, &mut shutdown_rx, &mut sweep_tick)
                .await
            {
                Some(next_url) => url = next_url,
                None => return Ok(self.document),
            }
        }
    }

    /// Back off, then re-run endpoint resolution until it succeeds. Rows keep going
    /// stale meanwhile. `None` on shutdown.
    async fn reconnect(
        &mut self,
        resolver: &EndpointResolver,
        backoff: &mut Backoff,
        shutdown_rx: &mut oneshot::Receiver<()>,
        sweep_tick: &mut Interval,
    ) -> Option<String> {
        loop {
            let delay = backoff.next();
            tracing::info!(
                attempt = backoff.attempt(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Reconnecting to stats stream"
            );
            let sleep = tokio::time::sleep(delay);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    _ = &mut *shutdown_rx => return None,
                    _ = sweep_tick.tick() => self.sweep_stale(),
                    _ = &mut sleep => break,
                }
            }
            self.stats.reconnects += 1;

            let resolve = resolver.resolve();
            tokio::pin!(resolve);
            let resolved = loop {
                tokio::select! {
                    _ = &mut *shutdown_rx => return None,
                    _ = sweep_tick.tick() => self.sweep_stale(),
                    r = &mut resolve => break r,
                }
            };
            match resolved {
                Ok(base) => return Some(stream_url(resolver.origin(), &base)),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        operation = "resolve_endpoint",
                        "Reconnect attempt {} failed",
                        backoff.attempt()
                    );
                }
            }
        }
    }

    async fn consume(
        &mut self,
        conn: &mut StreamConnection,
        shutdown_rx: &mut oneshot::Receiver<()>,
        stats_tick: &mut Interval,
        sweep_tick: &mut Interval,
    ) -> StreamEnd {
        loop {
            tokio::select! {
                _ = &mut *shutdown_rx => {
                    tracing::debug!("Monitor shutting down");
                    return StreamEnd::Shutdown;
                }
                _ = stats_tick.tick() => self.log_stats(),
                _ = sweep_tick.tick() => self.sweep_stale(),
                payload = conn.next_payload() => match payload {
                    Ok(Some(text)) => {
                        self.handle_payload(&text);
                    }
                    Ok(None) => return StreamEnd::Disconnected,
                    Err(e) => {
                        tracing::warn!(error = %e, url = conn.url(), "Stats stream dropped");
                        return StreamEnd::Disconnected;
                    }
                },
            }
        }
    }

    fn log_stats(&self) {
        let rows = self
            .document
            .table_body(self.reconciler.body_id())
            .map_or(0, |b| b.len());
        tracing::info!(
            batches_applied = self.stats.batches_applied,
            batches_dropped = self.stats.batches_dropped,
            reconnects = self.stats.reconnects,
            rows,
            "session stats"
        );
    }

    fn redraw(&mut self) {
        let Some(body) = self.document.table_body(self.reconciler.body_id()) else {
            return;
        };
        let updated_at = chrono::Local::now().format("%H:%M:%S").to_string();
        let frame = render_frame(body, &updated_at, self.config.display.clear_screen);
        if let Err(e) = self
            .output
            .write_all(frame.as_bytes())
            .and_then(|_| self.output.flush())
        {
            tracing::warn!(error = %e, operation = "redraw", "Writing table failed");
        }
    }
}
