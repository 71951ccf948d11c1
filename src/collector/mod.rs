//! Periodic polling of station status into the append-only logs.

mod schedule;

pub use schedule::Schedule;

use crate::fetch::RetryPolicy;
use crate::gbfs::StatusFeed;
use crate::services::StationSource;
use crate::store::{AppendOutcome, IndexEntry, Layout};
use anyhow::Result;
use std::future::Future;
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

/// What one polling cycle wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Stations with a newer snapshot, now appended.
    pub appended: usize,
    /// Stations whose stored snapshot was already current.
    pub unchanged: usize,
    /// Stations skipped for an unusable id.
    pub rejected: usize,
    /// Stations whose log could not be read or written this cycle.
    pub failed: usize,
    /// Whether the batch timestamp was added to the global index.
    pub index_advanced: bool,
}

pub struct Collector<S> {
    source: S,
    layout: Layout,
    retry: RetryPolicy,
}

impl<S: StationSource> Collector<S> {
    pub fn new(source: S, layout: Layout, retry: RetryPolicy) -> Self {
        Self {
            source,
            layout,
            retry,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Makes sure the data directory exists and, when there is no index yet,
    /// runs one cycle so every station file and the index exist before the
    /// loop starts. Returns the bootstrap report, if one ran and succeeded.
    ///
    /// A failed bootstrap is logged and left to the first regular cycle.
    pub async fn setup(&self) -> Result<Option<CycleReport>> {
        self.layout.prepare()?;
        if self.layout.index().exists() {
            debug!("Index present, no bootstrap needed");
            return Ok(None);
        }

        info!("Index missing, running bootstrap pass");
        match self.poll_once().await {
            Ok(report) => {
                info!(appended = report.appended, "Bootstrap complete");
                Ok(Some(report))
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Bootstrap failed, continuing with the regular loop");
                Ok(None)
            }
        }
    }

    /// Fetches one status batch (with retries) and records it.
    pub async fn poll_once(&self) -> Result<CycleReport> {
        let feed = self
            .retry
            .run("station status fetch", || self.source.station_status())
            .await?;
        self.record(&feed)
    }

    /// Appends every station whose snapshot is newer than its stored tail,
    /// and the batch timestamp if it is newer than the index tail.
    pub fn record(&self, feed: &StatusFeed) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        let index_outcome = self
            .layout
            .index()
            .append_if_newer(&IndexEntry(feed.last_updated))?;
        report.index_advanced = matches!(index_outcome, AppendOutcome::Appended { .. });

        for station in &feed.stations {
            let log = match self.layout.station_log(&station.station_id) {
                Ok(log) => log,
                Err(e) => {
                    warn!(error = %e, "Skipping station");
                    report.rejected += 1;
                    continue;
                }
            };

            match log.append_if_newer(station) {
                Ok(AppendOutcome::Appended { .. }) => report.appended += 1,
                Ok(AppendOutcome::Unchanged { .. }) => report.unchanged += 1,
                Err(e) => {
                    warn!(station_id = %station.station_id, error = %e, "Failed to log station");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Polls on every `schedule` boundary until `cycles` have run (0 runs
    /// forever) or `shutdown` resolves. A failed cycle is logged and the loop
    /// waits for the next boundary. Returns the number of cycles run.
    #[tracing::instrument(skip(self, shutdown), fields(period_secs = schedule.period().as_secs()))]
    pub async fn run(
        &self,
        schedule: Schedule,
        cycles: usize,
        shutdown: impl Future<Output = ()>,
    ) -> Result<usize> {
        tokio::pin!(shutdown);

        let mut completed = 0;
        while cycles == 0 || completed < cycles {
            let wait = schedule.until_next(SystemTime::now());
            debug!(wait_ms = wait.as_millis() as u64, "Waiting for next tick");

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested during cycle");
                    break;
                }
                result = self.poll_once() => match result {
                    Ok(report) => info!(
                        appended = report.appended,
                        unchanged = report.unchanged,
                        rejected = report.rejected,
                        failed = report.failed,
                        index_advanced = report.index_advanced,
                        "Cycle complete"
                    ),
                    Err(e) => error!(error = %format!("{:#}", e), "Cycle failed, waiting for next tick"),
                }
            }

            completed += 1;
        }

        Ok(completed)
    }
}
