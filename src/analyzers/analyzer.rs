use crate::analyzers::aggregate::aggregate_station;
use crate::analyzers::types::{OccupancyClass, StationAverage, StationReport};
use crate::gbfs::StationGeo;
use crate::store::{Layout, station_order};
use crate::window::{TimeWindow, resolve_window};
use anyhow::{Context, Result};
use std::num::{NonZeroU32, NonZeroUsize};
use tracing::{debug, info, warn};

/// Knobs for one aggregation pass.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisSettings {
    pub bucket_width: NonZeroU32,
    /// Fine buckets per hourly window.
    pub hourly_buckets: NonZeroUsize,
    /// At most this many stations are processed, in station order.
    pub max_stations: usize,
}

/// Per-station results over one collection window.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub window: TimeWindow,
    pub settings: AnalysisSettings,
    pub stations: Vec<StationReport>,
}

impl Analysis {
    /// Summary rows for every station that logged data.
    pub fn averages(&self) -> Vec<StationAverage> {
        self.stations
            .iter()
            .filter_map(|s| {
                s.occupancy.average().map(|average| StationAverage {
                    station_id: s.station_id.clone(),
                    average,
                })
            })
            .collect()
    }

    /// Seconds covered by one hourly window.
    pub fn hourly_window_secs(&self) -> i64 {
        i64::from(self.settings.bucket_width.get()) * self.settings.hourly_buckets.get() as i64
    }

    /// Length of the longest hourly series.
    pub fn hourly_len(&self) -> usize {
        self.stations.iter().map(|s| s.hourly.len()).max().unwrap_or(0)
    }
}

/// Reads the index window, then every station log once, and derives all
/// per-station metrics.
///
/// Stations are the union of those named in `geo` and those with a log file
/// in the data directory.
#[tracing::instrument(skip(layout, geo), fields(geo_stations = geo.len()))]
pub fn analyze(
    layout: &Layout,
    geo: &[StationGeo],
    settings: AnalysisSettings,
) -> Result<Analysis> {
    let window = resolve_window(&layout.index()).context("Failed to resolve collection window")?;
    info!(
        start = window.start,
        end = window.end,
        buckets = window.bucket_count(settings.bucket_width),
        "Collection window"
    );

    let mut station_ids: Vec<String> = geo.iter().map(|g| g.station_id.clone()).collect();
    station_ids.extend(layout.station_ids()?);
    station_ids.sort_by(|a, b| station_order(a, b));
    station_ids.dedup();
    if station_ids.len() > settings.max_stations {
        warn!(
            found = station_ids.len(),
            max_stations = settings.max_stations,
            "Station limit reached, ignoring the rest"
        );
        station_ids.truncate(settings.max_stations);
    }

    let mut stations = Vec::with_capacity(station_ids.len());
    for station_id in &station_ids {
        let log = match layout.station_log(station_id) {
            Ok(log) => log,
            Err(e) => {
                warn!(station_id = %station_id, error = %e, "Skipping station");
                continue;
            }
        };

        let state = log
            .read_all()
            .with_context(|| format!("Failed to read log for station {}", station_id))?;
        let report = aggregate_station(
            station_id,
            &state,
            &window,
            settings.bucket_width,
            settings.hourly_buckets,
        );

        if report.malformed > 0 {
            warn!(station_id = %station_id, malformed = report.malformed, "Station log has malformed lines");
        }
        debug!(station_id = %station_id, occupancy = ?report.occupancy, "Station aggregated");
        stations.push(report);
    }

    let no_data = stations
        .iter()
        .filter(|s| s.occupancy == OccupancyClass::NoData)
        .count();
    let always_empty = stations
        .iter()
        .filter(|s| s.occupancy == OccupancyClass::AlwaysEmpty)
        .count();
    info!(
        stations = stations.len(),
        no_data, always_empty, "Aggregation complete"
    );

    Ok(Analysis {
        window,
        settings,
        stations,
    })
}
