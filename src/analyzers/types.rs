//! Data types produced by the aggregation pipeline.

use serde::{Deserialize, Serialize};

/// What a station's average occupancy means.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OccupancyClass {
    /// No log file, or a log with no decodable records.
    NoData,
    /// Records exist and the station never held a bike.
    AlwaysEmpty,
    /// Average occupancy over the window, above 0.
    Observed(f64),
}

impl OccupancyClass {
    /// The average, or `None` for [`OccupancyClass::NoData`].
    pub fn average(&self) -> Option<f64> {
        match self {
            OccupancyClass::NoData => None,
            OccupancyClass::AlwaysEmpty => Some(0.0),
            OccupancyClass::Observed(avg) => Some(*avg),
        }
    }
}

/// Everything derived for one station over the collection window.
#[derive(Debug, Clone, PartialEq)]
pub struct StationReport {
    pub station_id: String,
    /// Number of snapshot records in the log, `None` without a log file.
    pub activity: Option<usize>,
    pub occupancy: OccupancyClass,
    /// Mean occupancy per hourly window.
    pub hourly: Vec<f64>,
    /// Log lines skipped as undecodable.
    pub malformed: usize,
}

/// One `id:value` row of the summary file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationAverage {
    pub station_id: String,
    pub average: f64,
}
