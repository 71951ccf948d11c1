//! Trait for anything that yields bike-share station data.

use crate::gbfs::{StationGeo, StatusFeed};
use anyhow::Result;

/// Abstraction over a station data provider (e.g., a GBFS endpoint pair).
#[async_trait::async_trait]
pub trait StationSource: Send + Sync {
    /// Current status of every station, with the batch timestamp.
    async fn station_status(&self) -> Result<StatusFeed>;

    /// Static location data for every station.
    async fn station_information(&self) -> Result<Vec<StationGeo>>;
}
