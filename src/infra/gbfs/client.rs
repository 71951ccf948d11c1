use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::fetch::{HttpClient, fetch_json};
use crate::gbfs::{Envelope, RawStations, StationGeo, StatusFeed, decode_stations};
use crate::services::StationSource;

/// Reads the `station_status` and `station_information` feeds of one GBFS
/// system.
pub struct GbfsClient<C> {
    http: C,
    status_url: String,
    information_url: String,
}

impl<C: HttpClient> GbfsClient<C> {
    pub fn new(http: C, status_url: String, information_url: String) -> Self {
        Self {
            http,
            status_url,
            information_url,
        }
    }
}

#[async_trait]
impl<C: HttpClient> StationSource for GbfsClient<C> {
    #[tracing::instrument(skip(self), fields(url = %self.status_url))]
    async fn station_status(&self) -> Result<StatusFeed> {
        let envelope: Envelope<RawStations> = fetch_json(&self.http, &self.status_url).await?;
        let offered = envelope.data.stations.len();
        let stations = decode_stations(envelope.data, "station_status");

        debug!(
            last_updated = envelope.last_updated,
            ttl = envelope.ttl,
            offered,
            decoded = stations.len(),
            "Station status fetched"
        );

        Ok(StatusFeed {
            last_updated: envelope.last_updated,
            stations,
        })
    }

    #[tracing::instrument(skip(self), fields(url = %self.information_url))]
    async fn station_information(&self) -> Result<Vec<StationGeo>> {
        let envelope: Envelope<RawStations> = fetch_json(&self.http, &self.information_url).await?;
        let stations = decode_stations(envelope.data, "station_information");
        debug!(stations = stations.len(), "Station information fetched");
        Ok(stations)
    }
}
