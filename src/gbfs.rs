//! Station records as served by a GBFS feed and as stored in station logs.
//!
//! A [`StationSnapshot`] deserializes from either the long upstream field
//! names (`station_id`, `last_reported`, ...) or the abbreviated keys used on
//! disk (`s_i`, `l_r`, ...), and always serializes with the abbreviated keys.

use serde::{Deserialize, Deserializer, Serialize};

/// One observation of one station at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSnapshot {
    #[serde(rename = "s_i", alias = "station_id", deserialize_with = "de_station_id")]
    pub station_id: String,
    #[serde(rename = "l_r", alias = "last_reported")]
    pub last_reported: i64,
    #[serde(rename = "n_b_a", alias = "num_bikes_available")]
    pub bikes_available: u32,
    #[serde(rename = "n_d_a", alias = "num_docks_available")]
    pub docks_available: u32,

    // carried through unchanged, never read by aggregation
    #[serde(
        rename = "n_b_d",
        alias = "num_bikes_disabled",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub bikes_disabled: Option<u32>,
    #[serde(
        rename = "n_d_d",
        alias = "num_docks_disabled",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub docks_disabled: Option<u32>,
    #[serde(
        rename = "i_i",
        alias = "is_installed",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_installed: Option<serde_json::Value>,
    #[serde(
        rename = "i_ren",
        alias = "is_renting",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_renting: Option<serde_json::Value>,
    #[serde(
        rename = "i_ret",
        alias = "is_returning",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_returning: Option<serde_json::Value>,
    #[serde(
        rename = "e_h_a_k",
        alias = "eightd_has_available_keys",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub eightd_has_available_keys: Option<serde_json::Value>,
}

impl StationSnapshot {
    /// Minimal snapshot with every optional flag unset.
    pub fn new(station_id: &str, last_reported: i64, bikes: u32, docks: u32) -> Self {
        Self {
            station_id: station_id.to_string(),
            last_reported,
            bikes_available: bikes,
            docks_available: docks,
            bikes_disabled: None,
            docks_disabled: None,
            is_installed: None,
            is_renting: None,
            is_returning: None,
            eightd_has_available_keys: None,
        }
    }

    /// Bikes over total available capacity, in `[0, 1]`.
    ///
    /// A station reporting neither bikes nor docks counts as empty (0).
    pub fn occupancy(&self) -> f64 {
        let capacity = self.bikes_available as u64 + self.docks_available as u64;
        if capacity == 0 {
            0.0
        } else {
            self.bikes_available as f64 / capacity as f64
        }
    }
}

/// Static location data for one station.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationGeo {
    #[serde(deserialize_with = "de_station_id")]
    pub station_id: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

/// The common GBFS wrapper around every feed payload.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub last_updated: i64,
    #[serde(default)]
    pub ttl: Option<u32>,
    pub data: T,
}

/// Station list inside a feed, decoded lazily so one bad entry does not
/// reject the whole batch.
#[derive(Debug, Deserialize)]
pub struct RawStations {
    pub stations: Vec<serde_json::Value>,
}

/// A decoded station-status batch.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusFeed {
    pub last_updated: i64,
    pub stations: Vec<StationSnapshot>,
}

/// Decodes each station entry, dropping (and logging) those that do not
/// match `T`.
pub fn decode_stations<T: serde::de::DeserializeOwned>(raw: RawStations, feed: &str) -> Vec<T> {
    raw.stations
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| match serde_json::from_value(value) {
            Ok(station) => Some(station),
            Err(e) => {
                tracing::warn!(feed, position, error = %e, "Skipping undecodable station entry");
                None
            }
        })
        .collect()
}

fn de_station_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}
