//! Plot descriptions and the sink that renders them.
//!
//! Everything upstream of [`Renderer`] only builds [`ScatterPlot`] and
//! [`BarChart`] values; nothing flows back from rendering into the data.

mod bitmap;
pub mod catalogue;

pub use bitmap::BitmapRenderer;

use crate::gbfs::StationGeo;
use anyhow::Result;
use plotters::style::{Color, HSLColor};
use std::ops::Range;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Maps `t` in `[0, 1]` onto a rainbow ramp, purple at 0 through red at 1.
/// Values outside the range are clamped.
pub fn rainbow(t: f64) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let (r, g, b) = HSLColor(0.75 * (1.0 - t), 1.0, 0.5).to_backend_color().rgb;
    Rgb(r, g, b)
}

/// Converts a marker area in square points (the unit the plot catalogue is
/// tuned in) to a pixel radius at 120 dpi.
pub fn area_to_radius(area: f64) -> u32 {
    const PIXELS_PER_POINT: f64 = 120.0 / 72.0;
    if area.is_nan() || area <= 0.0 {
        return 0;
    }
    (area.sqrt() / 2.0 * PIXELS_PER_POINT).round() as u32
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub x: Range<f64>,
    pub y: Range<f64>,
}

impl Bounds {
    /// Longitude/latitude box around every station, padded by 5% per side.
    pub fn around(stations: &[StationGeo]) -> Self {
        const MIN_PAD: f64 = 0.005;

        let lon = stations.iter().map(|s| s.longitude);
        let lat = stations.iter().map(|s| s.latitude);
        let (Some(x), Some(y)) = (min_max(lon), min_max(lat)) else {
            return Bounds {
                x: -180.0..180.0,
                y: -90.0..90.0,
            };
        };

        let pad = |(lo, hi): (f64, f64)| {
            let pad = ((hi - lo) * 0.05).max(MIN_PAD);
            (lo - pad)..(hi + pad)
        };
        Bounds { x: pad(x), y: pad(y) }
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub radius: u32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPlot {
    pub file_name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bounds: Bounds,
    pub points: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub category: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub file_name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub y_range: Range<f64>,
    pub bars: Vec<Bar>,
}

/// A sink for finished plots.
pub trait Renderer {
    fn scatter(&self, plot: &ScatterPlot) -> Result<()>;

    fn bars(&self, chart: &BarChart) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo(id: &str, lat: f64, lon: f64) -> StationGeo {
        StationGeo {
            station_id: id.to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn test_rainbow_endpoints() {
        let low = rainbow(0.0);
        let high = rainbow(1.0);
        // purple: red and blue dominate, no green
        assert!(low.2 > 200 && low.0 > 100 && low.1 < 10);
        // red
        assert!(high.0 > 250 && high.1 < 10 && high.2 < 10);
        assert_eq!(rainbow(-3.0), low);
        assert_eq!(rainbow(f64::NAN), low);
    }

    #[test]
    fn test_area_to_radius() {
        assert_eq!(area_to_radius(0.0), 0);
        assert_eq!(area_to_radius(-5.0), 0);
        assert_eq!(area_to_radius(36.0), 5);
    }

    #[test]
    fn test_bounds_pad_station_box() {
        let bounds = Bounds::around(&[geo("1", 42.30, -71.10), geo("2", 42.40, -71.00)]);
        assert!((bounds.x.start - (-71.105)).abs() < 1e-9);
        assert!((bounds.x.end - (-70.995)).abs() < 1e-9);
        assert!((bounds.y.start - 42.295).abs() < 1e-9);
        assert!((bounds.y.end - 42.405).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_single_station_gets_minimum_pad() {
        let bounds = Bounds::around(&[geo("1", 42.0, -71.0)]);
        assert!(bounds.x.start < -71.0 && bounds.x.end > -71.0);
        assert!(bounds.y.start < 42.0 && bounds.y.end > 42.0);
    }
}
