//! The fixed set of figures produced from an [`Analysis`].
//!
//! Metrics are joined to coordinates by station id. Stations without
//! coordinates are left out of the scatters; stations without data are left
//! out of everything.

use super::{Bar, BarChart, Bounds, Rgb, ScatterPlot, ScatterPoint, area_to_radius, rainbow};
use crate::analyzers::analyzer::Analysis;
use crate::analyzers::types::{OccupancyClass, StationAverage};
use crate::gbfs::StationGeo;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use tracing::debug;

const LONGITUDE: &str = "Longitude";
const LATITUDE: &str = "Latitude";

/// Marker area for plots where only color carries the value.
const ACTIVITY_FIXED_AREA: f64 = 350.0;
const OCCUPANCY_FIXED_AREA: f64 = 400.0;

/// Area per unit of metric.
const ACTIVITY_AREA_SCALE: f64 = 0.7;
const OCCUPANCY_AREA_SCALE: f64 = 1000.0;
const HOURLY_AREA_SCALE: f64 = 600.0;

/// Which visual channel encodes the metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Size,
    Color,
    SizeAndColor,
}

impl Encoding {
    const ALL: [Encoding; 3] = [Encoding::Size, Encoding::Color, Encoding::SizeAndColor];

    fn file_suffix(self) -> &'static str {
        match self {
            Encoding::Size => "by_size",
            Encoding::Color => "by_color",
            Encoding::SizeAndColor => "by_color_and_size",
        }
    }

    fn title_suffix(self) -> &'static str {
        match self {
            Encoding::Size => "Size",
            Encoding::Color => "Color",
            Encoding::SizeAndColor => "Size and Color",
        }
    }
}

const DEFAULT_MARKER: Rgb = Rgb(31, 119, 180);

struct Measured<'a> {
    geo: &'a StationGeo,
    area: f64,
    /// Metric normalized to `[0, 1]` for the color ramp.
    level: f64,
}

fn join_geo<'a, T>(
    geo: &'a [StationGeo],
    values: impl IntoIterator<Item = (&'a str, T)>,
) -> Vec<(&'a StationGeo, T)> {
    let by_id: HashMap<&str, &StationGeo> = geo.iter().map(|g| (g.station_id.as_str(), g)).collect();

    values
        .into_iter()
        .filter_map(|(id, value)| match by_id.get(id) {
            Some(g) => Some((*g, value)),
            None => {
                debug!(station_id = id, "No coordinates for station, not plotted");
                None
            }
        })
        .collect()
}

fn scatter_set(
    prefix: &str,
    title: &str,
    fixed_area: f64,
    bounds: &Bounds,
    measured: &[Measured<'_>],
) -> Vec<ScatterPlot> {
    Encoding::ALL
        .iter()
        .map(|&encoding| {
            let points = measured
                .iter()
                .map(|m| {
                    let (area, color) = match encoding {
                        Encoding::Size => (m.area, DEFAULT_MARKER),
                        Encoding::Color => (fixed_area, rainbow(m.level)),
                        Encoding::SizeAndColor => (m.area, rainbow(m.level)),
                    };
                    ScatterPoint {
                        x: m.geo.longitude,
                        y: m.geo.latitude,
                        radius: area_to_radius(area),
                        color,
                    }
                })
                .collect();

            ScatterPlot {
                file_name: format!("{}_{}.png", prefix, encoding.file_suffix()),
                title: format!("{} ({})", title, encoding.title_suffix()),
                x_label: LONGITUDE.to_string(),
                y_label: LATITUDE.to_string(),
                bounds: bounds.clone(),
                points,
            }
        })
        .collect()
}

/// Stations sized and colored by how many snapshots they logged.
pub fn activity_plots(analysis: &Analysis, geo: &[StationGeo]) -> Vec<ScatterPlot> {
    let counts = analysis
        .stations
        .iter()
        .filter_map(|s| s.activity.map(|count| (s.station_id.as_str(), count)));
    let joined = join_geo(geo, counts);
    let busiest = joined.iter().map(|(_, count)| *count).max().unwrap_or(0).max(1);

    let measured: Vec<Measured> = joined
        .iter()
        .map(|(g, count)| Measured {
            geo: *g,
            area: ACTIVITY_AREA_SCALE * *count as f64,
            level: *count as f64 / busiest as f64,
        })
        .collect();

    scatter_set(
        "1activity",
        "Stations by Activity Level",
        ACTIVITY_FIXED_AREA,
        &Bounds::around(geo),
        &measured,
    )
}

/// Stations sized and colored by average occupancy.
pub fn occupancy_plots(analysis: &Analysis, geo: &[StationGeo]) -> Vec<ScatterPlot> {
    let averages = analysis
        .stations
        .iter()
        .filter_map(|s| s.occupancy.average().map(|avg| (s.station_id.as_str(), avg)));

    let measured: Vec<Measured> = join_geo(geo, averages)
        .into_iter()
        .map(|(g, avg)| Measured {
            geo: g,
            area: OCCUPANCY_AREA_SCALE * avg,
            level: avg,
        })
        .collect();

    scatter_set(
        "2occupancy",
        "Stations by Average Occupancy",
        OCCUPANCY_FIXED_AREA,
        &Bounds::around(geo),
        &measured,
    )
}

/// Bar per station from summary rows, in the order given.
pub fn summary_chart(rows: &[StationAverage]) -> BarChart {
    BarChart {
        file_name: "3occupancy_graph.png".to_string(),
        title: "Average Occupancy by Station Number".to_string(),
        x_label: "Station Number".to_string(),
        y_label: "Average Occupancy (bikes / (bikes + docks))".to_string(),
        y_range: 0.0..1.0,
        bars: rows
            .iter()
            .map(|r| Bar {
                category: r.station_id.clone(),
                value: r.average,
            })
            .collect(),
    }
}

/// One scatter per hourly window, titled with the local start time.
pub fn hourly_frames(analysis: &Analysis, geo: &[StationGeo]) -> Vec<ScatterPlot> {
    let bounds = Bounds::around(geo);
    let observed = analysis
        .stations
        .iter()
        .filter(|s| s.occupancy != OccupancyClass::NoData)
        .map(|s| (s.station_id.as_str(), &s.hourly));
    let joined = join_geo(geo, observed);

    (0..analysis.hourly_len())
        .map(|index| {
            let starts_at = analysis.window.start + analysis.hourly_window_secs() * index as i64;
            let points = joined
                .iter()
                .map(|(g, hourly)| {
                    let value = hourly.get(index).copied().unwrap_or(0.0);
                    ScatterPoint {
                        x: g.longitude,
                        y: g.latitude,
                        radius: area_to_radius(HOURLY_AREA_SCALE * value),
                        color: rainbow(value),
                    }
                })
                .collect();

            ScatterPlot {
                file_name: format!("4_{}.png", index),
                title: local_time_label(starts_at),
                x_label: LONGITUDE.to_string(),
                y_label: LATITUDE.to_string(),
                bounds: bounds.clone(),
                points,
            }
        })
        .collect()
}

fn local_time_label(unix_secs: i64) -> String {
    DateTime::from_timestamp(unix_secs, 0)
        .map(|t| {
            t.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| unix_secs.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyzer::AnalysisSettings;
    use crate::analyzers::types::StationReport;
    use crate::window::TimeWindow;
    use std::num::{NonZeroU32, NonZeroUsize};

    fn geo(id: &str, lat: f64, lon: f64) -> StationGeo {
        StationGeo {
            station_id: id.to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    fn report(id: &str, activity: Option<usize>, occupancy: OccupancyClass, hourly: Vec<f64>) -> StationReport {
        StationReport {
            station_id: id.to_string(),
            activity,
            occupancy,
            hourly,
            malformed: 0,
        }
    }

    fn analysis(stations: Vec<StationReport>) -> Analysis {
        Analysis {
            window: TimeWindow::new(1_500_000_000, 1_500_007_200).unwrap(),
            settings: AnalysisSettings {
                bucket_width: NonZeroU32::new(10).unwrap(),
                hourly_buckets: NonZeroUsize::new(360).unwrap(),
                max_stations: 218,
            },
            stations,
        }
    }

    fn sample() -> (Analysis, Vec<StationGeo>) {
        let analysis = analysis(vec![
            report("1", Some(40), OccupancyClass::Observed(0.5), vec![0.5, 0.25]),
            report("2", None, OccupancyClass::NoData, vec![0.0, 0.0]),
            report("3", Some(10), OccupancyClass::AlwaysEmpty, vec![0.0, 0.0]),
            report("4", Some(5), OccupancyClass::Observed(0.9), vec![0.9]),
        ]);
        // station 4 has no coordinates; order differs from the reports
        let geo = vec![geo("3", 42.36, -71.05), geo("1", 42.35, -71.06), geo("2", 42.37, -71.07)];
        (analysis, geo)
    }

    #[test]
    fn test_occupancy_plots_join_by_station_id() {
        let (analysis, geo) = sample();
        let plots = occupancy_plots(&analysis, &geo);

        let names: Vec<_> = plots.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "2occupancy_by_size.png",
                "2occupancy_by_color.png",
                "2occupancy_by_color_and_size.png"
            ]
        );

        let by_size = &plots[0];
        assert_eq!(by_size.points.len(), 2);
        assert_eq!((by_size.points[0].x, by_size.points[0].y), (-71.06, 42.35));
        assert_eq!(by_size.points[0].radius, area_to_radius(500.0));
        assert_eq!(by_size.points[1].radius, 0);

        let by_color = &plots[1];
        assert_eq!(by_color.points[0].radius, area_to_radius(OCCUPANCY_FIXED_AREA));
        assert_eq!(by_color.points[0].color, rainbow(0.5));
    }

    #[test]
    fn test_activity_plots_normalize_to_busiest_station() {
        let (analysis, geo) = sample();
        let plots = activity_plots(&analysis, &geo);
        let colored = &plots[2];

        assert_eq!(colored.file_name, "1activity_by_color_and_size.png");
        assert_eq!(colored.points.len(), 2);
        assert_eq!(colored.points[0].color, rainbow(1.0));
        assert_eq!(colored.points[1].color, rainbow(0.25));
    }

    #[test]
    fn test_summary_chart_bars_follow_rows() {
        let rows = vec![
            StationAverage { station_id: "5".into(), average: 0.2 },
            StationAverage { station_id: "8".into(), average: 0.7 },
        ];
        let chart = summary_chart(&rows);
        assert_eq!(chart.file_name, "3occupancy_graph.png");
        assert_eq!(chart.y_range, 0.0..1.0);
        assert_eq!(chart.bars[1], Bar { category: "8".into(), value: 0.7 });
    }

    #[test]
    fn test_hourly_frames_one_per_window() {
        let (analysis, geo) = sample();
        let frames = hourly_frames(&analysis, &geo);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].file_name, "4_1.png");
        assert_eq!(frames[0].title, local_time_label(1_500_000_000));
        assert_eq!(frames[1].title, local_time_label(1_500_003_600));
        // stations 1 and 3 have data and coordinates
        assert_eq!(frames[0].points.len(), 2);
        assert_eq!(frames[1].points[0].color, rainbow(0.25));
    }
}
