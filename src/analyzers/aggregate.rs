use crate::analyzers::bucket::occupancy_series;
use crate::analyzers::types::{OccupancyClass, StationReport};
use crate::analyzers::utility::{mean, settle_ratios};
use crate::gbfs::StationSnapshot;
use crate::store::LogState;
use crate::window::TimeWindow;
use std::num::{NonZeroU32, NonZeroUsize};

/// Mean of a fine-grained series, with out-of-range values replaced by the
/// last valid one.
pub fn station_average(series: &[f64]) -> f64 {
    let mut carry = 0.0;
    mean(&settle_ratios(series, &mut carry))
}

/// Averages consecutive windows of `span` fine buckets. The last valid value
/// carries across window boundaries; a trailing partial window is averaged
/// over its own length.
pub fn windowed_means(series: &[f64], span: NonZeroUsize) -> Vec<f64> {
    let mut carry = 0.0;
    series
        .chunks(span.get())
        .map(|chunk| mean(&settle_ratios(chunk, &mut carry)))
        .collect()
}

/// Classifies a station by whether it logged anything and what it averaged.
pub fn classify(state: &LogState<StationSnapshot>, average: f64) -> OccupancyClass {
    if state.records().is_empty() {
        OccupancyClass::NoData
    } else if average == 0.0 {
        OccupancyClass::AlwaysEmpty
    } else {
        OccupancyClass::Observed(average)
    }
}

/// Derives every per-station metric from one read of its log.
pub fn aggregate_station(
    station_id: &str,
    state: &LogState<StationSnapshot>,
    window: &TimeWindow,
    width: NonZeroU32,
    hourly_span: NonZeroUsize,
) -> StationReport {
    let series = occupancy_series(state.records(), window, width);
    let average = station_average(&series);

    StationReport {
        station_id: station_id.to_string(),
        activity: match state {
            LogState::Missing => None,
            LogState::Present(contents) => Some(contents.records.len()),
        },
        occupancy: classify(state, average),
        hourly: windowed_means(&series, hourly_span),
        malformed: state.malformed(),
    }
}
