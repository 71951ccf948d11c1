use crate::gbfs::StationSnapshot;
use crate::window::TimeWindow;
use std::num::NonZeroU32;

/// Rebuilds a fixed-cadence occupancy series from a sparse station log.
///
/// Slot `i` covers `[start + i*width, start + (i+1)*width)` and holds the
/// occupancy of the last snapshot falling in it. Snapshots before the window
/// land in slot 0, snapshots after it in the last slot. Empty slots repeat
/// the previous slot; leading empty slots are 0.
pub fn occupancy_series(
    snapshots: &[StationSnapshot],
    window: &TimeWindow,
    width: NonZeroU32,
) -> Vec<f64> {
    let mut slots: Vec<Option<f64>> = vec![None; window.bucket_count(width)];

    for snapshot in snapshots {
        let index = window.bucket_of(snapshot.last_reported, width);
        slots[index] = Some(snapshot.occupancy());
    }

    forward_fill(&slots)
}

/// Replaces each `None` with the most recent preceding value, or 0 when
/// nothing precedes it.
pub fn forward_fill(slots: &[Option<f64>]) -> Vec<f64> {
    let mut carry = 0.0;
    slots
        .iter()
        .map(|slot| {
            if let Some(value) = slot {
                carry = *value;
            }
            carry
        })
        .collect()
}
