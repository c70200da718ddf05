//! Speed profiles along a path
//!
//! [`speed_profile`] computes the achievable speed at every vertex,
//! [`resample`] and [`time_profile`] turn it into regularly sampled
//! profiles over distance and time, [`travel_time`] compares station to
//! station travel times with and without curve speed limits.

pub mod kinematics;
pub mod resample;
pub mod speed_profile;
pub mod time_profile;
pub mod travel_time;

pub use kinematics::{segment_travel_time, speed_after_distance};
pub use resample::{speed_by_distance, speed_by_distance_with_stations};
pub use speed_profile::calculate_speed_profile;
pub use time_profile::speed_by_time_with_dwell_times;
pub use travel_time::{calculate_segment_travel_times, simple_segment_time};

use crate::Error;

/// Checks that station segment start indices are strictly increasing and
/// inside the coordinate range.
pub(crate) fn validate_segments(segments: &[usize], coord_count: usize) -> Result<(), Error> {
    if let Some(&index) = segments.iter().find(|&&index| index >= coord_count) {
        return Err(Error::InvalidData(format!(
            "segment start index {index} is outside of the {coord_count} coordinates"
        )));
    }
    if let Some(pair) = segments.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(Error::InvalidData(format!(
            "segment start indices must be strictly increasing ({} then {})",
            pair[0], pair[1]
        )));
    }
    Ok(())
}

/// `(segment index, first coordinate, last coordinate)` of every station
/// segment. The last segment runs to the end of the path.
pub(crate) fn segment_bounds(
    segments: &[usize],
    coord_count: usize,
) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
    segments.iter().enumerate().map(move |(k, &start)| {
        let end = segments
            .get(k + 1)
            .copied()
            .unwrap_or(coord_count.saturating_sub(1));
        (k, start, end)
    })
}
