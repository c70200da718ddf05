//! Parallel evaluation of many paths

use log::info;
use rayon::prelude::*;

use crate::{
    Error, SpeedProfileOptions,
    model::{PathTravelTimeAnalysis, RailPath, TimeSpeedProfile},
};

/// Time profiles of `paths`, in input order.
///
/// Paths without stations or with fewer than two coordinates yield `None`.
///
/// # Errors
///
/// Returns the first error raised by any path.
pub fn bulk_time_profiles(
    paths: &[RailPath],
    base: &SpeedProfileOptions,
    interval_seconds: f64,
) -> Result<Vec<Option<TimeSpeedProfile>>, Error> {
    info!("Computing time profiles for {} paths", paths.len());

    let result: Result<Vec<Option<TimeSpeedProfile>>, Error> = paths
        .par_iter()
        .map(|path| path.time_profile(base, interval_seconds))
        .collect();

    result
}

/// Segment travel-time analyses of `paths`, in input order.
///
/// # Errors
///
/// Returns the first error raised by any path.
pub fn bulk_travel_times(
    paths: &[RailPath],
    base: &SpeedProfileOptions,
) -> Result<Vec<Option<PathTravelTimeAnalysis>>, Error> {
    info!("Computing segment travel times for {} paths", paths.len());

    let result: Result<Vec<Option<PathTravelTimeAnalysis>>, Error> = paths
        .par_iter()
        .map(|path| path.segment_travel_times(base))
        .collect();

    let computed = result.as_ref().map_or(0, |r| r.iter().flatten().count());
    info!("Computed travel times for {computed} of {} paths", paths.len());

    result
}
