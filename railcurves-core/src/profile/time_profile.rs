use geo::Coord;
use log::debug;

use crate::{
    Error, SpeedProfileOptions,
    config::{
        MIN_KINEMATIC_SAMPLES, MIN_SYNTHETIC_CONSTRAINTS, SYNTHETIC_CONSTRAINT_SPACING_METERS,
        require_positive,
    },
    curvature::detect_geometry_resolution,
    geometry::{cumulative_distances, radii_at_vertices},
    model::{TimeSpeedPoint, TimeSpeedProfile},
    units::{kph_to_mps, mps_to_kph, round_to},
};

use super::{
    kinematics::{
        KinematicLimits, KinematicWaypoint, SpeedConstraint, interpolate_waypoints,
        segment_waypoints,
    },
    segment_bounds,
    speed_profile::max_speeds_by_radius,
    validate_segments,
};

/// Curve speed limits at the vertices of a station segment.
fn curve_constraints(
    section: &[Coord<f64>],
    distances: &[f64],
    options: &SpeedProfileOptions,
) -> Vec<SpeedConstraint> {
    let radii = radii_at_vertices(section, &options.curve);
    max_speeds_by_radius(&radii, options)
        .into_iter()
        .zip(distances)
        .map(|(max_speed_kmh, distance)| SpeedConstraint {
            distance_meters: *distance,
            max_speed_mps: kph_to_mps(max_speed_kmh),
        })
        .collect()
}

/// Evenly spaced running speed limits, used when curves are ignored.
fn flat_constraints(total_distance: f64, max_speed_mps: f64) -> Vec<SpeedConstraint> {
    let count = ((total_distance / SYNTHETIC_CONSTRAINT_SPACING_METERS).ceil() as usize + 1)
        .max(MIN_SYNTHETIC_CONSTRAINTS);
    (0..count)
        .map(|p| SpeedConstraint {
            distance_meters: p as f64 / (count - 1) as f64 * total_distance,
            max_speed_mps,
        })
        .collect()
}

/// Kinematic waypoints of one station segment.
pub(crate) fn section_waypoints(
    section: &[Coord<f64>],
    use_curves: bool,
    options: &SpeedProfileOptions,
) -> Result<Vec<KinematicWaypoint>, Error> {
    let limits = KinematicLimits::from_options(options);
    let distances = cumulative_distances(section);
    let total_distance = distances.last().copied().unwrap_or(0.0);

    let constraints = if use_curves && section.len() >= 3 {
        curve_constraints(section, &distances, options)
    } else {
        flat_constraints(total_distance, limits.max_speed_mps)
    };

    segment_waypoints(
        &constraints,
        total_distance,
        &limits,
        options.kinematic_resample_interval_meters,
        MIN_KINEMATIC_SAMPLES,
    )
}

/// Times from `start` every `interval` while strictly below `end`.
fn time_grid(start: f64, end: f64, interval: f64) -> impl Iterator<Item = f64> {
    (0..)
        .map(move |k| start + k as f64 * interval)
        .take_while(move |t| *t < end - 1e-9)
}

/// Speed profile sampled every `interval_seconds`, including the dwell
/// time at every station.
///
/// Each station segment starts and ends at standstill. Curve speed limits
/// are only applied when the geometry resolution of the whole path allows
/// curve analysis; otherwise the running speed is the only limit. The
/// dwell time of station `k` is inserted before segment `k`, the dwell time
/// of the terminus after the last segment.
///
/// # Errors
///
/// Returns an error for invalid options, segment indices or dwell times.
pub fn speed_by_time_with_dwell_times(
    coords: &[Coord<f64>],
    segments: &[usize],
    dwell_times_seconds: &[f64],
    options: &SpeedProfileOptions,
    interval_seconds: f64,
) -> Result<TimeSpeedProfile, Error> {
    options.validate()?;
    require_positive("interval_seconds", interval_seconds)?;
    validate_segments(segments, coords.len())?;
    if let Some(dwell) = dwell_times_seconds
        .iter()
        .find(|d| !d.is_finite() || **d < 0.0)
    {
        return Err(Error::InvalidData(format!(
            "dwell times must be finite and non-negative (got {dwell})"
        )));
    }

    let segment_count = segments.len();
    if coords.len() < 2 || segment_count == 0 {
        return Ok(TimeSpeedProfile {
            interval_seconds,
            ..TimeSpeedProfile::default()
        });
    }

    let resolution = detect_geometry_resolution(coords, segment_count);
    let use_curves = resolution.allows_curve_analysis();
    debug!("Geometry resolution {resolution:?}, curve speed limits applied: {use_curves}");

    let dwell_at = |station: usize| dwell_times_seconds.get(station).copied().unwrap_or(0.0);
    let max_speed_kmh = options.max_speed_kmh;

    let mut points: Vec<TimeSpeedPoint> = Vec::new();
    let mut cumulative_time = 0.0;
    let mut cumulative_distance = 0.0;
    let mut total_running_time = 0.0;
    let mut total_dwell_time = 0.0;
    let mut station_times = vec![0.0];

    let dwell_points = |points: &mut Vec<TimeSpeedPoint>,
                        start: f64,
                        dwell: f64,
                        distance: f64,
                        segment_index: usize,
                        station: usize| {
        for t in time_grid(start, start + dwell, interval_seconds) {
            points.push(TimeSpeedPoint {
                time_seconds: round_to(t, 1),
                distance_meters: round_to(distance, 1),
                speed_kmh: 0.0,
                max_speed_by_radius_kmh: max_speed_kmh,
                segment_index,
                is_dwelling: true,
                station_index: Some(station),
            });
        }
    };

    for (k, start, end) in segment_bounds(segments, coords.len()) {
        let dwell = if k == 0 { 0.0 } else { dwell_at(k) };
        if dwell > 0.0 {
            dwell_points(
                &mut points,
                cumulative_time,
                dwell,
                cumulative_distance,
                k - 1,
                k,
            );
            cumulative_time += dwell;
            total_dwell_time += dwell;
        }

        let section = &coords[start..=end];
        if section.len() < 2 {
            continue;
        }

        let waypoints = section_waypoints(section, use_curves, options)?;
        let Some(arrival) = waypoints.last().copied() else {
            continue;
        };
        let running_time = arrival.time_seconds;
        total_running_time += running_time;

        if k == 0 {
            points.push(TimeSpeedPoint {
                time_seconds: 0.0,
                distance_meters: 0.0,
                speed_kmh: 0.0,
                max_speed_by_radius_kmh: max_speed_kmh,
                segment_index: 0,
                is_dwelling: false,
                station_index: Some(0),
            });
        }

        let samples = time_grid(interval_seconds, running_time, interval_seconds)
            .map(|t| (interpolate_waypoints(t, &waypoints), None))
            .chain(std::iter::once((arrival, Some(k + 1))));
        for (waypoint, station_index) in samples {
            points.push(TimeSpeedPoint {
                time_seconds: round_to(cumulative_time + waypoint.time_seconds, 1),
                distance_meters: round_to(cumulative_distance + waypoint.distance_meters, 1),
                speed_kmh: round_to(mps_to_kph(waypoint.speed_mps), 1),
                max_speed_by_radius_kmh: round_to(mps_to_kph(waypoint.max_speed_by_radius_mps), 1),
                segment_index: k,
                is_dwelling: false,
                station_index,
            });
        }

        cumulative_time += running_time;
        cumulative_distance += arrival.distance_meters;
        station_times.push(round_to(cumulative_time, 1));
    }

    let final_dwell = dwell_at(segment_count);
    if final_dwell > 0.0 {
        dwell_points(
            &mut points,
            cumulative_time,
            final_dwell,
            cumulative_distance,
            segment_count - 1,
            segment_count,
        );
        cumulative_time += final_dwell;
        total_dwell_time += final_dwell;
    }

    let max_speed_reached = points.iter().map(|p| p.speed_kmh).fold(0.0, f64::max);
    let kept_dwell_times = dwell_times_seconds
        .iter()
        .take(segment_count + 1)
        .copied()
        .collect();

    Ok(TimeSpeedProfile {
        points,
        interval_seconds,
        total_distance_meters: cumulative_distance,
        total_time_seconds: cumulative_time,
        total_running_time_seconds: total_running_time,
        total_dwell_time_seconds: total_dwell_time,
        max_speed_kmh: max_speed_reached,
        segment_count,
        station_times,
        dwell_times_seconds: kept_dwell_times,
    })
}
