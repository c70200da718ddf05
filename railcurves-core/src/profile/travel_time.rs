use geo::Coord;
use log::debug;

use crate::{
    DISTANCE_EPSILON_METERS, Error, SPEED_EPSILON_MPS, SpeedProfileOptions,
    curvature::detect_geometry_resolution,
    geometry::{cumulative_distances, estimate_max_speed_from_radius, radii_at_vertices},
    model::{PathTravelTimeAnalysis, SegmentTravelTime},
    units::{kph_to_mps, round_to},
};

use super::{
    calculate_speed_profile, kinematics::segment_travel_time, segment_bounds,
    speed_profile::max_speeds_by_radius, validate_segments,
};

/// Station to station time at constant running speed, accelerating from and
/// braking to standstill.
///
/// # Errors
///
/// Returns [`Error::ZeroSpeed`] when the running speed is zero on a
/// non-empty distance.
pub fn simple_segment_time(
    distance_meters: f64,
    running_speed_mps: f64,
    acceleration_mps2: f64,
    deceleration_mps2: f64,
) -> Result<f64, Error> {
    segment_travel_time(
        distance_meters,
        0.0,
        0.0,
        running_speed_mps,
        acceleration_mps2,
        deceleration_mps2,
    )
}

/// Curve-aware time of one station segment
#[derive(Debug, Clone, Copy, PartialEq)]
struct CurveTime {
    time_seconds: f64,
    /// Tightest radius below the straight threshold
    min_radius_meters: Option<f64>,
}

fn segment_time_with_curves(
    section: &[Coord<f64>],
    options: &SpeedProfileOptions,
) -> Result<CurveTime, Error> {
    let total_distance = cumulative_distances(section).last().copied().unwrap_or(0.0);
    if total_distance < DISTANCE_EPSILON_METERS {
        return Ok(CurveTime {
            time_seconds: 0.0,
            min_radius_meters: None,
        });
    }

    if section.len() < 3 {
        let time_seconds = simple_segment_time(
            total_distance,
            kph_to_mps(options.max_speed_kmh),
            options.acceleration_mps2,
            options.deceleration_mps2,
        )?;
        return Ok(CurveTime {
            time_seconds,
            min_radius_meters: None,
        });
    }

    let threshold = options.curve.straight_threshold();
    let min_radius_meters = radii_at_vertices(section, &options.curve)
        .into_iter()
        .flatten()
        .filter(|r| *r < threshold)
        .reduce(f64::min);

    let profile = calculate_speed_profile(section, &options.station_to_station())?;
    Ok(CurveTime {
        time_seconds: profile.total_time_seconds,
        min_radius_meters,
    })
}

/// Time at the curve limited speed of every edge, without accelerating or
/// braking for the stations.
fn no_dwell_time_with_curves(section: &[Coord<f64>], options: &SpeedProfileOptions) -> f64 {
    let radii = radii_at_vertices(section, &options.curve);
    let limits = max_speeds_by_radius(&radii, options);
    let distances = cumulative_distances(section);

    (1..section.len())
        .map(|i| {
            let distance = distances[i] - distances[i - 1];
            let limit = kph_to_mps(limits[i - 1].min(limits[i]));
            if limit > SPEED_EPSILON_MPS {
                distance / limit
            } else {
                distance / options.min_fallback_speed_mps
            }
        })
        .sum()
}

fn average_speed_kmh(distance_meters: f64, time_seconds: f64) -> f64 {
    if time_seconds > 0.0 {
        distance_meters / 1000.0 / (time_seconds / 3600.0)
    } else {
        0.0
    }
}

/// Compares the travel time of every station segment with and without
/// curve speed limits.
///
/// Curve limits are only applied when the geometry resolution of the path
/// allows curve analysis; otherwise both times are equal. Segment values
/// are rounded to whole seconds and meters, percentages to 0.1.
///
/// # Errors
///
/// Returns an error for invalid options or segment indices, or when the
/// maximum speed is zero.
pub fn calculate_segment_travel_times(
    coords: &[Coord<f64>],
    segments: &[usize],
    options: &SpeedProfileOptions,
) -> Result<PathTravelTimeAnalysis, Error> {
    options.validate()?;
    validate_segments(segments, coords.len())?;
    if options.max_speed_kmh <= 0.0 {
        return Err(Error::InvalidParameter(
            "max_speed_kmh must be positive to compute travel times".to_string(),
        ));
    }

    let resolution = detect_geometry_resolution(coords, segments.len());
    let use_curves = resolution.allows_curve_analysis();
    debug!("Geometry resolution {resolution:?}, curve speed limits applied: {use_curves}");

    let running_speed_mps = kph_to_mps(options.max_speed_kmh);
    let mut results = Vec::with_capacity(segments.len());
    let mut total_without_curves = 0.0;
    let mut total_with_curves = 0.0;
    let mut total_no_dwell = 0.0;
    let mut total_distance = 0.0;

    for (k, start, end) in segment_bounds(segments, coords.len()) {
        let section = &coords[start..=end];
        let distance = cumulative_distances(section).last().copied().unwrap_or(0.0);

        let without_curves = simple_segment_time(
            distance,
            running_speed_mps,
            options.acceleration_mps2,
            options.deceleration_mps2,
        )?;

        let (with_curves, no_dwell, min_radius) = if use_curves {
            let curve_time = segment_time_with_curves(section, options)?;
            (
                curve_time.time_seconds,
                no_dwell_time_with_curves(section, options),
                curve_time.min_radius_meters,
            )
        } else {
            (without_curves, distance / running_speed_mps, None)
        };

        let curve_speed_limit = min_radius.map(|radius| {
            estimate_max_speed_from_radius(options.mode(), radius).min(options.max_speed_kmh)
        });
        let difference = (with_curves - without_curves).max(0.0);
        let difference_percent = if without_curves > 0.0 {
            difference / without_curves * 100.0
        } else {
            0.0
        };

        results.push(SegmentTravelTime {
            segment_index: k,
            distance_meters: distance.round(),
            travel_time_without_curves_seconds: without_curves.round(),
            travel_time_with_curves_seconds: with_curves.round(),
            no_dwell_time_with_curves_seconds: no_dwell.round(),
            difference_seconds: difference.round(),
            difference_percent: round_to(difference_percent, 1),
            min_radius_in_segment_meters: min_radius.map(f64::round),
            curve_speed_limit_kmh: curve_speed_limit.map(f64::round),
            entry_speed_kmh: 0.0,
            exit_speed_kmh: 0.0,
        });

        total_without_curves += without_curves;
        total_with_curves += with_curves;
        total_no_dwell += no_dwell;
        total_distance += distance;
    }

    if !use_curves {
        total_with_curves = total_without_curves;
    }

    let total_difference = total_with_curves - total_without_curves;
    let total_difference_percent = if total_without_curves > 0.0 {
        total_difference / total_without_curves * 100.0
    } else {
        0.0
    };

    Ok(PathTravelTimeAnalysis {
        segments: results,
        total_time_without_curves_seconds: total_without_curves.round(),
        total_time_with_curves_seconds: total_with_curves.round(),
        total_no_dwell_curve_time_seconds: total_no_dwell.round(),
        total_difference_seconds: total_difference.round(),
        total_difference_percent: round_to(total_difference_percent, 1),
        total_distance_meters: total_distance.round(),
        avg_speed_without_curves_kmh: average_speed_kmh(total_distance, total_without_curves)
            .round(),
        avg_speed_with_curves_kmh: average_speed_kmh(total_distance, total_with_curves).round(),
        geometry_resolution: resolution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curvature::GeometryResolution;
    use approx::assert_relative_eq;
    use geo::coord;

    fn straight(count: usize, step_deg: f64) -> Vec<Coord<f64>> {
        (0..count)
            .map(|k| coord! { x: k as f64 * step_deg, y: 0.0 })
            .collect()
    }

    #[test]
    fn simple_time_is_trapezoid_or_triangle() {
        // 100 m to reach 10 m/s, 62.5 m to stop
        let t = simple_segment_time(1000.0, 10.0, 0.5, 0.8).unwrap();
        assert_relative_eq!(t, 116.25, epsilon = 1e-9);
        let t = simple_segment_time(0.0, 10.0, 0.5, 0.8).unwrap();
        assert_eq!(t, 0.0);
        assert!(simple_segment_time(100.0, 10.0, 0.0, 0.8).is_err());
    }

    #[test]
    fn straight_path_has_no_curve_penalty() {
        let coords = straight(21, 0.001);
        let analysis =
            calculate_segment_travel_times(&coords, &[0, 10], &SpeedProfileOptions::default())
                .unwrap();

        assert_eq!(analysis.geometry_resolution, GeometryResolution::High);
        assert_eq!(analysis.segments.len(), 2);
        for segment in &analysis.segments {
            assert_eq!(segment.distance_meters, 1112.0);
            assert_eq!(segment.min_radius_in_segment_meters, None);
            assert_eq!(segment.curve_speed_limit_kmh, None);
            assert!(segment.difference_seconds >= 0.0);
            assert!(
                (segment.travel_time_with_curves_seconds
                    - segment.travel_time_without_curves_seconds)
                    .abs()
                    <= 1.0
            );
        }
        assert_eq!(analysis.total_distance_meters, 2224.0);
        assert!(analysis.avg_speed_with_curves_kmh > 0.0);
        assert!(analysis.total_no_dwell_curve_time_seconds < analysis.total_time_with_curves_seconds);
    }

    #[test]
    fn coarse_geometry_skips_curves() {
        let coords = [
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.01, y: 0.0 },
            coord! { x: 0.01, y: 0.01 },
        ];
        let analysis =
            calculate_segment_travel_times(&coords, &[0, 1], &SpeedProfileOptions::default())
                .unwrap();
        assert_eq!(analysis.geometry_resolution, GeometryResolution::None);
        assert_eq!(
            analysis.total_time_with_curves_seconds,
            analysis.total_time_without_curves_seconds
        );
        assert_eq!(analysis.total_difference_seconds, 0.0);
    }

    #[test]
    fn requires_positive_max_speed() {
        let coords = straight(5, 0.001);
        let options = SpeedProfileOptions {
            max_speed_kmh: 0.0,
            ..SpeedProfileOptions::default()
        };
        assert!(matches!(
            calculate_segment_travel_times(&coords, &[0, 2], &options),
            Err(Error::InvalidParameter(_))
        ));
    }
}
