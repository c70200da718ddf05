use geo::Coord;

use crate::{
    DISTANCE_EPSILON_METERS, Error, SpeedProfileOptions,
    config::require_positive,
    model::{
        DistanceSpeedPoint, DistanceSpeedProfile, DistanceSpeedProfileWithStations, SpeedPoint,
        StationDistanceSpeedPoint,
    },
    units::round_to,
};

use super::{calculate_speed_profile, segment_bounds, validate_segments};

/// Distances from 0 every `interval`, ending with `total` itself.
fn distance_grid(total: f64, interval: f64) -> impl Iterator<Item = f64> {
    let steps = (0..)
        .map(move |k| k as f64 * interval)
        .take_while(move |d| *d < total - DISTANCE_EPSILON_METERS);
    steps.chain(std::iter::once(total))
}

/// Linear interpolation of achievable and curve-limited speed at
/// `distance`, advancing `cursor` along the vertices.
fn interpolate_speed(speed_points: &[SpeedPoint], distance: f64, cursor: &mut usize) -> (f64, f64) {
    while *cursor + 1 < speed_points.len() && speed_points[*cursor + 1].distance_meters < distance {
        *cursor += 1;
    }
    let p1 = &speed_points[*cursor];
    let p2 = &speed_points[(*cursor + 1).min(speed_points.len() - 1)];

    if p1.distance_meters == p2.distance_meters || distance <= p1.distance_meters {
        (p1.achievable_speed_kmh, p1.max_speed_by_radius_kmh)
    } else if distance >= p2.distance_meters {
        (p2.achievable_speed_kmh, p2.max_speed_by_radius_kmh)
    } else {
        let t = (distance - p1.distance_meters) / (p2.distance_meters - p1.distance_meters);
        (
            p1.achievable_speed_kmh + t * (p2.achievable_speed_kmh - p1.achievable_speed_kmh),
            p1.max_speed_by_radius_kmh
                + t * (p2.max_speed_by_radius_kmh - p1.max_speed_by_radius_kmh),
        )
    }
}

fn speed_range(speeds: impl Iterator<Item = f64>) -> (f64, f64) {
    speeds
        .fold(None, |range: Option<(f64, f64)>, speed| match range {
            Some((min, max)) => Some((min.min(speed), max.max(speed))),
            None => Some((speed, speed)),
        })
        .unwrap_or((0.0, 0.0))
}

/// Speed profile sampled every `interval_meters` for plotting.
///
/// Distances are rounded to 0.01 m and speeds to 0.1 km/h. The end of the
/// path is always sampled.
pub fn speed_by_distance(
    coords: &[Coord<f64>],
    options: &SpeedProfileOptions,
    interval_meters: f64,
) -> Result<DistanceSpeedProfile, Error> {
    require_positive("interval_meters", interval_meters)?;
    let profile = calculate_speed_profile(coords, options)?;

    if profile.speed_points.len() < 2 {
        return Ok(DistanceSpeedProfile {
            interval_meters,
            ..DistanceSpeedProfile::default()
        });
    }

    let total_distance = profile.total_distance_meters();
    let mut cursor = 0;
    let points: Vec<DistanceSpeedPoint> = distance_grid(total_distance, interval_meters)
        .map(|distance| {
            let (speed, max_speed) =
                interpolate_speed(&profile.speed_points, distance, &mut cursor);
            DistanceSpeedPoint {
                distance_meters: round_to(distance, 2),
                speed_kmh: round_to(speed, 1),
                max_speed_by_radius_kmh: round_to(max_speed, 1),
            }
        })
        .collect();

    let (min_speed_kmh, max_speed_kmh) = speed_range(points.iter().map(|p| p.speed_kmh));

    Ok(DistanceSpeedProfile {
        points,
        interval_meters,
        total_distance_meters: total_distance,
        total_time_seconds: profile.total_time_seconds,
        max_speed_kmh,
        min_speed_kmh,
    })
}

/// Distance profile of a path stopping at every station.
///
/// Each station segment is profiled on its own, starting and ending at
/// standstill, and the segments are concatenated.
///
/// # Errors
///
/// Returns [`Error::InvalidData`] when the segment indices are out of range
/// or not strictly increasing.
pub fn speed_by_distance_with_stations(
    coords: &[Coord<f64>],
    segments: &[usize],
    options: &SpeedProfileOptions,
    interval_meters: f64,
) -> Result<DistanceSpeedProfileWithStations, Error> {
    require_positive("interval_meters", interval_meters)?;
    validate_segments(segments, coords.len())?;

    if coords.len() < 2 || segments.is_empty() {
        return Ok(DistanceSpeedProfileWithStations {
            interval_meters,
            ..DistanceSpeedProfileWithStations::default()
        });
    }

    let segment_options = options.station_to_station();
    let mut points: Vec<StationDistanceSpeedPoint> = Vec::new();
    let mut cumulative_distance = 0.0;
    let mut total_time_seconds = 0.0;
    let mut station_distances = vec![0.0];

    for (k, start, end) in segment_bounds(segments, coords.len()) {
        let section = &coords[start..=end];
        if section.len() < 2 {
            continue;
        }

        let profile = speed_by_distance(section, &segment_options, interval_meters)?;
        total_time_seconds += profile.total_time_seconds;

        if points.is_empty() {
            let max_speed_by_radius_kmh = profile
                .points
                .first()
                .map_or(options.max_speed_kmh, |p| p.max_speed_by_radius_kmh);
            points.push(StationDistanceSpeedPoint {
                point: DistanceSpeedPoint {
                    distance_meters: 0.0,
                    speed_kmh: 0.0,
                    max_speed_by_radius_kmh,
                },
                segment_index: k,
                is_at_station: true,
                station_index: Some(k),
            });
        }

        let last = profile.points.len().saturating_sub(1);
        for (i, point) in profile.points.iter().enumerate().skip(1) {
            let is_at_station = i == last;
            points.push(StationDistanceSpeedPoint {
                point: DistanceSpeedPoint {
                    distance_meters: round_to(cumulative_distance + point.distance_meters, 2),
                    ..*point
                },
                segment_index: k,
                is_at_station,
                station_index: is_at_station.then_some(k + 1),
            });
        }

        cumulative_distance += profile.total_distance_meters;
        station_distances.push(round_to(cumulative_distance, 2));
    }

    let (min_speed_kmh, max_speed_kmh) = speed_range(points.iter().map(|p| p.point.speed_kmh));

    Ok(DistanceSpeedProfileWithStations {
        points,
        interval_meters,
        total_distance_meters: cumulative_distance,
        total_time_seconds,
        max_speed_kmh,
        min_speed_kmh,
        segment_count: segments.len(),
        station_distances,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::coord;

    fn straight(count: usize, step_deg: f64) -> Vec<Coord<f64>> {
        (0..count)
            .map(|k| coord! { x: k as f64 * step_deg, y: 0.0 })
            .collect()
    }

    #[test]
    fn grid_ends_at_total() {
        let grid: Vec<f64> = distance_grid(25.0, 10.0).collect();
        assert_eq!(grid, vec![0.0, 10.0, 20.0, 25.0]);
        let grid: Vec<f64> = distance_grid(20.0, 10.0).collect();
        assert_eq!(grid, vec![0.0, 10.0, 20.0]);
        let grid: Vec<f64> = distance_grid(0.0, 10.0).collect();
        assert_eq!(grid, vec![0.0]);
    }

    #[test]
    fn samples_at_regular_intervals() {
        let coords = straight(11, 0.001);
        let profile = speed_by_distance(&coords, &SpeedProfileOptions::default(), 10.0).unwrap();

        assert_relative_eq!(profile.total_distance_meters, 1111.95, epsilon = 0.01);
        assert_eq!(profile.points.len(), 113);
        assert_eq!(profile.points[1].distance_meters, 10.0);
        assert_eq!(profile.points[0].speed_kmh, 0.0);
        assert_eq!(profile.points.last().unwrap().speed_kmh, 0.0);
        assert_eq!(profile.min_speed_kmh, 0.0);
        assert!(profile.max_speed_kmh > 0.0 && profile.max_speed_kmh <= 80.0);
        for point in &profile.points {
            assert!(point.speed_kmh <= point.max_speed_by_radius_kmh + 0.1);
        }
    }

    #[test]
    fn rejects_non_positive_interval() {
        let coords = straight(3, 0.001);
        let options = SpeedProfileOptions::default();
        assert!(speed_by_distance(&coords, &options, 0.0).is_err());
        assert!(speed_by_distance_with_stations(&coords, &[0], &options, -1.0).is_err());
    }

    #[test]
    fn stops_at_every_station() {
        let coords = straight(21, 0.001);
        let options = SpeedProfileOptions {
            initial_speed_kmh: 60.0,
            final_speed_kmh: 60.0,
            ..SpeedProfileOptions::default()
        };
        let profile = speed_by_distance_with_stations(&coords, &[0, 10], &options, 10.0).unwrap();

        assert_eq!(profile.segment_count, 2);
        assert_eq!(profile.station_distances.len(), 3);
        assert_eq!(profile.station_distances[0], 0.0);
        assert_relative_eq!(profile.station_distances[1], 1111.95, epsilon = 0.01);
        assert_relative_eq!(profile.total_distance_meters, 2223.9, epsilon = 0.02);

        let stations: Vec<_> = profile.points.iter().filter(|p| p.is_at_station).collect();
        assert_eq!(stations.len(), 3);
        for (k, station) in stations.iter().enumerate() {
            assert_eq!(station.station_index, Some(k));
            assert_eq!(station.point.speed_kmh, 0.0);
        }
        assert!(
            profile
                .points
                .windows(2)
                .all(|pair| pair[1].point.distance_meters >= pair[0].point.distance_meters)
        );
    }

    #[test]
    fn empty_without_segments() {
        let coords = straight(5, 0.001);
        let profile =
            speed_by_distance_with_stations(&coords, &[], &SpeedProfileOptions::default(), 10.0)
                .unwrap();
        assert!(profile.points.is_empty());
        assert_eq!(profile.segment_count, 0);
        assert_eq!(profile.interval_meters, 10.0);
    }

    #[test]
    fn rejects_out_of_range_segments() {
        let coords = straight(5, 0.001);
        let result =
            speed_by_distance_with_stations(&coords, &[0, 9], &SpeedProfileOptions::default(), 10.0);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }
}
