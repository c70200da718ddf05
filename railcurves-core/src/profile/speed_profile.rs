use geo::Coord;
use log::warn;

use crate::{
    Error, SPEED_EPSILON_MPS, SpeedProfileOptions,
    geometry::{cumulative_distances, estimate_max_speed_from_radius, radii_at_vertices},
    model::{BrakingZone, FallbackSource, SpeedPoint, SpeedProfileResult, ZeroSpeedFallback},
    units::{kph_to_mps, mps_to_kph},
};

use super::kinematics::{segment_travel_time, speed_after_distance};

/// Curve speed limit (km/h) at every vertex, capped at the running speed.
pub(crate) fn max_speeds_by_radius(radii: &[Option<f64>], options: &SpeedProfileOptions) -> Vec<f64> {
    radii
        .iter()
        .map(|radius| match radius {
            Some(r) => estimate_max_speed_from_radius(options.mode(), *r).min(options.max_speed_kmh),
            None => options.max_speed_kmh,
        })
        .collect()
}

/// Speed profile at every vertex of a path.
///
/// The achievable speed is the minimum of a forward pass accelerating from
/// `initial_speed_kmh` and a backward pass braking towards
/// `final_speed_kmh`, both bounded by the curve speed limits. The travel
/// time is integrated edge by edge with closed-form kinematics.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for invalid options.
pub fn calculate_speed_profile(
    coords: &[Coord<f64>],
    options: &SpeedProfileOptions,
) -> Result<SpeedProfileResult, Error> {
    options.validate()?;

    let n = coords.len();
    if n < 2 {
        return Ok(SpeedProfileResult::default());
    }

    let radii = radii_at_vertices(coords, &options.curve);
    let distances = cumulative_distances(coords);
    let total_distance = distances[n - 1];
    let max_speeds = max_speeds_by_radius(&radii, options);
    let max_speed = options.max_speed_kmh;

    let mut forward = vec![0.0; n];
    forward[0] = options.initial_speed_kmh.min(max_speeds[0]);
    for i in 1..n {
        let reachable = mps_to_kph(speed_after_distance(
            kph_to_mps(forward[i - 1]),
            options.acceleration_mps2,
            distances[i] - distances[i - 1],
        ));
        forward[i] = reachable.min(max_speeds[i]).min(max_speed);
    }

    let mut backward = vec![0.0; n];
    backward[n - 1] = options.final_speed_kmh.min(max_speeds[n - 1]);
    for i in (0..n - 1).rev() {
        let reachable = mps_to_kph(speed_after_distance(
            kph_to_mps(backward[i + 1]),
            options.deceleration_mps2,
            distances[i + 1] - distances[i],
        ));
        backward[i] = reachable.min(max_speeds[i]).min(max_speed);
    }

    let mut speed_points: Vec<SpeedPoint> = Vec::with_capacity(n);
    let mut min_speed_kmh = max_speed;
    for i in 0..n {
        let achievable = forward[i].min(backward[i]);
        min_speed_kmh = min_speed_kmh.min(achievable);
        let previous = i.checked_sub(1).map(|j| speed_points[j].achievable_speed_kmh);
        speed_points.push(SpeedPoint {
            index: i,
            distance_meters: distances[i],
            max_speed_by_radius_kmh: max_speeds[i],
            achievable_speed_kmh: achievable,
            is_braking: previous.is_some_and(|p| achievable < p),
            is_accelerating: previous.is_some_and(|p| achievable > p),
        });
    }

    let braking_zones = braking_zones(&speed_points, &radii, max_speed);

    let mut total_time_seconds = 0.0;
    let mut fallbacks = Vec::new();
    for i in 1..n {
        let distance = distances[i] - distances[i - 1];
        let v1 = kph_to_mps(speed_points[i - 1].achievable_speed_kmh);
        let v2 = kph_to_mps(speed_points[i].achievable_speed_kmh);
        let v_max = kph_to_mps(max_speeds[i - 1].min(max_speeds[i]).min(max_speed));

        if (v1 > SPEED_EPSILON_MPS || v2 > SPEED_EPSILON_MPS) && v_max > SPEED_EPSILON_MPS {
            total_time_seconds += segment_travel_time(
                distance,
                v1,
                v2,
                v_max,
                options.acceleration_mps2,
                options.deceleration_mps2,
            )?;
        } else if distance > 0.0 {
            let fallback = zero_speed_fallback(&speed_points, i, distance, options);
            let edge_time = distance / fallback.fallback_speed_mps;
            total_time_seconds += edge_time;
            warn!(
                "Zero-speed fallback on edge {}->{}: distance={:.1} m, fallback speed={:.2} m/s ({:?}), edge time={:.1} s",
                fallback.start_index,
                fallback.end_index,
                distance,
                fallback.fallback_speed_mps,
                fallback.source,
                edge_time,
            );
            fallbacks.push(fallback);
        }
    }

    let average_speed_kmh = if total_distance > 0.0 && total_time_seconds > 0.0 {
        total_distance / 1000.0 / (total_time_seconds / 3600.0)
    } else {
        0.0
    };

    Ok(SpeedProfileResult {
        speed_points,
        total_time_seconds,
        average_speed_kmh,
        braking_zones,
        min_speed_kmh,
        fallbacks,
    })
}

/// Substitute speed for edge `i - 1 -> i` whose ends are both at standstill.
///
/// Averages the non-zero speeds of the vertices just before and just after
/// the edge, or uses the configured minimum speed when both are stopped too.
fn zero_speed_fallback(
    speed_points: &[SpeedPoint],
    i: usize,
    distance_meters: f64,
    options: &SpeedProfileOptions,
) -> ZeroSpeedFallback {
    let neighbours: Vec<f64> = [i.checked_sub(2), Some(i + 1)]
        .into_iter()
        .flatten()
        .filter_map(|j| speed_points.get(j))
        .map(|p| kph_to_mps(p.achievable_speed_kmh))
        .filter(|v| *v > SPEED_EPSILON_MPS)
        .collect();

    let (fallback_speed_mps, source) = if neighbours.is_empty() {
        (options.min_fallback_speed_mps, FallbackSource::MinimumSpeed)
    } else {
        (
            neighbours.iter().sum::<f64>() / neighbours.len() as f64,
            FallbackSource::NeighbourAverage,
        )
    };

    ZeroSpeedFallback {
        start_index: i - 1,
        end_index: i,
        distance_meters,
        fallback_speed_mps,
        source,
    }
}

/// Groups consecutive braking vertices into zones.
///
/// A zone starts at the vertex before the first braking vertex and ends at
/// the first vertex that is no longer braking (or the last vertex). Zones
/// separated by a single level vertex would share it and are merged.
fn braking_zones(
    speed_points: &[SpeedPoint],
    radii: &[Option<f64>],
    max_speed_kmh: f64,
) -> Vec<BrakingZone> {
    let n = speed_points.len();
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let mut zone_start: Option<usize> = None;

    for i in 1..n {
        match (speed_points[i].is_braking, zone_start) {
            (true, None) => {
                zone_start = match ranges.last() {
                    Some(&(start, end)) if end == i - 1 => {
                        ranges.pop();
                        Some(start)
                    }
                    _ => Some(i - 1),
                };
            }
            (false, Some(start)) => {
                ranges.push((start, i));
                zone_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = zone_start {
        ranges.push((start, n - 1));
    }

    ranges
        .into_iter()
        .map(|(start, end)| braking_zone(speed_points, radii, max_speed_kmh, start, end))
        .collect()
}

fn braking_zone(
    speed_points: &[SpeedPoint],
    radii: &[Option<f64>],
    max_speed_kmh: f64,
    start_index: usize,
    end_index: usize,
) -> BrakingZone {
    // tightest radius that actually lowers the speed limit
    let binding_radius = (start_index..=end_index)
        .filter(|&i| speed_points[i].max_speed_by_radius_kmh < max_speed_kmh)
        .filter_map(|i| radii[i])
        .reduce(f64::min);

    let reason = match binding_radius {
        Some(radius) => format!("Slow for curve (R={}m)", radius.round()),
        None if end_index == speed_points.len() - 1 => "Slow to stop".to_string(),
        None => "Slow for speed restriction".to_string(),
    };

    BrakingZone {
        start_index,
        end_index,
        reason,
    }
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
    fn short_paths_give_empty_profile() {
        let options = SpeedProfileOptions::default();
        let result = calculate_speed_profile(&straight(1, 0.001), &options).unwrap();
        assert!(result.speed_points.is_empty());
        assert_eq!(result.total_time_seconds, 0.0);
        assert_eq!(result.average_speed_kmh, 0.0);
    }

    #[test]
    fn invalid_rates_fail() {
        let options = SpeedProfileOptions {
            deceleration_mps2: 0.0,
            ..SpeedProfileOptions::default()
        };
        assert!(matches!(
            calculate_speed_profile(&straight(3, 0.001), &options),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn two_point_path_stops_at_both_ends() {
        let coords = straight(2, 0.01);
        let options = SpeedProfileOptions::default();
        let result = calculate_speed_profile(&coords, &options).unwrap();

        assert_eq!(result.speed_points.len(), 2);
        assert_eq!(result.speed_points[0].achievable_speed_kmh, 0.0);
        assert_eq!(result.speed_points[1].achievable_speed_kmh, 0.0);
        assert_eq!(result.fallbacks.len(), 1);
        assert_eq!(result.fallbacks[0].source, FallbackSource::MinimumSpeed);
        assert_relative_eq!(
            result.total_time_seconds,
            result.total_distance_meters(),
            max_relative = 1e-9
        );
    }

    #[test]
    fn cruise_between_moving_ends() {
        let coords = straight(11, 0.001);
        let options = SpeedProfileOptions {
            initial_speed_kmh: 80.0,
            final_speed_kmh: 80.0,
            ..SpeedProfileOptions::default()
        };
        let result = calculate_speed_profile(&coords, &options).unwrap();

        assert!(
            result
                .speed_points
                .iter()
                .all(|p| (p.achievable_speed_kmh - 80.0).abs() < 1e-9)
        );
        assert!(result.braking_zones.is_empty());
        assert_relative_eq!(result.average_speed_kmh, 80.0, max_relative = 1e-9);
        assert!(result.fallbacks.is_empty());
    }

    #[test]
    fn braking_flags_are_exclusive() {
        let coords = straight(30, 0.001);
        let result = calculate_speed_profile(&coords, &SpeedProfileOptions::default()).unwrap();

        let first = result.speed_points[0];
        assert!(!first.is_braking && !first.is_accelerating);
        for point in &result.speed_points {
            assert!(!(point.is_braking && point.is_accelerating));
        }
        assert!(result.speed_points[1].is_accelerating);

        let zone = result.braking_zones.last().unwrap();
        assert_eq!(zone.end_index, 29);
        assert_eq!(zone.reason, "Slow to stop");
    }

    fn points_with_speeds(speeds: &[f64]) -> Vec<SpeedPoint> {
        speeds
            .iter()
            .enumerate()
            .map(|(index, speed)| SpeedPoint {
                index,
                distance_meters: index as f64 * 100.0,
                max_speed_by_radius_kmh: 80.0,
                achievable_speed_kmh: *speed,
                is_braking: index > 0 && *speed < speeds[index - 1],
                is_accelerating: index > 0 && *speed > speeds[index - 1],
            })
            .collect()
    }

    #[test]
    fn braking_zones_never_share_a_vertex() {
        // brake, one level vertex, brake again
        let points = points_with_speeds(&[60.0, 50.0, 50.0, 40.0, 60.0, 60.0]);
        let zones = braking_zones(&points, &[None; 6], 80.0);
        assert_eq!(zones.len(), 1);
        assert_eq!((zones[0].start_index, zones[0].end_index), (0, 4));
        assert_eq!(zones[0].reason, "Slow for speed restriction");

        // a longer plateau keeps the zones apart
        let points = points_with_speeds(&[60.0, 50.0, 50.0, 50.0, 40.0, 40.0]);
        let zones = braking_zones(&points, &[None; 6], 80.0);
        let bounds: Vec<(usize, usize)> =
            zones.iter().map(|z| (z.start_index, z.end_index)).collect();
        assert_eq!(bounds, vec![(0, 2), (3, 5)]);
        for pair in zones.windows(2) {
            assert!(pair[0].end_index < pair[1].start_index);
        }
    }

    #[test]
    fn neighbour_average_fallback() {
        let points = points_with_speeds(&[36.0, 0.0, 0.0, 72.0]);
        let options = SpeedProfileOptions::default();

        let fallback = zero_speed_fallback(&points, 2, 100.0, &options);
        assert_eq!(fallback.source, FallbackSource::NeighbourAverage);
        assert_relative_eq!(fallback.fallback_speed_mps, 15.0, epsilon = 1e-9);
        assert_eq!((fallback.start_index, fallback.end_index), (1, 2));

        let stopped: Vec<SpeedPoint> = points
            .iter()
            .map(|p| SpeedPoint {
                achievable_speed_kmh: 0.0,
                ..*p
            })
            .collect();
        let fallback = zero_speed_fallback(&stopped, 1, 100.0, &options);
        assert_eq!(fallback.source, FallbackSource::MinimumSpeed);
        assert_eq!(fallback.fallback_speed_mps, 1.0);
    }
}
