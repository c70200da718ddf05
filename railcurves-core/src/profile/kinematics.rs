//! Closed-form constant-acceleration kinematics

use crate::{
    DISTANCE_EPSILON_METERS, Error, SPEED_EPSILON_MPS, SpeedProfileOptions,
    config::require_positive, units::kph_to_mps,
};

/// Speed after covering `distance` from `initial_speed` at constant
/// `acceleration` (`v² = v₀² + 2ad`), never negative.
pub fn speed_after_distance(initial_speed_mps: f64, acceleration_mps2: f64, distance_meters: f64) -> f64 {
    let v_squared =
        initial_speed_mps * initial_speed_mps + 2.0 * acceleration_mps2 * distance_meters;
    if v_squared > 0.0 { v_squared.sqrt() } else { 0.0 }
}

/// Time to cover `distance` entering at `v1` and leaving at `v2`, never
/// exceeding `v_max`.
///
/// When the distance allows it the vehicle accelerates to `v_max`, cruises
/// and brakes to `v2` (trapezoid). Otherwise it accelerates to the highest
/// reachable peak and brakes right away (triangle). When even the transition
/// from `v1` to `v2` does not fit, the speed reached at the end of the
/// distance is used instead of `v2`.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if a rate is not positive and
/// [`Error::ZeroSpeed`] if `v_max` is zero on a non-empty distance.
pub fn segment_travel_time(
    distance_meters: f64,
    v1_mps: f64,
    v2_mps: f64,
    v_max_mps: f64,
    acceleration_mps2: f64,
    deceleration_mps2: f64,
) -> Result<f64, Error> {
    require_positive("acceleration_mps2", acceleration_mps2)?;
    require_positive("deceleration_mps2", deceleration_mps2)?;

    if distance_meters < DISTANCE_EPSILON_METERS {
        return Ok(0.0);
    }
    if v_max_mps <= SPEED_EPSILON_MPS {
        return Err(Error::ZeroSpeed { distance_meters });
    }

    let (a, d, distance) = (acceleration_mps2, deceleration_mps2, distance_meters);
    let v1 = v1_mps.clamp(0.0, v_max_mps);
    let v2 = v2_mps.clamp(0.0, v_max_mps);
    let v_max = v_max_mps;

    let accel_distance = (v_max * v_max - v1 * v1) / (2.0 * a);
    let decel_distance = (v_max * v_max - v2 * v2) / (2.0 * d);

    if accel_distance + decel_distance <= distance {
        let cruise_distance = distance - accel_distance - decel_distance;
        return Ok((v_max - v1) / a + cruise_distance / v_max + (v_max - v2) / d);
    }

    // (p² - v1²) / 2a + (p² - v2²) / 2d = distance
    let peak_squared = (2.0 * a * d * distance + d * v1 * v1 + a * v2 * v2) / (a + d);
    let peak = peak_squared.max(0.0).sqrt();

    if peak >= v1.max(v2) {
        return Ok((peak - v1) / a + (peak - v2) / d);
    }

    if v2 > v1 {
        let reached = speed_after_distance(v1, a, distance);
        Ok((reached - v1) / a)
    } else {
        let reached = (v1 * v1 - 2.0 * d * distance).max(0.0).sqrt();
        Ok(2.0 * distance / (v1 + reached))
    }
}

/// Point of the curve-limited speed envelope of a segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedConstraint {
    pub distance_meters: f64,
    pub max_speed_mps: f64,
}

/// Sample of the kinematic profile of a segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicWaypoint {
    pub time_seconds: f64,
    pub distance_meters: f64,
    pub speed_mps: f64,
    pub max_speed_by_radius_mps: f64,
}

/// Vehicle limits used to build kinematic profiles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicLimits {
    pub max_speed_mps: f64,
    pub acceleration_mps2: f64,
    pub deceleration_mps2: f64,
    /// Used between two standstill samples
    pub fallback_speed_mps: f64,
}

impl KinematicLimits {
    /// Running speed, rates and fallback speed of `options`.
    pub fn from_options(options: &SpeedProfileOptions) -> Self {
        Self {
            max_speed_mps: kph_to_mps(options.max_speed_kmh),
            acceleration_mps2: options.acceleration_mps2,
            deceleration_mps2: options.deceleration_mps2,
            fallback_speed_mps: options.min_fallback_speed_mps,
        }
    }
}

/// Achievable speeds at the constraint points of a segment that starts and
/// ends at standstill.
struct ConstraintEnvelope {
    distances: Vec<f64>,
    max_speeds: Vec<f64>,
    achievable: Vec<f64>,
}

impl ConstraintEnvelope {
    fn new(constraints: &[SpeedConstraint], limits: &KinematicLimits) -> Self {
        let n = constraints.len();
        let distances: Vec<f64> = constraints.iter().map(|c| c.distance_meters).collect();
        let max_speeds: Vec<f64> = constraints.iter().map(|c| c.max_speed_mps).collect();

        let mut forward = vec![0.0; n];
        for i in 1..n {
            let reachable = speed_after_distance(
                forward[i - 1],
                limits.acceleration_mps2,
                distances[i] - distances[i - 1],
            );
            forward[i] = reachable.min(max_speeds[i]).min(limits.max_speed_mps);
        }

        let mut backward = vec![0.0; n];
        for i in (0..n.saturating_sub(1)).rev() {
            let reachable = speed_after_distance(
                backward[i + 1],
                limits.deceleration_mps2,
                distances[i + 1] - distances[i],
            );
            backward[i] = reachable.min(max_speeds[i]).min(limits.max_speed_mps);
        }

        let achievable = forward
            .iter()
            .zip(&backward)
            .map(|(f, b)| f.min(*b))
            .collect();

        Self {
            distances,
            max_speeds,
            achievable,
        }
    }

    /// Speed and interpolated curve limit at `distance`.
    ///
    /// Between two constraint points the vehicle accelerates from the first
    /// achievable speed, brakes into the second one and cruises in between
    /// at the lower curve limit of both points (or faster when entering or
    /// leaving faster than that limit). Short intervals yield a triangle
    /// profile, long ones a trapezoid.
    fn speed_at(&self, distance: f64, limits: &KinematicLimits) -> (f64, f64) {
        let n = self.distances.len();
        let idx = self.distances[1..]
            .partition_point(|d| *d < distance)
            .min(n - 2);

        let (d1, d2) = (self.distances[idx], self.distances[idx + 1]);
        let (v1, v2) = (self.achievable[idx], self.achievable[idx + 1]);
        let (m1, m2) = (self.max_speeds[idx], self.max_speeds[idx + 1]);
        let delta = (distance - d1).max(0.0);
        let length = d2 - d1;

        let ratio = if length > 0.0 { delta / length } else { 0.0 };
        let max_speed_by_radius = m1 + ratio * (m2 - m1);

        if length < DISTANCE_EPSILON_METERS {
            return (v1, max_speed_by_radius);
        }

        let cruise = m1.min(m2).min(limits.max_speed_mps).max(v1).max(v2);
        let accelerating = speed_after_distance(v1, limits.acceleration_mps2, delta);
        let braking =
            speed_after_distance(v2, limits.deceleration_mps2, (length - delta).max(0.0));

        (accelerating.min(braking).min(cruise), max_speed_by_radius)
    }
}

/// Time between two waypoint samples moving from `v1` to `v2`.
pub(crate) fn kinematic_time(
    distance_meters: f64,
    v1_mps: f64,
    v2_mps: f64,
    limits: &KinematicLimits,
) -> Result<f64, Error> {
    if distance_meters < DISTANCE_EPSILON_METERS {
        return Ok(0.0);
    }
    let v_max = v1_mps.max(v2_mps);
    if v_max <= SPEED_EPSILON_MPS {
        return Ok(distance_meters / limits.fallback_speed_mps);
    }
    segment_travel_time(
        distance_meters,
        v1_mps,
        v2_mps,
        v_max,
        limits.acceleration_mps2,
        limits.deceleration_mps2,
    )
}

/// Samples the kinematic profile of a segment from standstill to standstill.
///
/// Constraint points are completed with the segment ends when missing, the
/// achievable envelope is sampled every `resample_interval_meters` (at least
/// `min_samples` points) and the time is accumulated sample by sample.
pub fn segment_waypoints(
    constraints: &[SpeedConstraint],
    total_distance_meters: f64,
    limits: &KinematicLimits,
    resample_interval_meters: f64,
    min_samples: usize,
) -> Result<Vec<KinematicWaypoint>, Error> {
    let start = KinematicWaypoint {
        time_seconds: 0.0,
        distance_meters: 0.0,
        speed_mps: 0.0,
        max_speed_by_radius_mps: limits.max_speed_mps,
    };
    if constraints.is_empty() || total_distance_meters <= 0.0 {
        return Ok(vec![start]);
    }

    let mut points = Vec::with_capacity(constraints.len() + 2);
    if constraints[0].distance_meters > 0.0 {
        points.push(SpeedConstraint {
            distance_meters: 0.0,
            max_speed_mps: limits.max_speed_mps,
        });
    }
    points.extend_from_slice(constraints);
    if points
        .last()
        .is_some_and(|c| c.distance_meters < total_distance_meters)
    {
        points.push(SpeedConstraint {
            distance_meters: total_distance_meters,
            max_speed_mps: limits.max_speed_mps,
        });
    }
    if points.len() < 2 {
        return Ok(vec![start]);
    }

    let envelope = ConstraintEnvelope::new(&points, limits);

    let sample_count = ((total_distance_meters / resample_interval_meters).ceil() as usize + 1)
        .max(min_samples)
        .max(2);
    let step = total_distance_meters / (sample_count - 1) as f64;

    let mut waypoints = Vec::with_capacity(sample_count);
    let mut time = 0.0;
    let mut previous: Option<(f64, f64)> = None;

    for s in 0..sample_count {
        let distance = if s + 1 == sample_count {
            total_distance_meters
        } else {
            s as f64 * step
        };
        let (speed, max_speed_by_radius) = envelope.speed_at(distance, limits);

        if let Some((previous_distance, previous_speed)) = previous {
            time += kinematic_time(distance - previous_distance, previous_speed, speed, limits)?;
        }

        waypoints.push(KinematicWaypoint {
            time_seconds: time,
            distance_meters: distance,
            speed_mps: speed,
            max_speed_by_radius_mps: max_speed_by_radius,
        });
        previous = Some((distance, speed));
    }

    Ok(waypoints)
}

/// Linear interpolation of speed, distance and curve limit at `time`.
pub fn interpolate_waypoints(time_seconds: f64, waypoints: &[KinematicWaypoint]) -> KinematicWaypoint {
    if waypoints.is_empty() {
        return KinematicWaypoint {
            time_seconds,
            distance_meters: 0.0,
            speed_mps: 0.0,
            max_speed_by_radius_mps: 0.0,
        };
    }

    let last = waypoints.len() - 1;
    let i = waypoints[1..].partition_point(|w| w.time_seconds < time_seconds);
    let p1 = &waypoints[i.min(last)];
    let p2 = &waypoints[(i + 1).min(last)];

    let at = |p: &KinematicWaypoint| KinematicWaypoint { time_seconds, ..*p };
    if time_seconds <= p1.time_seconds {
        return at(p1);
    }
    if time_seconds >= p2.time_seconds {
        return at(p2);
    }

    let ratio = (time_seconds - p1.time_seconds) / (p2.time_seconds - p1.time_seconds);
    KinematicWaypoint {
        time_seconds,
        distance_meters: p1.distance_meters + ratio * (p2.distance_meters - p1.distance_meters),
        speed_mps: p1.speed_mps + ratio * (p2.speed_mps - p1.speed_mps),
        max_speed_by_radius_mps: p1.max_speed_by_radius_mps
            + ratio * (p2.max_speed_by_radius_mps - p1.max_speed_by_radius_mps),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn limits() -> KinematicLimits {
        KinematicLimits {
            max_speed_mps: 20.0,
            acceleration_mps2: 0.5,
            deceleration_mps2: 0.8,
            fallback_speed_mps: 1.0,
        }
    }

    #[test]
    fn rejects_non_positive_rates() {
        assert!(matches!(
            segment_travel_time(100.0, 0.0, 0.0, 10.0, 0.0, 0.8),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            segment_travel_time(100.0, 0.0, 0.0, 10.0, 0.5, -1.0),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn zero_speed_limit_is_an_error() {
        assert_eq!(
            segment_travel_time(100.0, 0.0, 0.0, 0.0, 0.5, 0.8),
            Err(Error::ZeroSpeed {
                distance_meters: 100.0
            })
        );
        assert_eq!(segment_travel_time(0.001, 0.0, 0.0, 0.0, 0.5, 0.8), Ok(0.0));
    }

    #[test]
    fn cruise_at_constant_speed() {
        let t = segment_travel_time(100.0, 10.0, 10.0, 10.0, 0.5, 0.8).unwrap();
        assert_relative_eq!(t, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn trapezoid_from_rest_to_rest() {
        // 100 m to reach 10 m/s, 62.5 m to stop, 837.5 m cruise
        let t = segment_travel_time(1000.0, 0.0, 0.0, 10.0, 0.5, 0.8).unwrap();
        assert_relative_eq!(t, 20.0 + 83.75 + 12.5, epsilon = 1e-9);
    }

    #[test]
    fn triangle_when_too_short() {
        let (a, d, distance) = (0.5, 0.8, 100.0);
        let t = segment_travel_time(distance, 0.0, 0.0, 30.0, a, d).unwrap();
        let peak = (2.0 * a * d * distance / (a + d)).sqrt();
        assert_relative_eq!(t, peak / a + peak / d, epsilon = 1e-9);
    }

    #[test]
    fn trapezoid_and_triangle_meet_continuously() {
        let (a, d, v_max) = (0.5, 0.8, 10.0);
        let boundary = v_max * v_max / (2.0 * a) + v_max * v_max / (2.0 * d);
        let below = segment_travel_time(boundary - 1e-6, 0.0, 0.0, v_max, a, d).unwrap();
        let above = segment_travel_time(boundary + 1e-6, 0.0, 0.0, v_max, a, d).unwrap();
        assert_relative_eq!(below, above, epsilon = 1e-5);
    }

    #[test]
    fn unreachable_exit_speed() {
        // cannot brake from 20 to 0 m/s within 10 m
        let t = segment_travel_time(10.0, 20.0, 0.0, 20.0, 0.5, 0.8).unwrap();
        let reached = (400.0_f64 - 16.0).sqrt();
        assert_relative_eq!(t, 20.0 / (20.0 + reached), epsilon = 1e-9);

        // cannot accelerate from 0 to 20 m/s within 10 m
        let t = segment_travel_time(10.0, 0.0, 20.0, 20.0, 0.5, 0.8).unwrap();
        assert_relative_eq!(t, 10.0_f64.sqrt() / 0.5, epsilon = 1e-9);
    }

    #[test]
    fn speed_after_distance_never_negative() {
        assert_relative_eq!(speed_after_distance(0.0, 0.5, 100.0), 10.0);
        assert_eq!(speed_after_distance(5.0, -0.8, 100.0), 0.0);
    }

    #[test]
    fn waypoints_start_and_end_at_rest() {
        let constraints = [
            SpeedConstraint {
                distance_meters: 0.0,
                max_speed_mps: 20.0,
            },
            SpeedConstraint {
                distance_meters: 250.0,
                max_speed_mps: 20.0,
            },
            SpeedConstraint {
                distance_meters: 500.0,
                max_speed_mps: 8.0,
            },
            SpeedConstraint {
                distance_meters: 750.0,
                max_speed_mps: 20.0,
            },
            SpeedConstraint {
                distance_meters: 1000.0,
                max_speed_mps: 20.0,
            },
        ];
        let waypoints = segment_waypoints(&constraints, 1000.0, &limits(), 10.0, 50).unwrap();

        assert_eq!(waypoints.len(), 101);
        let first = waypoints[0];
        let last = waypoints[waypoints.len() - 1];
        assert_eq!(first.speed_mps, 0.0);
        assert_relative_eq!(last.speed_mps, 0.0, epsilon = 1e-9);
        assert_relative_eq!(last.distance_meters, 1000.0);

        let at_curve = waypoints[50];
        assert_relative_eq!(at_curve.distance_meters, 500.0, epsilon = 1e-9);
        assert!(at_curve.speed_mps <= 8.0 + 1e-9);

        for pair in waypoints.windows(2) {
            assert!(pair[1].time_seconds >= pair[0].time_seconds);
            assert!(pair[1].speed_mps <= limits().max_speed_mps + 1e-9);
            // 10 m samples, no jumps in speed
            assert!((pair[1].speed_mps - pair[0].speed_mps).abs() < 5.0);
        }
        assert!(waypoints.iter().any(|w| w.speed_mps > 8.0));
    }

    #[test]
    fn waypoints_with_zero_speed_limit_stay_finite() {
        let stopped = KinematicLimits {
            max_speed_mps: 0.0,
            ..limits()
        };
        let constraints = [
            SpeedConstraint {
                distance_meters: 0.0,
                max_speed_mps: 0.0,
            },
            SpeedConstraint {
                distance_meters: 100.0,
                max_speed_mps: 0.0,
            },
        ];
        let waypoints = segment_waypoints(&constraints, 100.0, &stopped, 10.0, 50).unwrap();
        let last = waypoints.last().unwrap();
        assert_relative_eq!(last.time_seconds, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn interpolates_between_waypoints() {
        let waypoints = [
            KinematicWaypoint {
                time_seconds: 0.0,
                distance_meters: 0.0,
                speed_mps: 0.0,
                max_speed_by_radius_mps: 20.0,
            },
            KinematicWaypoint {
                time_seconds: 10.0,
                distance_meters: 25.0,
                speed_mps: 5.0,
                max_speed_by_radius_mps: 10.0,
            },
        ];
        let mid = interpolate_waypoints(5.0, &waypoints);
        assert_relative_eq!(mid.speed_mps, 2.5);
        assert_relative_eq!(mid.distance_meters, 12.5);
        assert_relative_eq!(mid.max_speed_by_radius_mps, 15.0);

        let after = interpolate_waypoints(20.0, &waypoints);
        assert_eq!(after.distance_meters, 25.0);
        let before = interpolate_waypoints(-1.0, &waypoints);
        assert_eq!(before.speed_mps, 0.0);
        assert_eq!(interpolate_waypoints(1.0, &[]).speed_mps, 0.0);
    }
}
