//! Geometric primitives on `(lon, lat)` coordinates
//!
//! Distances are geodesic (haversine on the mean Earth radius); angles and
//! turn directions use a local planar approximation with the longitude
//! scaled by the cosine of the mean latitude.

pub mod radii;

use geo::{Coord, Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

use crate::RailMode;
use crate::config::{DEGENERATE_AREA_RATIO, STRAIGHT_CROSS_PRODUCT_THRESHOLD};

pub use radii::radii_at_vertices;

/// Geodesic distance in meters between two `(lon, lat)` coordinates.
pub fn distance_meters(from: Coord<f64>, to: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(from), Point::from(to))
}

/// Radius of the circle through three points, in meters.
///
/// Returns `None` for collinear or coincident points, that is when the
/// squared area is at most [`DEGENERATE_AREA_RATIO`] times `s⁴`.
pub fn circumradius(p1: Coord<f64>, p2: Coord<f64>, p3: Coord<f64>) -> Option<f64> {
    let a = distance_meters(p1, p2);
    let b = distance_meters(p2, p3);
    let c = distance_meters(p1, p3);

    // Heron's formula
    let s = (a + b + c) / 2.0;
    let area_squared = s * (s - a) * (s - b) * (s - c);

    if !area_squared.is_finite() || area_squared <= DEGENERATE_AREA_RATIO * s.powi(4) {
        return None;
    }

    let radius = (a * b * c) / (4.0 * area_squared.sqrt());
    radius.is_finite().then_some(radius)
}

/// Direction of a turn at a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TurnDirection {
    Left,
    Right,
    Straight,
}

/// Cross and dot products of `p1 -> p2` and `p2 -> p3`.
fn local_products(p1: Coord<f64>, p2: Coord<f64>, p3: Coord<f64>) -> (f64, f64) {
    let mean_lat = ((p1.y + p2.y + p3.y) / 3.0).to_radians();
    let cos_lat = mean_lat.cos();

    let (v1x, v1y) = ((p2.x - p1.x) * cos_lat, p2.y - p1.y);
    let (v2x, v2y) = ((p3.x - p2.x) * cos_lat, p3.y - p2.y);

    (v1x * v2y - v1y * v2x, v1x * v2x + v1y * v2y)
}

/// Deflection angle at `p2` in radians, in `[0, π]`.
///
/// 0 means the path continues straight on, π that it doubles back.
pub fn turning_angle(p1: Coord<f64>, p2: Coord<f64>, p3: Coord<f64>) -> f64 {
    let (cross, dot) = local_products(p1, p2, p3);
    cross.abs().atan2(dot)
}

pub fn turn_direction(p1: Coord<f64>, p2: Coord<f64>, p3: Coord<f64>) -> TurnDirection {
    let (cross, _) = local_products(p1, p2, p3);
    if cross.abs() < STRAIGHT_CROSS_PRODUCT_THRESHOLD {
        TurnDirection::Straight
    } else if cross > 0.0 {
        TurnDirection::Left
    } else {
        TurnDirection::Right
    }
}

/// Turn direction at every interior vertex, `None` at both ends.
pub fn turn_directions(coords: &[Coord<f64>]) -> Vec<Option<TurnDirection>> {
    let mut directions = vec![None; coords.len()];
    for (i, window) in coords.windows(3).enumerate() {
        directions[i + 1] = Some(turn_direction(window[0], window[1], window[2]));
    }
    directions
}

/// Distance from the first coordinate to every coordinate.
pub fn cumulative_distances(coords: &[Coord<f64>]) -> Vec<f64> {
    let mut distances = Vec::with_capacity(coords.len());
    let mut total = 0.0;
    for (i, coord) in coords.iter().enumerate() {
        if i > 0 {
            total += distance_meters(coords[i - 1], *coord);
        }
        distances.push(total);
    }
    distances
}

/// Largest distance from `coords[i]` to its neighbours at `i - stride` and
/// `i + stride`.
pub fn local_spacing(coords: &[Coord<f64>], i: usize, stride: usize) -> f64 {
    let previous = i
        .checked_sub(stride)
        .and_then(|j| coords.get(j))
        .map_or(0.0, |p| distance_meters(*p, coords[i]));
    let next = coords
        .get(i + stride)
        .map_or(0.0, |p| distance_meters(coords[i], *p));
    previous.max(next)
}

/// Curve speed limit in km/h for a radius in meters.
///
/// Returns 0 for a non-finite or non-positive radius.
pub fn estimate_max_speed_from_radius(mode: RailMode, radius_meters: f64) -> f64 {
    if !radius_meters.is_finite() || radius_meters <= 0.0 {
        return 0.0;
    }
    (mode.curve_speed_coefficient() * radius_meters.sqrt()).round()
}
