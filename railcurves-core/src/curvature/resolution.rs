use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::{
    config::{MIN_COARSE_VERTEX_SPACING_METERS, MIN_DEFLECTION_ANGLE_RAD},
    geometry::{local_spacing, turning_angle},
};

/// How well the drawn geometry of a path supports curve analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeometryResolution {
    /// Waypoints between stations and no abrupt direction change
    High,
    /// No waypoints between stations and no abrupt direction change.
    /// Real curves between the stations would need a more precise drawing.
    AlmostStraight,
    /// Waypoints exist but at least one sparse vertex turns sharply
    Low,
    /// Straight lines from station to station, turning at the stations
    None,
}

impl GeometryResolution {
    /// Only smooth, densely drawn geometry is trusted for curve speed limits.
    pub fn allows_curve_analysis(self) -> bool {
        self == GeometryResolution::High
    }
}

/// Interior vertex with an abrupt, under-sampled direction change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoarseVertex {
    pub index: usize,
    pub deflection_rad: f64,
    /// Largest distance to a neighbouring vertex
    pub spacing_meters: f64,
}

/// Vertices deflecting by at least [`MIN_DEFLECTION_ANGLE_RAD`] whose local
/// spacing is at least [`MIN_COARSE_VERTEX_SPACING_METERS`].
///
/// Large angles on densely drawn tight curves are expected and not listed.
pub fn coarse_vertices(coords: &[Coord<f64>]) -> Vec<CoarseVertex> {
    if coords.len() < 3 {
        return Vec::new();
    }
    (1..coords.len() - 1)
        .filter_map(|index| {
            let deflection_rad =
                turning_angle(coords[index - 1], coords[index], coords[index + 1]);
            if deflection_rad < MIN_DEFLECTION_ANGLE_RAD {
                return None;
            }
            let spacing_meters = local_spacing(coords, index, 1);
            (spacing_meters >= MIN_COARSE_VERTEX_SPACING_METERS).then_some(CoarseVertex {
                index,
                deflection_rad,
                spacing_meters,
            })
        })
        .collect()
}

/// Classifies the geometry of a path with `segment_count` station segments.
///
/// Without any coordinate beyond the stations themselves, the path has no
/// intermediate waypoints.
pub fn detect_geometry_resolution(
    coords: &[Coord<f64>],
    segment_count: usize,
) -> GeometryResolution {
    let has_waypoints = coords.len() > segment_count + 1;
    let has_coarse_vertex = !coarse_vertices(coords).is_empty();

    match (has_coarse_vertex, has_waypoints) {
        (false, true) => GeometryResolution::High,
        (false, false) => GeometryResolution::AlmostStraight,
        (true, false) => GeometryResolution::None,
        (true, true) => GeometryResolution::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    #[test]
    fn smooth_geometry_with_waypoints_is_high() {
        let coords: Vec<_> = (0..6)
            .map(|k| coord! { x: k as f64 * 0.001, y: 0.0 })
            .collect();
        let resolution = detect_geometry_resolution(&coords, 2);
        assert_eq!(resolution, GeometryResolution::High);
        assert!(resolution.allows_curve_analysis());
    }

    #[test]
    fn station_to_station_lines() {
        // stations only, nearly aligned
        let aligned = [
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.01, y: 0.0 },
            coord! { x: 0.02, y: 0.0005 },
        ];
        let resolution = detect_geometry_resolution(&aligned, 2);
        assert_eq!(resolution, GeometryResolution::AlmostStraight);
        assert!(!resolution.allows_curve_analysis());

        // stations only, turning 90° at the middle station
        let turning = [
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.01, y: 0.0 },
            coord! { x: 0.01, y: 0.01 },
        ];
        assert_eq!(
            detect_geometry_resolution(&turning, 2),
            GeometryResolution::None
        );
    }

    #[test]
    fn sparse_sharp_waypoint_is_low() {
        let coords = [
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.005, y: 0.0 },
            coord! { x: 0.005, y: 0.005 },
            coord! { x: 0.005, y: 0.01 },
        ];
        assert_eq!(
            detect_geometry_resolution(&coords, 1),
            GeometryResolution::Low
        );
        let coarse = coarse_vertices(&coords);
        assert_eq!(coarse.len(), 1);
        assert_eq!(coarse[0].index, 1);
        assert!(coarse[0].spacing_meters > 500.0);
    }

    #[test]
    fn dense_tight_curve_is_not_coarse() {
        // 15° per vertex but only ~20 m apart
        let coords: Vec<_> = (0..8)
            .map(|k| {
                let theta = (k as f64 * 15.0).to_radians();
                coord! {
                    x: 80.0 * theta.cos() / 111_195.0,
                    y: 80.0 * theta.sin() / 111_195.0,
                }
            })
            .collect();
        assert!(coarse_vertices(&coords).is_empty());
        assert_eq!(
            detect_geometry_resolution(&coords, 1),
            GeometryResolution::High
        );
    }
}
