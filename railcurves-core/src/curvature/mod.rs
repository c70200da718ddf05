//! Classification of a path into curve and straight-like sections

pub mod resolution;
pub mod to_geojson;

use geo::Coord;
use itertools::Itertools;

use crate::{
    CurveRadiusOptions,
    geometry::{
        TurnDirection, distance_meters, estimate_max_speed_from_radius, radii_at_vertices,
        turn_directions,
    },
    model::{CurvatureType, CurveRadiusAnalysis, CurveSegment, CurveStatistics},
};

pub use resolution::{
    CoarseVertex, GeometryResolution, coarse_vertices, detect_geometry_resolution,
};
pub use to_geojson::curve_analysis_to_geojson;

/// Curvature class of every vertex, before direction splitting.
///
/// A vertex is a curve vertex when its radius is at most the straight
/// threshold; runs of curve vertices shorter than `min_curve_points` are
/// reclassified as straight.
fn vertex_types(radii: &[Option<f64>], options: &CurveRadiusOptions) -> Vec<CurvatureType> {
    let threshold = options.straight_threshold();
    let mut types: Vec<CurvatureType> = radii
        .iter()
        .map(|radius| match radius {
            Some(r) if *r <= threshold => CurvatureType::Curve,
            _ => CurvatureType::Straight,
        })
        .collect();

    let mut start = 0;
    for (kind, run) in &types.clone().into_iter().chunk_by(|kind| *kind) {
        let len = run.count();
        if kind == CurvatureType::Curve && len < options.min_curve_points {
            types[start..start + len].fill(CurvatureType::Straight);
        }
        start += len;
    }

    types
}

fn create_segment(
    coords: &[Coord<f64>],
    start_index: usize,
    end_index: usize,
    mut radii: Vec<f64>,
    curvature_type: CurvatureType,
    options: &CurveRadiusOptions,
) -> CurveSegment {
    let length_meters = coords[start_index..=end_index]
        .iter()
        .tuple_windows()
        .map(|(a, b)| distance_meters(*a, *b))
        .sum();

    radii.retain(|r| *r > 0.0);
    radii.sort_by(f64::total_cmp);
    let (min, median, max) = match (radii.first(), radii.last()) {
        (Some(min), Some(max)) => (*min, radii[radii.len() / 2], *max),
        _ => (
            options.max_radius_meters,
            options.max_radius_meters,
            options.max_radius_meters,
        ),
    };

    let start = coords[start_index];
    let end = coords[end_index];
    CurveSegment {
        start_index,
        end_index,
        min_radius_meters: min,
        median_radius_meters: median,
        max_radius_meters: max,
        length_meters,
        start_coord: [start.x, start.y],
        end_coord: [end.x, end.y],
        curvature_type,
    }
}

/// Partitions a path into contiguous curve and straight-like sections.
///
/// Consecutive sections share their boundary vertex. A curve is split where
/// the turn direction flips between left and right, so an S-curve yields
/// two curve sections. Returns an empty list for fewer than 2 coordinates.
pub fn segment_path_by_curvature(
    coords: &[Coord<f64>],
    radii: &[Option<f64>],
    options: &CurveRadiusOptions,
) -> Vec<CurveSegment> {
    let n = coords.len();
    let mut segments = Vec::new();
    if n < 2 {
        return segments;
    }

    let radius_at = |i: usize| radii.get(i).copied().flatten();
    let padded: Vec<Option<f64>> = (0..n).map(radius_at).collect();
    let types = vertex_types(&padded, options);
    let directions = turn_directions(coords);

    let mut start = 0;
    let mut current_type = types[0];
    let mut current_direction = directions[0];
    let mut current_radii: Vec<f64> = radius_at(0).into_iter().collect();

    for i in 1..n {
        let new_type = types[i];
        let new_direction = directions[i];

        let type_changed = new_type != current_type;
        let direction_flipped = current_type == CurvatureType::Curve
            && new_type == CurvatureType::Curve
            && matches!(
                (current_direction, new_direction),
                (Some(TurnDirection::Left), Some(TurnDirection::Right))
                    | (Some(TurnDirection::Right), Some(TurnDirection::Left))
            );

        if type_changed || direction_flipped {
            segments.push(create_segment(
                coords,
                start,
                i,
                std::mem::take(&mut current_radii),
                current_type,
                options,
            ));
            start = i;
            current_type = new_type;
            current_direction = new_direction;
            current_radii.extend(radius_at(i));
        } else {
            current_radii.extend(radius_at(i));
            if matches!(
                new_direction,
                Some(TurnDirection::Left | TurnDirection::Right)
            ) {
                current_direction = new_direction;
            }
        }
    }

    if n - 1 > start {
        segments.push(create_segment(
            coords,
            start,
            n - 1,
            current_radii,
            current_type,
            options,
        ));
    }

    segments
}

/// Computes vertex radii, sections and path statistics.
pub fn analyze_curve_radius(
    coords: &[Coord<f64>],
    options: &CurveRadiusOptions,
) -> CurveRadiusAnalysis {
    let radii_at_vertices = radii_at_vertices(coords, options);
    let segments = segment_path_by_curvature(coords, &radii_at_vertices, options);

    let (curves, straights): (Vec<&CurveSegment>, Vec<&CurveSegment>) =
        segments.iter().partition(|s| s.is_curve());

    let curve_min_radii: Vec<f64> = curves.iter().map(|s| s.min_radius_meters).collect();
    let min_radius_meters = curve_min_radii.iter().copied().reduce(f64::min);
    let avg_curve_radius_meters = (!curve_min_radii.is_empty())
        .then(|| curve_min_radii.iter().sum::<f64>() / curve_min_radii.len() as f64);

    let statistics = CurveStatistics {
        min_radius_meters,
        avg_curve_radius_meters,
        total_curve_length_meters: curves.iter().map(|s| s.length_meters).sum(),
        total_straight_length_meters: straights.iter().map(|s| s.length_meters).sum(),
        suggested_max_speed_kmh: min_radius_meters
            .map(|radius| estimate_max_speed_from_radius(options.mode, radius)),
    };

    CurveRadiusAnalysis {
        radii_at_vertices,
        segments,
        statistics,
    }
}
