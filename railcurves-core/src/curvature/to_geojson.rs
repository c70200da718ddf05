use geo::{Coord, LineString, Point};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::json;

use crate::{
    Error, RailMode,
    geometry::estimate_max_speed_from_radius,
    model::{CurveRadiusAnalysis, CurveSegment},
};

use super::{CoarseVertex, coarse_vertices};

/// Converts a curve analysis to a `GeoJSON` `FeatureCollection`.
///
/// Contains one `LineString` per section and one `Point` per coarse vertex.
pub fn curve_analysis_to_geojson(
    coords: &[Coord<f64>],
    analysis: &CurveRadiusAnalysis,
    mode: RailMode,
) -> Result<FeatureCollection, Error> {
    let mut features = Vec::with_capacity(analysis.segments.len());

    for (idx, segment) in analysis.segments.iter().enumerate() {
        features.push(create_segment_feature(coords, idx, segment, mode)?);
    }

    for vertex in coarse_vertices(coords) {
        features.push(create_coarse_vertex_feature(coords, &vertex)?);
    }

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}

pub fn curve_analysis_to_geojson_string(
    coords: &[Coord<f64>],
    analysis: &CurveRadiusAnalysis,
    mode: RailMode,
) -> Result<String, Error> {
    serde_json::to_string(&curve_analysis_to_geojson(coords, analysis, mode)?)
        .map_err(|e| Error::GeoJsonError(e.to_string()))
}

fn create_segment_feature(
    coords: &[Coord<f64>],
    idx: usize,
    segment: &CurveSegment,
    mode: RailMode,
) -> Result<Feature, Error> {
    let section = coords
        .get(segment.start_index..=segment.end_index)
        .ok_or_else(|| {
            Error::InvalidData(format!(
                "section {}..={} is outside of the {} coordinates",
                segment.start_index,
                segment.end_index,
                coords.len()
            ))
        })?;
    let geometry = Geometry::new(GeoJsonValue::from(&LineString::new(section.to_vec())));

    let suggested_max_speed = segment
        .is_curve()
        .then(|| estimate_max_speed_from_radius(mode, segment.min_radius_meters));

    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "feature_type": "curve_segment",
            "segment_index": idx,
            "type": segment.curvature_type,
            "start_index": segment.start_index,
            "end_index": segment.end_index,
            "min_radius_meters": segment.min_radius_meters,
            "median_radius_meters": segment.median_radius_meters,
            "max_radius_meters": segment.max_radius_meters,
            "length_meters": segment.length_meters,
            "suggested_max_speed_kmh": suggested_max_speed,
        }
    });

    serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}

fn create_coarse_vertex_feature(
    coords: &[Coord<f64>],
    vertex: &CoarseVertex,
) -> Result<Feature, Error> {
    let geometry = Geometry::new(GeoJsonValue::from(&Point::from(coords[vertex.index])));

    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "feature_type": "large_angle_vertex",
            "index": vertex.index,
            "deflection_degrees": vertex.deflection_rad.to_degrees(),
            "spacing_meters": vertex.spacing_meters,
        }
    });

    serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}
