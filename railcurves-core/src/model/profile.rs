//! Result types of curve analysis and speed profile computations

use serde::{Deserialize, Serialize};

use crate::curvature::GeometryResolution;

/// Classification of a path section by the speed impact of its curvature.
///
/// `Straight` does not mean geometrically straight: the radius is large
/// enough for the vehicle to keep its running speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CurvatureType {
    Curve,
    Straight,
}

/// Contiguous section of a path with a single curvature classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSegment {
    /// First vertex of the section
    pub start_index: usize,
    /// Last vertex of the section, shared with the next section
    pub end_index: usize,
    pub min_radius_meters: f64,
    /// Upper median of the radii inside the section
    pub median_radius_meters: f64,
    pub max_radius_meters: f64,
    /// Geodesic length of the section
    pub length_meters: f64,
    /// `[lon, lat]` of the first vertex
    pub start_coord: [f64; 2],
    /// `[lon, lat]` of the last vertex
    pub end_coord: [f64; 2],
    #[serde(rename = "type")]
    pub curvature_type: CurvatureType,
}

impl CurveSegment {
    pub fn is_curve(&self) -> bool {
        self.curvature_type == CurvatureType::Curve
    }
}

/// Path level statistics of a curve analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveStatistics {
    /// Tightest radius over all curve sections
    pub min_radius_meters: Option<f64>,
    /// Mean of the minimum radius of every curve section
    pub avg_curve_radius_meters: Option<f64>,
    pub total_curve_length_meters: f64,
    pub total_straight_length_meters: f64,
    /// Curve speed limit of the tightest curve
    pub suggested_max_speed_kmh: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveRadiusAnalysis {
    /// One entry per vertex, `None` where no reliable radius exists
    pub radii_at_vertices: Vec<Option<f64>>,
    pub segments: Vec<CurveSegment>,
    pub statistics: CurveStatistics,
}

/// Speed at a vertex of the path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedPoint {
    pub index: usize,
    /// Distance from the first vertex
    pub distance_meters: f64,
    /// Speed limit imposed by the curve radius, capped at the running speed
    pub max_speed_by_radius_kmh: f64,
    /// Speed reachable under acceleration and braking constraints
    pub achievable_speed_kmh: f64,
    pub is_braking: bool,
    pub is_accelerating: bool,
}

/// Vertex range over which the vehicle slows down
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrakingZone {
    pub start_index: usize,
    pub end_index: usize,
    pub reason: String,
}

/// Where the speed of a zero-speed fallback came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackSource {
    /// Mean of the non-zero speeds at the neighbouring vertices
    NeighbourAverage,
    /// The configured minimum fallback speed
    MinimumSpeed,
}

/// Edge travelled at a substitute speed because both of its ends are at
/// standstill.
///
/// Only happens with pathological constraints (for example a zero maximum
/// speed); the time of these edges is an approximation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZeroSpeedFallback {
    pub start_index: usize,
    pub end_index: usize,
    pub distance_meters: f64,
    pub fallback_speed_mps: f64,
    pub source: FallbackSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedProfileResult {
    pub speed_points: Vec<SpeedPoint>,
    pub total_time_seconds: f64,
    pub average_speed_kmh: f64,
    pub braking_zones: Vec<BrakingZone>,
    /// Lowest achievable speed on the path
    pub min_speed_kmh: f64,
    /// Edges timed with a substitute speed, empty for regular inputs
    pub fallbacks: Vec<ZeroSpeedFallback>,
}

impl SpeedProfileResult {
    pub fn total_distance_meters(&self) -> f64 {
        self.speed_points
            .last()
            .map_or(0.0, |point| point.distance_meters)
    }
}

/// Sample of a distance based speed profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceSpeedPoint {
    pub distance_meters: f64,
    pub speed_kmh: f64,
    pub max_speed_by_radius_kmh: f64,
}

/// Speed sampled at regular distance intervals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceSpeedProfile {
    pub points: Vec<DistanceSpeedPoint>,
    pub interval_meters: f64,
    pub total_distance_meters: f64,
    pub total_time_seconds: f64,
    pub max_speed_kmh: f64,
    pub min_speed_kmh: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationDistanceSpeedPoint {
    #[serde(flatten)]
    pub point: DistanceSpeedPoint,
    /// Segment between station `i` and station `i + 1`
    pub segment_index: usize,
    pub is_at_station: bool,
    pub station_index: Option<usize>,
}

/// Distance based speed profile stopping at every station
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceSpeedProfileWithStations {
    pub points: Vec<StationDistanceSpeedPoint>,
    pub interval_meters: f64,
    pub total_distance_meters: f64,
    pub total_time_seconds: f64,
    pub max_speed_kmh: f64,
    pub min_speed_kmh: f64,
    pub segment_count: usize,
    /// Cumulative distance of every station, starting with 0
    pub station_distances: Vec<f64>,
}

/// Sample of a time based speed profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpeedPoint {
    pub time_seconds: f64,
    pub distance_meters: f64,
    pub speed_kmh: f64,
    pub max_speed_by_radius_kmh: f64,
    pub segment_index: usize,
    /// Stopped at a station
    pub is_dwelling: bool,
    pub station_index: Option<usize>,
}

/// Speed sampled at regular time intervals, including dwell times
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSpeedProfile {
    pub points: Vec<TimeSpeedPoint>,
    pub interval_seconds: f64,
    pub total_distance_meters: f64,
    /// Running time plus dwell time
    pub total_time_seconds: f64,
    pub total_running_time_seconds: f64,
    pub total_dwell_time_seconds: f64,
    pub max_speed_kmh: f64,
    pub segment_count: usize,
    /// Arrival time at every station, starting with 0
    pub station_times: Vec<f64>,
    pub dwell_times_seconds: Vec<f64>,
}

/// Travel time of the segment between two consecutive stations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentTravelTime {
    pub segment_index: usize,
    pub distance_meters: f64,
    /// Running speed with acceleration and braking at the stations
    pub travel_time_without_curves_seconds: f64,
    /// Same, with curve speed limits
    pub travel_time_with_curves_seconds: f64,
    /// Curve limited running time without stopping
    pub no_dwell_time_with_curves_seconds: f64,
    /// Never negative
    pub difference_seconds: f64,
    pub difference_percent: f64,
    pub min_radius_in_segment_meters: Option<f64>,
    pub curve_speed_limit_kmh: Option<f64>,
    pub entry_speed_kmh: f64,
    pub exit_speed_kmh: f64,
}

/// Travel times of every segment of a path, with and without curves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathTravelTimeAnalysis {
    pub segments: Vec<SegmentTravelTime>,
    pub total_time_without_curves_seconds: f64,
    pub total_time_with_curves_seconds: f64,
    pub total_no_dwell_curve_time_seconds: f64,
    pub total_difference_seconds: f64,
    pub total_difference_percent: f64,
    pub total_distance_meters: f64,
    pub avg_speed_without_curves_kmh: f64,
    pub avg_speed_with_curves_kmh: f64,
    pub geometry_resolution: GeometryResolution,
}
