pub use crate::{DISTANCE_EPSILON_METERS, SPEED_EPSILON_MPS};

// Re-export key components
pub use crate::algo::{bulk_time_profiles, bulk_travel_times};
pub use crate::config::{CurveRadiusOptions, SpeedProfileOptions};
pub use crate::curvature::{
    GeometryResolution, analyze_curve_radius, curve_analysis_to_geojson,
    detect_geometry_resolution, segment_path_by_curvature,
};
pub use crate::error::Error;
pub use crate::geometry::{estimate_max_speed_from_radius, radii_at_vertices};
pub use crate::model::{RailMode, RailPath, VehicleDefaults};
pub use crate::profile::{
    calculate_segment_travel_times, calculate_speed_profile, segment_travel_time,
    speed_by_distance, speed_by_distance_with_stations, speed_by_time_with_dwell_times,
};

// Result types
pub use crate::model::{
    CurveRadiusAnalysis, DistanceSpeedProfile, DistanceSpeedProfileWithStations,
    PathTravelTimeAnalysis, SpeedProfileResult, TimeSpeedProfile,
};
