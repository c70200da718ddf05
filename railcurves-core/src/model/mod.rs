//! Data model for rail paths
//!
//! Contains the rail modes with their curve speed coefficients, the path
//! collaborator consumed by the profile operations and the result types.

pub mod mode;
pub mod path;
pub mod profile;

pub use mode::RailMode;
pub use path::{RailPath, VehicleDefaults};
pub use profile::{
    BrakingZone, CurveRadiusAnalysis, CurveSegment, CurveStatistics, CurvatureType,
    DistanceSpeedPoint, DistanceSpeedProfile, DistanceSpeedProfileWithStations, FallbackSource,
    PathTravelTimeAnalysis, SegmentTravelTime, SpeedPoint, SpeedProfileResult,
    StationDistanceSpeedPoint, TimeSpeedPoint, TimeSpeedProfile, ZeroSpeedFallback,
};
