//! Curve-constrained speed profiles for rail paths.
//!
//! Given the geometry of a transit path and the kinematic limits of the
//! vehicle running on it, this crate estimates the curve radius at every
//! vertex, classifies the path into curve and straight-like sections and
//! computes a speed profile that respects curve speed limits,
//! acceleration and braking rates and the stops at every station.
//!
//! All computations are pure functions of their inputs; batches of paths
//! can be evaluated in parallel with [`algo::batch`].

pub mod algo;
pub mod config;
pub mod curvature;
pub mod error;
pub mod geometry;
pub mod model;
pub mod prelude;
pub mod profile;
pub mod units;

pub use config::{CurveRadiusOptions, SpeedProfileOptions};
pub use error::Error;
pub use model::{RailMode, RailPath, VehicleDefaults};

/// Speeds below this value (m/s) are treated as standstill.
pub const SPEED_EPSILON_MPS: f64 = 0.01;

/// Distances below this value (m) are treated as zero length.
pub const DISTANCE_EPSILON_METERS: f64 = 0.01;
