//! Options for curve and speed profile calculations and the heuristic
//! thresholds they rely on.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::{Error, RailMode};

/// Default running speed (km/h) used to derive the straight-like threshold.
/// Upper limit of conventional intercity rail outside high-speed lines.
pub const DEFAULT_RUNNING_SPEED_KMH: f64 = 160.0;

/// Local vertex spacing (m) above which computed radii are checked for
/// reliability. Denser geometry is always trusted.
pub const MIN_SPACING_FOR_RELIABILITY_CHECK_METERS: f64 = 200.0;

/// A radius smaller than `local spacing * factor` is not measurable with
/// that spacing and is discarded. 1.5 corresponds to ~39° per chord.
pub const MIN_RELIABLE_RADIUS_SPACING_FACTOR: f64 = 1.5;

/// Deflection angle above which a vertex is a direction change (10°).
pub const MIN_DEFLECTION_ANGLE_RAD: f64 = 10.0 * PI / 180.0;

/// Local spacing (m) above which a large-angle vertex is considered
/// under-sampled rather than part of a densely drawn tight curve.
pub const MIN_COARSE_VERTEX_SPACING_METERS: f64 = 50.0;

/// Triangles whose squared area is below this fraction of `s⁴` (`s` the
/// semi-perimeter) are treated as degenerate. Relative, so that rounding
/// noise on long collinear runs never yields a radius.
pub const DEGENERATE_AREA_RATIO: f64 = 1e-12;

/// Planar cross products below this magnitude count as no turn.
pub const STRAIGHT_CROSS_PRODUCT_THRESHOLD: f64 = 1e-10;

/// Default sampling interval (m) of distance based profiles.
pub const DEFAULT_DISTANCE_INTERVAL_METERS: f64 = 10.0;

/// Default sampling interval (s) of time based profiles.
pub const DEFAULT_TIME_INTERVAL_SECONDS: f64 = 1.0;

/// Resolution (m) of the kinematic waypoint table of the time profile.
pub const DEFAULT_KINEMATIC_RESAMPLE_INTERVAL_METERS: f64 = 10.0;

/// Minimum number of kinematic waypoints per inter-station segment.
pub const MIN_KINEMATIC_SAMPLES: usize = 50;

/// Spacing (m) of synthetic flat-speed constraints when curves are bypassed.
pub const SYNTHETIC_CONSTRAINT_SPACING_METERS: f64 = 50.0;

/// Fewer points would leave the forward/backward pass stuck at zero
/// between two stopped endpoints.
pub const MIN_SYNTHETIC_CONSTRAINTS: usize = 3;

/// Options for the per-vertex radius estimation and curve classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveRadiusOptions {
    pub mode: RailMode,
    /// Running speed (km/h) from which the straight threshold is derived
    pub running_speed_kmh: f64,
    /// Uses the points at `i - stride`, `i`, `i + stride`
    pub stride: usize,
    /// Overrides the threshold derived from `running_speed_kmh` when set
    pub straight_threshold_meters: Option<f64>,
    /// Smaller radii are raised to this floor (digitization noise)
    pub min_plausible_radius_meters: f64,
    /// Larger radii are capped (effectively straight)
    pub max_radius_meters: f64,
    /// Shorter curve runs are reported as straight-like
    pub min_curve_points: usize,
}

impl Default for CurveRadiusOptions {
    fn default() -> Self {
        Self {
            mode: RailMode::Rail,
            running_speed_kmh: DEFAULT_RUNNING_SPEED_KMH,
            stride: 1,
            straight_threshold_meters: None,
            min_plausible_radius_meters: 50.0,
            max_radius_meters: 10_000.0,
            min_curve_points: 2,
        }
    }
}

impl CurveRadiusOptions {
    pub fn for_mode(mode: RailMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Radius threshold (m) separating curves from straight-like sections.
    pub fn straight_threshold(&self) -> f64 {
        self.straight_threshold_meters.unwrap_or_else(|| {
            self.mode
                .straight_threshold_meters(self.running_speed_kmh)
        })
    }

    /// Stride used for the three-point radius, never below 1.
    pub(crate) fn effective_stride(&self) -> usize {
        self.stride.max(1)
    }

    /// # Errors
    ///
    /// Returns an error if a threshold is not a finite positive number.
    pub fn validate(&self) -> Result<(), Error> {
        if self.stride == 0 {
            return Err(Error::InvalidParameter(
                "stride must be at least 1".to_string(),
            ));
        }
        require_positive("min_plausible_radius_meters", self.min_plausible_radius_meters)?;
        require_positive("max_radius_meters", self.max_radius_meters)?;
        if self.min_plausible_radius_meters > self.max_radius_meters {
            return Err(Error::InvalidParameter(format!(
                "min_plausible_radius_meters ({}) exceeds max_radius_meters ({})",
                self.min_plausible_radius_meters, self.max_radius_meters
            )));
        }
        if let Some(threshold) = self.straight_threshold_meters {
            require_positive("straight_threshold_meters", threshold)?;
        }
        Ok(())
    }
}

/// Options for speed profiles and segment travel times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedProfileOptions {
    #[serde(flatten)]
    pub curve: CurveRadiusOptions,
    /// m/s²
    pub acceleration_mps2: f64,
    /// Service braking rate, m/s²
    pub deceleration_mps2: f64,
    pub initial_speed_kmh: f64,
    pub final_speed_kmh: f64,
    pub max_speed_kmh: f64,
    /// Used when both ends of an edge are at standstill and no neighbour
    /// speed is available, m/s
    pub min_fallback_speed_mps: f64,
    pub kinematic_resample_interval_meters: f64,
}

impl Default for SpeedProfileOptions {
    fn default() -> Self {
        Self {
            curve: CurveRadiusOptions::default(),
            acceleration_mps2: 0.5,
            deceleration_mps2: 0.8,
            initial_speed_kmh: 0.0,
            final_speed_kmh: 0.0,
            max_speed_kmh: 80.0,
            min_fallback_speed_mps: 1.0,
            kinematic_resample_interval_meters: DEFAULT_KINEMATIC_RESAMPLE_INTERVAL_METERS,
        }
    }
}

impl SpeedProfileOptions {
    pub fn mode(&self) -> RailMode {
        self.curve.mode
    }

    /// Same options with the vehicle stopped at both ends.
    pub fn station_to_station(&self) -> Self {
        Self {
            initial_speed_kmh: 0.0,
            final_speed_kmh: 0.0,
            ..*self
        }
    }

    /// # Errors
    ///
    /// Returns an error if acceleration, deceleration or the fallback speed
    /// are not positive, or if a speed is negative or not finite.
    pub fn validate(&self) -> Result<(), Error> {
        self.curve.validate()?;
        require_positive("acceleration_mps2", self.acceleration_mps2)?;
        require_positive("deceleration_mps2", self.deceleration_mps2)?;
        require_positive("min_fallback_speed_mps", self.min_fallback_speed_mps)?;
        require_positive(
            "kinematic_resample_interval_meters",
            self.kinematic_resample_interval_meters,
        )?;
        require_non_negative("initial_speed_kmh", self.initial_speed_kmh)?;
        require_non_negative("final_speed_kmh", self.final_speed_kmh)?;
        require_non_negative("max_speed_kmh", self.max_speed_kmh)?;
        Ok(())
    }
}

pub(crate) fn require_positive(name: &str, value: f64) -> Result<(), Error> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{name} must be a finite positive number (got {value})"
        )))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<(), Error> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{name} must be a finite non-negative number (got {value})"
        )))
    }
}
