//! Transit path collaborator

use std::str::FromStr;

use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};

use crate::{
    Error, SpeedProfileOptions,
    curvature::analyze_curve_radius,
    model::{
        CurveRadiusAnalysis, DistanceSpeedProfile, DistanceSpeedProfileWithStations,
        PathTravelTimeAnalysis, RailMode, SpeedProfileResult, TimeSpeedProfile,
    },
    profile::{
        calculate_segment_travel_times, calculate_speed_profile, speed_by_distance,
        speed_by_distance_with_stations, speed_by_time_with_dwell_times,
    },
};

/// Vehicle characteristics attached to a path, overriding the base options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleDefaults {
    pub acceleration_mps2: Option<f64>,
    pub deceleration_mps2: Option<f64>,
    pub running_speed_kmh: Option<f64>,
}

/// A transit path: geometry, stations and the vehicle running on it.
#[derive(Debug, Clone)]
pub struct RailPath {
    pub id: String,
    pub geography: LineString<f64>,
    /// Coordinate index where each station segment starts
    pub segments: Vec<usize>,
    /// Dwell time at every station, seconds
    pub dwell_times_seconds: Vec<f64>,
    /// Transit mode tag, only rail modes change the options
    pub mode: Option<String>,
    pub defaults: VehicleDefaults,
}

impl RailPath {
    pub fn new(id: impl Into<String>, geography: LineString<f64>, segments: Vec<usize>) -> Self {
        Self {
            id: id.into(),
            geography,
            segments,
            dwell_times_seconds: Vec::new(),
            mode: None,
            defaults: VehicleDefaults::default(),
        }
    }

    #[must_use]
    pub fn with_dwell_times(mut self, dwell_times_seconds: Vec<f64>) -> Self {
        self.dwell_times_seconds = dwell_times_seconds;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: VehicleDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Drops the mode tag so that the mode of the base options applies.
    #[must_use]
    pub fn without_mode(mut self) -> Self {
        self.mode = None;
        self
    }

    pub fn coords(&self) -> &[Coord<f64>] {
        &self.geography.0
    }

    /// Rail mode named by the mode tag, if any.
    pub fn rail_mode(&self) -> Option<RailMode> {
        self.mode
            .as_deref()
            .and_then(|tag| RailMode::from_str(tag).ok())
    }

    /// `base` with the vehicle defaults and rail mode of this path applied.
    ///
    /// The running speed sets both the speed cap and the running speed
    /// the straight threshold is derived from. A mode tag naming a rail
    /// mode takes precedence over the mode of `base`; callers forcing a
    /// mode clear the tag with [`RailPath::without_mode`].
    pub fn speed_profile_options(&self, base: &SpeedProfileOptions) -> SpeedProfileOptions {
        let mut options = *base;
        if let Some(acceleration) = self.defaults.acceleration_mps2 {
            options.acceleration_mps2 = acceleration;
        }
        if let Some(deceleration) = self.defaults.deceleration_mps2 {
            options.deceleration_mps2 = deceleration;
        }
        if let Some(running_speed) = self.defaults.running_speed_kmh {
            options.max_speed_kmh = running_speed;
            options.curve.running_speed_kmh = running_speed;
        }
        if let Some(mode) = self.rail_mode() {
            options.curve.mode = mode;
        }
        options
    }

    fn has_stations(&self) -> bool {
        self.coords().len() >= 2 && !self.segments.is_empty()
    }

    /// # Errors
    ///
    /// Returns an error if the merged options are invalid.
    pub fn curve_analysis(
        &self,
        base: &SpeedProfileOptions,
    ) -> Result<Option<CurveRadiusAnalysis>, Error> {
        if self.coords().len() < 3 {
            return Ok(None);
        }
        let options = self.speed_profile_options(base);
        options.curve.validate()?;
        Ok(Some(analyze_curve_radius(self.coords(), &options.curve)))
    }

    /// # Errors
    ///
    /// Returns an error if the merged options are invalid.
    pub fn speed_profile(
        &self,
        base: &SpeedProfileOptions,
    ) -> Result<Option<SpeedProfileResult>, Error> {
        if self.coords().len() < 2 {
            return Ok(None);
        }
        calculate_speed_profile(self.coords(), &self.speed_profile_options(base)).map(Some)
    }

    /// # Errors
    ///
    /// Returns an error if the merged options or the interval are invalid.
    pub fn distance_profile(
        &self,
        base: &SpeedProfileOptions,
        interval_meters: f64,
    ) -> Result<Option<DistanceSpeedProfile>, Error> {
        if self.coords().len() < 2 {
            return Ok(None);
        }
        speed_by_distance(
            self.coords(),
            &self.speed_profile_options(base),
            interval_meters,
        )
        .map(Some)
    }

    /// # Errors
    ///
    /// Returns an error for invalid options or station indices.
    pub fn station_distance_profile(
        &self,
        base: &SpeedProfileOptions,
        interval_meters: f64,
    ) -> Result<Option<DistanceSpeedProfileWithStations>, Error> {
        if !self.has_stations() {
            return Ok(None);
        }
        speed_by_distance_with_stations(
            self.coords(),
            &self.segments,
            &self.speed_profile_options(base),
            interval_meters,
        )
        .map(Some)
    }

    /// # Errors
    ///
    /// Returns an error for invalid options, station indices or dwell times.
    pub fn time_profile(
        &self,
        base: &SpeedProfileOptions,
        interval_seconds: f64,
    ) -> Result<Option<TimeSpeedProfile>, Error> {
        if !self.has_stations() {
            return Ok(None);
        }
        speed_by_time_with_dwell_times(
            self.coords(),
            &self.segments,
            &self.dwell_times_seconds,
            &self.speed_profile_options(base),
            interval_seconds,
        )
        .map(Some)
    }

    /// # Errors
    ///
    /// Returns an error for invalid options or station indices, or when the
    /// running speed is zero.
    pub fn segment_travel_times(
        &self,
        base: &SpeedProfileOptions,
    ) -> Result<Option<PathTravelTimeAnalysis>, Error> {
        if self.coords().len() < 3 || self.segments.len() < 2 {
            return Ok(None);
        }
        calculate_segment_travel_times(
            self.coords(),
            &self.segments,
            &self.speed_profile_options(base),
        )
        .map(Some)
    }
}
