//! Path documents read by the command-line program

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use geo::LineString;
use railcurves_core::{RailPath, VehicleDefaults};
use serde::Deserialize;

use crate::error::CliError;

/// One path as stored on disk, geography as a GeoJSON LineString.
#[derive(Debug, Clone, Deserialize)]
pub struct PathInput {
    pub id: String,
    pub geography: geojson::Geometry,
    pub segments: Vec<usize>,
    #[serde(default)]
    pub dwell_times_seconds: Vec<f64>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub acceleration_mps2: Option<f64>,
    #[serde(default)]
    pub deceleration_mps2: Option<f64>,
    #[serde(default)]
    pub running_speed_kmh: Option<f64>,
}

impl TryFrom<PathInput> for RailPath {
    type Error = CliError;

    fn try_from(input: PathInput) -> Result<Self, Self::Error> {
        let geography = LineString::<f64>::try_from(input.geography)
            .map_err(|e| CliError::Geography(format!("path {}: {e}", input.id)))?;

        let mut path = RailPath::new(input.id, geography, input.segments)
            .with_dwell_times(input.dwell_times_seconds)
            .with_defaults(VehicleDefaults {
                acceleration_mps2: input.acceleration_mps2,
                deceleration_mps2: input.deceleration_mps2,
                running_speed_kmh: input.running_speed_kmh,
            });
        path.mode = input.mode;
        Ok(path)
    }
}

/// Reads `path`, or standard input for `-`.
fn read_source(path: &Path) -> Result<String, CliError> {
    let io_error = |source| CliError::Io {
        path: PathBuf::from(path),
        source,
    };
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).map_err(io_error)?;
        Ok(text)
    } else {
        fs::read_to_string(path).map_err(io_error)
    }
}

pub fn parse_path(text: &str) -> Result<RailPath, CliError> {
    let input: PathInput = serde_json::from_str(text)?;
    RailPath::try_from(input)
}

pub fn parse_paths(text: &str) -> Result<Vec<RailPath>, CliError> {
    let inputs: Vec<PathInput> = serde_json::from_str(text)?;
    inputs.into_iter().map(RailPath::try_from).collect()
}

pub fn read_path(path: &Path) -> Result<RailPath, CliError> {
    parse_path(&read_source(path)?)
}

pub fn read_paths(path: &Path) -> Result<Vec<RailPath>, CliError> {
    parse_paths(&read_source(path)?)
}
