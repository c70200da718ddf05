use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Cannot cover {distance_meters:.2} m with a zero speed limit")]
    ZeroSpeed { distance_meters: f64 },
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
}
