//! Speed unit conversions.

const KMH_PER_MPS: f64 = 3.6;

#[inline]
pub fn kph_to_mps(speed_kmh: f64) -> f64 {
    speed_kmh / KMH_PER_MPS
}

#[inline]
pub fn mps_to_kph(speed_mps: f64) -> f64 {
    speed_mps * KMH_PER_MPS
}

/// Rounds to the given number of decimals, used for plotting output.
#[inline]
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
