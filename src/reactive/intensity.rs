//! Intensity derivation from byte frequency bins.

/// Largest magnitude a frequency bin can report (8-bit resolution)
pub const MAX_MAGNITUDE: u8 = u8::MAX;

/// Mean bin magnitude normalized to [0, 1]
///
/// An empty bin buffer (pipeline not populated yet) yields 0.
pub fn intensity(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }

    let sum: u64 = bins.iter().map(|&b| u64::from(b)).sum();
    let average = sum as f64 / bins.len() as f64;

    (average / f64::from(MAX_MAGNITUDE)).clamp(0.0, 1.0) as f32
}
