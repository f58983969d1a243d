//! Spectrum analysis configuration.

use crate::error::ConfigError;

/// Smallest FFT window accepted (16 bins)
pub const MIN_FFT_SIZE: usize = 32;

/// Largest FFT window accepted; the consumer only needs a coarse intensity
pub const MAX_FFT_SIZE: usize = 2048;

/// Analyser parameters, byte-frequency-data semantics
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyserConfig {
    /// FFT window size (must be power of 2)
    /// Default: 64 (= 32 frequency bins)
    pub fft_size: usize,

    /// Blend factor between the previous and the current magnitude frame
    /// 0.0 = no smoothing, values close to 1.0 = very slow response
    pub smoothing_time_constant: f32,

    /// Magnitude mapped to byte value 0 (dBFS)
    pub min_decibels: f32,

    /// Magnitude mapped to byte value 255 (dBFS)
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 64,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    /// Number of frequency bins produced per read
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fft_size.is_power_of_two()
            || self.fft_size < MIN_FFT_SIZE
            || self.fft_size > MAX_FFT_SIZE
        {
            return Err(ConfigError::FftSize {
                got: self.fft_size,
                min: MIN_FFT_SIZE,
                max: MAX_FFT_SIZE,
            });
        }
        if !(0.0..1.0).contains(&self.smoothing_time_constant) {
            return Err(ConfigError::Smoothing(self.smoothing_time_constant));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(ConfigError::DecibelRange {
                min: self.min_decibels,
                max: self.max_decibels,
            });
        }
        Ok(())
    }
}
