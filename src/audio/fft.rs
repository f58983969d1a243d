//! FFT spectrum analysis producing byte frequency bins.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use crate::params::AnalyserConfig;

/// Smoothed magnitude spectrum quantized to 8-bit bins
pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    config: AnalyserConfig,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    /// Smoothed linear magnitudes, one per bin (persist across reads)
    smoothed: Vec<f32>,
}

impl SpectrumAnalyser {
    pub fn new(config: AnalyserConfig) -> Self {
        let fft_size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        Self {
            fft,
            window: (0..fft_size).map(|i| hann_window(i, fft_size)).collect(),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; config.bin_count()],
            config,
        }
    }

    pub fn bin_count(&self) -> usize {
        self.config.bin_count()
    }

    /// Analyse the latest `fft_size` samples into `bins`
    ///
    /// `samples` shorter than the window are treated as zero-padded at the
    /// front; extra bins in `bins` are zeroed.
    pub fn analyse(&mut self, samples: &[f32], bins: &mut [u8]) {
        let fft_size = self.config.fft_size;
        let offset = fft_size.saturating_sub(samples.len());
        let recent = &samples[samples.len().saturating_sub(fft_size)..];

        // Apply Hann window
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < offset { 0.0 } else { recent[i - offset] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        let tau = self.config.smoothing_time_constant;
        let min_db = self.config.min_decibels;
        let range_db = self.config.max_decibels - min_db;
        let scale = 1.0 / fft_size as f32;

        bins.fill(0);
        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.buffer[k].norm() * scale;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;

            if let Some(bin) = bins.get_mut(k) {
                *bin = to_byte(*smoothed, min_db, range_db);
            }
        }
    }
}

/// Map a linear magnitude onto 0..=255 across the decibel range
fn to_byte(magnitude: f32, min_db: f32, range_db: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let scaled = 255.0 * (db - min_db) / range_db;
    scaled.clamp(0.0, 255.0) as u8
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(len: usize, cycles_per_window: f32, fft_size: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                amplitude * (2.0 * PI * cycles_per_window * i as f32 / fft_size as f32).sin()
            })
            .collect()
    }

    #[test]
    fn test_hann_window() {
        let size = 1024;

        // Hann window should be 0 at edges, 1 at center
        assert!((hann_window(0, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size - 1, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size / 2, size) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_silence_yields_zero_bins() {
        let mut analyser = SpectrumAnalyser::new(AnalyserConfig::default());
        let mut bins = vec![7u8; analyser.bin_count()];

        analyser.analyse(&[0.0; 64], &mut bins);

        assert!(bins.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_tone_lands_in_its_bin() {
        let config = AnalyserConfig {
            smoothing_time_constant: 0.0,
            ..Default::default()
        };
        let mut analyser = SpectrumAnalyser::new(config);
        let mut bins = vec![0u8; analyser.bin_count()];

        analyser.analyse(&sine(64, 8.0, 64, 0.04), &mut bins);

        let loudest = bins
            .iter()
            .enumerate()
            .max_by_key(|&(_, &b)| b)
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(loudest, 8);
        assert!(bins[8] > bins[20]);
    }

    #[test]
    fn test_smoothing_ramps_up() {
        let mut analyser = SpectrumAnalyser::new(AnalyserConfig::default());
        let mut first = vec![0u8; analyser.bin_count()];
        let mut later = vec![0u8; analyser.bin_count()];
        let tone = sine(64, 4.0, 64, 0.04);

        analyser.analyse(&tone, &mut first);
        for _ in 0..30 {
            analyser.analyse(&tone, &mut later);
        }

        assert!(later[4] > first[4]);
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        let mut analyser = SpectrumAnalyser::new(AnalyserConfig::default());
        let mut bins = vec![0u8; analyser.bin_count()];

        analyser.analyse(&[0.0; 3], &mut bins);

        assert!(bins.iter().all(|&b| b == 0));
    }
}
