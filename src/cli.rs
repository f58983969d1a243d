//! Command-line argument parsing.

use clap::Parser;

use crate::audio::AudioReference;
use crate::glow::Rgb;
use crate::params::{AnalyserConfig, FrameConfig, OfflineConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "vibeglow")]
#[command(about = "Audio-reactive glow driven by hover activation", long_about = None)]
pub struct Args {
    /// Audio source: WAV path or `synth:default` (omit to disable reactivity)
    pub reference: Option<String>,

    /// Time the pointer enters the element (seconds)
    #[arg(long, value_name = "SECONDS", default_value = "0.5")]
    pub hover_at: f32,

    /// How long the pointer stays on the element (seconds)
    #[arg(long, value_name = "SECONDS", default_value = "4")]
    pub hover_for: f32,

    /// Total run time (seconds)
    #[arg(long, value_name = "SECONDS", default_value = "5")]
    pub duration: f32,

    /// Frames per second (one sample per frame)
    #[arg(long, default_value = "60")]
    pub fps: u32,

    /// FFT window size (power of 2)
    #[arg(long, value_name = "SAMPLES", default_value = "64")]
    pub fft_size: usize,

    /// Spectrum smoothing between frames, in [0, 1)
    #[arg(long, default_value = "0.8")]
    pub smoothing: f32,

    /// Glow color as "r, g, b"
    #[arg(long, default_value = "147, 51, 234")]
    pub color: Rgb,

    /// Analyse without an output device
    #[arg(long)]
    pub offline: bool,
}

impl Args {
    /// Audio reference, `None` when absent or blank
    pub fn audio_reference(&self) -> Option<AudioReference> {
        self.reference.clone().and_then(AudioReference::new)
    }

    pub fn analyser_config(&self) -> AnalyserConfig {
        AnalyserConfig {
            fft_size: self.fft_size,
            smoothing_time_constant: self.smoothing,
            ..Default::default()
        }
    }

    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig { fps: self.fps }
    }

    pub fn offline_config(&self) -> OfflineConfig {
        OfflineConfig::for_frames(44100, &self.frame_config())
    }

    /// Whether the pointer is over the element at `time_s`
    pub fn hovered_at(&self, time_s: f32) -> bool {
        time_s >= self.hover_at && time_s < self.hover_at + self.hover_for
    }

    /// Number of frames in the run
    pub fn total_frames(&self) -> usize {
        (self.duration.max(0.0) * self.fps as f32).ceil() as usize
    }
}
