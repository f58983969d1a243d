//! Error taxonomy for the reactive glow engine.
//!
//! None of these cross the engine's public contract after construction: the
//! engine logs them, keeps the latest one for diagnostics, and degrades to
//! "visual-only" behaviour.

use thiserror::Error;

/// Failures raised while acquiring audio resources or starting playback
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// Audio source cannot be loaded or decoded
    #[error("audio source '{reference}' unavailable: {reason}")]
    ResourceUnavailable { reference: String, reason: String },

    /// Analysis tap cannot bind to the playback handle
    #[error("analysis tap failed to attach: {0}")]
    AttachFailure(String),

    /// Platform refused to start playback
    #[error("playback start rejected: {0}")]
    PlaybackRejected(String),

    /// Async step finished after the instance moved on
    #[error("stale {step} completion discarded (issued at generation {issued}, now {current})")]
    StaleCompletion {
        step: &'static str,
        issued: u64,
        current: u64,
    },
}

impl ReactiveError {
    /// Build a `ResourceUnavailable` error for a reference
    pub fn unavailable(reference: impl Into<String>, reason: impl ToString) -> Self {
        Self::ResourceUnavailable {
            reference: reference.into(),
            reason: reason.to_string(),
        }
    }

    /// Stale completions are discarded silently rather than reported
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleCompletion { .. })
    }
}

/// Invalid parameter values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("FFT size must be a power of 2 in {min}..={max}, got {got}")]
    FftSize { got: usize, min: usize, max: usize },

    #[error("smoothing time constant must be in [0, 1), got {0}")]
    Smoothing(f32),

    #[error("decibel range is empty: min {min} dB >= max {max} dB")]
    DecibelRange { min: f32, max: f32 },

    #[error("frame rate must be > 0")]
    FrameRate,

    #[error("sample rate must be > 0")]
    SampleRate,
}
