//! Frame cadence and offline transport configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// Host frame cadence (one sampling tick per rendered frame)
#[derive(Debug, Clone, PartialEq)]
pub struct FrameConfig {
    /// Frames per second
    pub fps: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { fps: 60 }
    }
}

impl FrameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 {
            return Err(ConfigError::FrameRate);
        }
        Ok(())
    }

    /// Wall-clock time between frames
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}

/// Device-less transport configuration
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineConfig {
    /// Virtual output sample rate (Hz)
    pub sample_rate_hz: u32,

    /// Audio frames rendered per analyser read
    /// 735 = 44100 Hz / 60 fps
    pub frames_per_tick: usize,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self::for_frames(44100, &FrameConfig::default())
    }
}

impl OfflineConfig {
    /// Advance exactly one video frame's worth of audio per tick
    pub fn for_frames(sample_rate_hz: u32, frames: &FrameConfig) -> Self {
        Self {
            sample_rate_hz,
            frames_per_tick: (sample_rate_hz / frames.fps.max(1)) as usize,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::SampleRate);
        }
        Ok(())
    }
}
