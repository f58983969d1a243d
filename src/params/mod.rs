//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Physical units (Hz, pixels, decibels, etc.)
//! - Documented ranges and meanings
//! - Validation where a bad value would break analysis

mod analysis;
mod frame;
mod glow;

// Re-export all types
pub use analysis::{AnalyserConfig, MAX_FFT_SIZE, MIN_FFT_SIZE};
pub use frame::{FrameConfig, OfflineConfig};
pub use glow::GlowMapping;
