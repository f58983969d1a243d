//! Vibeglow library - Audio-reactive glow intensity for visual elements

pub mod audio;
pub mod cli;
pub mod error;
pub mod glow;
pub mod params;
pub mod reactive;
