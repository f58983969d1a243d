//! Caller-side mapping from intensity to a glow style.
//!
//! The engine stops at the normalized intensity; turning it into pixels and
//! colors happens here, on the rendering side.

use std::fmt;
use std::str::FromStr;

use crate::params::GlowMapping;
use crate::reactive::GlowSnapshot;

/// RGB accent color, parsed from `"r, g, b"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [r, g, b] = parts.as_slice() else {
            return Err(format!("expected 'r, g, b', got '{}'", s));
        };
        let channel = |v: &str| {
            v.parse::<u8>()
                .map_err(|e| format!("bad color channel '{}': {}", v, e))
        };
        Ok(Self(channel(*r)?, channel(*g)?, channel(*b)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.0, self.1, self.2)
    }
}

/// Visual glow parameters for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowStyle {
    pub radius_px: f32,
    pub opacity: f32,
}

impl GlowStyle {
    /// Box-shadow declaration for an element glowing in `color`
    pub fn box_shadow(&self, color: Rgb) -> String {
        format!(
            "0 0 {:.1}px rgba({}, {:.3})",
            self.radius_px, color, self.opacity
        )
    }
}

impl GlowMapping {
    /// Map a frame's snapshot to a glow; `None` while inactive or not sampling
    ///
    /// An active element with no frequency data (no reference, failed load,
    /// playback start still pending) draws no glow at all.
    pub fn style(&self, snapshot: &GlowSnapshot) -> Option<GlowStyle> {
        if !snapshot.active || !snapshot.sampling {
            return None;
        }
        let intensity = snapshot.intensity.clamp(0.0, 1.0);
        Some(GlowStyle {
            radius_px: self.base_radius_px + intensity * self.radius_scale_px,
            opacity: self.base_opacity + intensity * self.opacity_scale,
        })
    }
}
