//! Mapping from intensity to glow parameters.

/// Linear mapping from normalized intensity to a glow effect
///
/// Applied by the caller; the engine only produces the intensity scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct GlowMapping {
    /// Glow radius at zero intensity (pixels)
    pub base_radius_px: f32,

    /// Extra radius at full intensity (pixels)
    /// Formula: radius = base_radius + intensity * this_scale
    pub radius_scale_px: f32,

    /// Glow color opacity at zero intensity
    pub base_opacity: f32,

    /// Extra opacity at full intensity
    /// Formula: opacity = base_opacity + intensity * this_scale
    pub opacity_scale: f32,
}

impl Default for GlowMapping {
    fn default() -> Self {
        Self {
            base_radius_px: 30.0,
            radius_scale_px: 50.0,
            base_opacity: 0.1,
            opacity_scale: 0.3,
        }
    }
}
