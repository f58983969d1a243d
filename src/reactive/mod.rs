//! Audio-reactive core: resource manager, sampling loop and intensity.
//!
//! One [`ReactiveGlow`] per visual element. Async steps are versioned with
//! generation tokens so completions that arrive after a rebind, teardown or
//! activation toggle are discarded instead of mutating state.

pub(crate) mod completion;
mod engine;
mod intensity;
mod sampler;

// Re-export public types
pub use completion::{Completer, Generation, Ticket};
pub use engine::{BindPhase, GlowSnapshot, ReactiveGlow};
pub use intensity::{intensity, MAX_MAGNITUDE};
pub use sampler::{LoopState, SamplingLoop};

#[cfg(test)]
mod tests;
