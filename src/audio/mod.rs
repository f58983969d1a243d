//! Audio plumbing behind the reactive engine.
//!
//! A backend turns an [`AudioReference`] into a looping playback handle with a
//! pass-through analysis tap. The engine only talks to the traits below; the
//! concrete backends decide whether audio reaches a device.

mod context;
#[cfg(feature = "device")]
mod device;
mod fft;
#[cfg(any(test, feature = "mock-audio"))]
pub mod mock;
mod offline;
mod source;
#[cfg(feature = "synth")]
mod synthesis;
mod transport;

use std::rc::Rc;

use crate::error::ReactiveError;
use crate::params::AnalyserConfig;
use crate::reactive::Completer;

// Re-export public types
pub use context::SharedContext;
#[cfg(feature = "device")]
pub use device::{DeviceBackend, DeviceContext};
pub use fft::{hann_window, SpectrumAnalyser};
pub use offline::{OfflineBackend, OfflineContext};
pub use source::{load_source, spawn_loader, AudioReference, LoadedSource, PcmBuffer};
pub use transport::{SampleTap, TapAnalyser, Transport, Voice};

/// Platform that can load sources, play them and tap their output
///
/// All methods run on the engine's thread. `load` is asynchronous and
/// resolves its completer later, possibly from a worker thread.
pub trait AudioBackend {
    /// Shared audio processing context (one per process, reference counted)
    type Context;
    /// Loaded-but-not-playing source, handed over from the loader
    type Source: Send + 'static;
    type Playback: Playback;
    type Analyser: Analyser;

    /// Get the shared context, creating it on first use
    fn acquire_context(&mut self) -> Result<Rc<Self::Context>, ReactiveError>;

    /// Start loading a source; resolve `done` when finished
    fn load(&mut self, reference: &AudioReference, done: Completer<Self::Source>);

    /// Create a looping, paused playback handle for a loaded source
    fn open_playback(
        &mut self,
        context: &Self::Context,
        source: Self::Source,
    ) -> Result<Self::Playback, ReactiveError>;

    /// Attach a pass-through analysis tap; fails if the handle is already tapped
    fn attach_analyser(
        &mut self,
        context: &Self::Context,
        playback: &mut Self::Playback,
        config: &AnalyserConfig,
    ) -> Result<Self::Analyser, ReactiveError>;
}

/// Playback handle for one source
pub trait Playback {
    /// Request playback start; resolve `done` once audio is running
    fn play(&mut self, done: Completer<()>);

    fn pause(&mut self);

    /// Reset position to the start of the source
    fn rewind(&mut self);
}

/// Frequency-domain tap on a playback handle
pub trait Analyser {
    fn bin_count(&self) -> usize;

    /// Fill `bins` with the current byte magnitudes (0..=255)
    fn byte_frequency_data(&mut self, bins: &mut [u8]);
}
