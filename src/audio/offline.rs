//! Device-less backend: the transport advances one video frame of audio per
//! analyser read, so analysis runs deterministically without an output device.

use std::rc::Rc;
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::context::SharedContext;
use super::source::{spawn_loader, AudioReference, LoadedSource};
use super::transport::{lock, TapAnalyser, Transport, Voice};
use super::{AudioBackend, Playback};
use crate::error::ReactiveError;
use crate::params::{AnalyserConfig, OfflineConfig};
use crate::reactive::Completer;

/// Virtual output shared by all offline instances
#[derive(Debug)]
pub struct OfflineContext {
    pub sample_rate_hz: u32,
}

/// Backend rendering audio without a device
#[derive(Clone)]
pub struct OfflineBackend {
    config: OfflineConfig,
    contexts: SharedContext<OfflineContext>,
}

impl OfflineBackend {
    pub fn new(config: OfflineConfig) -> Self {
        Self::with_contexts(config, SharedContext::new())
    }

    /// Share a context pool with other backends
    pub fn with_contexts(config: OfflineConfig, contexts: SharedContext<OfflineContext>) -> Self {
        Self { config, contexts }
    }
}

impl AudioBackend for OfflineBackend {
    type Context = OfflineContext;
    type Source = LoadedSource;
    type Playback = OfflinePlayback;
    type Analyser = TapAnalyser;

    fn acquire_context(&mut self) -> Result<Rc<OfflineContext>, ReactiveError> {
        let sample_rate_hz = self.config.sample_rate_hz;
        self.contexts.acquire(|| {
            debug!("Offline context @ {}Hz", sample_rate_hz);
            Ok(OfflineContext { sample_rate_hz })
        })
    }

    fn load(&mut self, reference: &AudioReference, done: Completer<LoadedSource>) {
        spawn_loader(reference.clone(), done);
    }

    fn open_playback(
        &mut self,
        context: &OfflineContext,
        source: LoadedSource,
    ) -> Result<OfflinePlayback, ReactiveError> {
        let voice = Voice::new(source, context.sample_rate_hz)?;
        Ok(OfflinePlayback {
            transport: Arc::new(Mutex::new(Transport::new(voice))),
        })
    }

    fn attach_analyser(
        &mut self,
        _context: &OfflineContext,
        playback: &mut OfflinePlayback,
        config: &AnalyserConfig,
    ) -> Result<TapAnalyser, ReactiveError> {
        TapAnalyser::attach(&playback.transport, config, self.config.frames_per_tick)
    }
}

/// Offline playback handle
pub struct OfflinePlayback {
    transport: Arc<Mutex<Transport>>,
}

impl Playback for OfflinePlayback {
    fn play(&mut self, done: Completer<()>) {
        lock(&self.transport).set_playing(true);
        done.complete(Ok(()));
    }

    fn pause(&mut self) {
        lock(&self.transport).set_playing(false);
    }

    fn rewind(&mut self) {
        lock(&self.transport).rewind();
    }
}
