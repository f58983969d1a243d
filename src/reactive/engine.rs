//! Resource manager for one visual element.
//!
//! `ReactiveGlow` owns the playback handle, the analysis pipeline and the
//! generation tokens for a single element. The host drives it from one thread:
//! it calls `bind`/`activate` when its inputs change and `on_frame` once per
//! rendered frame, then reads `intensity`/`ready` to render.

use std::rc::Rc;

use tracing::{debug, info, trace, warn};

use super::completion::{Completed, Generation, Inbox, Ticket};
use super::intensity::intensity;
use super::sampler::{LoopState, SamplingLoop};
use crate::audio::{Analyser, AudioBackend, AudioReference, Playback};
use crate::error::{ConfigError, ReactiveError};
use crate::params::AnalyserConfig;

/// Where the instance stands with its current reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindPhase {
    /// No reference, or torn down
    Unbound,
    /// Source load in flight
    Loading,
    /// Playback handle and analysis tap attached
    Ready,
    /// Acquisition failed; sampling disabled for this reference
    Failed,
}

/// Playback as last requested of the handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaybackState {
    Stopped,
    Starting,
    Playing,
}

/// What the caller renders from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowSnapshot {
    pub ready: bool,
    pub active: bool,
    pub sampling: bool,
    /// Normalized spectral energy in [0, 1]
    pub intensity: f32,
}

/// Everything acquired for one bound reference
///
/// Fields drop in declaration order: analyser, then playback, then context.
struct Resources<B: AudioBackend> {
    analyser: B::Analyser,
    playback: B::Playback,
    context: Rc<B::Context>,
}

impl<B: AudioBackend> Resources<B> {
    /// Silence and release, tap before handle before context
    fn release(mut self) {
        self.playback.pause();
        let Resources {
            analyser,
            playback,
            context,
        } = self;
        drop(analyser);
        drop(playback);
        drop(context);
    }
}

/// Audio-reactive intensity source bound to one visual element
pub struct ReactiveGlow<B: AudioBackend> {
    backend: B,
    config: AnalyserConfig,

    reference: Option<AudioReference>,
    phase: BindPhase,
    resources: Option<Resources<B>>,

    bind_generation: Generation,
    activation_generation: Generation,
    activated: bool,
    playback: PlaybackState,

    sampler: SamplingLoop,
    bins: Vec<u8>,
    intensity: f32,
    updates: u64,

    loads: Inbox<B::Source>,
    starts: Inbox<()>,
    last_error: Option<ReactiveError>,
}

impl<B: AudioBackend> ReactiveGlow<B> {
    /// Create an unbound instance
    pub fn new(backend: B, config: AnalyserConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            backend,
            bins: Vec::with_capacity(config.bin_count()),
            config,
            reference: None,
            phase: BindPhase::Unbound,
            resources: None,
            bind_generation: Generation::default(),
            activation_generation: Generation::default(),
            activated: false,
            playback: PlaybackState::Stopped,
            sampler: SamplingLoop::new(),
            intensity: 0.0,
            updates: 0,
            loads: Inbox::new(),
            starts: Inbox::new(),
            last_error: None,
        })
    }

    /// Assign the audio reference (`None` disables reactivity)
    ///
    /// Re-binding the same reference is a no-op unless the instance was torn
    /// down. A different reference releases everything before loading again.
    pub fn bind(&mut self, reference: Option<AudioReference>) {
        if reference == self.reference && self.phase != BindPhase::Unbound {
            debug!("bind: already bound to {:?}", self.reference);
            return;
        }

        self.teardown();

        let Some(reference) = reference else {
            debug!("bind: no audio reference, reactivity disabled");
            return;
        };

        info!("Binding audio source {}", reference);
        self.phase = BindPhase::Loading;
        let done = self.loads.completer(self.ticket());
        self.backend.load(&reference, done);
        self.reference = Some(reference);
    }

    /// Follow the caller's activation edge (last call wins)
    pub fn activate(&mut self, on: bool) {
        if on == self.activated && (!on || self.playback != PlaybackState::Stopped) {
            trace!(on, "activate: unchanged");
            return;
        }

        self.activated = on;
        self.activation_generation.bump();

        if on {
            self.begin_playback();
        } else {
            self.halt();
        }
    }

    /// Release every resource; idempotent and safe while a bind is pending
    pub fn teardown(&mut self) {
        self.bind_generation.bump();
        self.halt();

        if let Some(resources) = self.resources.take() {
            resources.release();
            info!("Released audio source {:?}", self.reference);
        }

        // Anything still queued was issued under an older generation
        self.discard_pending();

        self.reference = None;
        self.phase = BindPhase::Unbound;
        self.bins.clear();
    }

    /// Apply async completions that arrived since the last call
    pub fn pump(&mut self) {
        for Completed { ticket, result } in self.loads.drain() {
            self.apply_loaded(ticket, result);
        }
        for Completed { ticket, result } in self.starts.drain() {
            self.apply_started(ticket, result);
        }
    }

    /// Per-frame entry point: apply completions, then sample at most once
    pub fn on_frame(&mut self) -> GlowSnapshot {
        self.pump();
        if self.sampler.take_tick() {
            self.tick();
        }
        self.snapshot()
    }

    pub fn snapshot(&self) -> GlowSnapshot {
        GlowSnapshot {
            ready: self.is_ready(),
            active: self.activated,
            sampling: self.sampler.is_running(),
            intensity: self.intensity,
        }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Playback handle and analysis tap are attached
    pub fn is_ready(&self) -> bool {
        self.phase == BindPhase::Ready
    }

    pub fn is_active(&self) -> bool {
        self.activated
    }

    pub fn phase(&self) -> BindPhase {
        self.phase
    }

    pub fn loop_state(&self) -> LoopState {
        self.sampler.state()
    }

    pub fn reference(&self) -> Option<&AudioReference> {
        self.reference.as_ref()
    }

    /// Number of intensity values published so far
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Latest reported failure, for diagnostics only
    pub fn last_error(&self) -> Option<&ReactiveError> {
        self.last_error.as_ref()
    }

    fn ticket(&self) -> Ticket {
        Ticket {
            bind: self.bind_generation,
            activation: self.activation_generation,
        }
    }

    fn begin_playback(&mut self) {
        let ticket = self.ticket();
        let Some(resources) = self.resources.as_mut() else {
            // Remembered; started once the pipeline is ready
            debug!(phase = ?self.phase, "activate: not ready, start deferred");
            return;
        };

        self.playback = PlaybackState::Starting;
        let done = self.starts.completer(ticket);
        resources.playback.play(done);
    }

    /// Stop sampling and playback, zero the intensity
    fn halt(&mut self) {
        self.sampler.stop();
        self.intensity = 0.0;
        self.playback = PlaybackState::Stopped;

        if let Some(resources) = self.resources.as_mut() {
            resources.playback.pause();
            resources.playback.rewind();
        }
    }

    fn apply_loaded(&mut self, ticket: Ticket, result: Result<B::Source, ReactiveError>) {
        if ticket.bind != self.bind_generation {
            self.report(ReactiveError::StaleCompletion {
                step: "load",
                issued: ticket.bind.get(),
                current: self.bind_generation.get(),
            });
            return;
        }

        match result.and_then(|source| self.acquire(source)) {
            Ok(resources) => {
                self.bins.clear();
                self.bins.resize(resources.analyser.bin_count(), 0);
                self.resources = Some(resources);
                self.phase = BindPhase::Ready;
                info!("Audio source {:?} ready", self.reference);

                if self.activated {
                    self.begin_playback();
                }
            }
            Err(e) => {
                self.phase = BindPhase::Failed;
                self.report(e);
            }
        }
    }

    /// Build context, handle and tap; partial acquisitions drop on failure
    fn acquire(&mut self, source: B::Source) -> Result<Resources<B>, ReactiveError> {
        let context = self.backend.acquire_context()?;
        let mut playback = self.backend.open_playback(&context, source)?;
        let analyser = self
            .backend
            .attach_analyser(&context, &mut playback, &self.config)?;

        Ok(Resources {
            analyser,
            playback,
            context,
        })
    }

    fn apply_started(&mut self, ticket: Ticket, result: Result<(), ReactiveError>) {
        if ticket != self.ticket() {
            self.report(ReactiveError::StaleCompletion {
                step: "playback start",
                issued: ticket.activation.get(),
                current: self.activation_generation.get(),
            });
            return;
        }

        match result {
            Ok(()) => {
                self.playback = PlaybackState::Playing;
                if self.is_ready() && self.activated {
                    self.sampler.start();
                }
            }
            Err(e) => {
                self.playback = PlaybackState::Stopped;
                self.report(e);
            }
        }
    }

    /// Read the bins, publish the intensity, request the next frame
    fn tick(&mut self) {
        let Some(resources) = self.resources.as_mut() else {
            self.sampler.stop();
            return;
        };
        if !self.activated {
            self.sampler.stop();
            return;
        }

        resources.analyser.byte_frequency_data(&mut self.bins);
        self.intensity = intensity(&self.bins);
        self.updates += 1;
        trace!(intensity = self.intensity, "sample");

        let may_run = self.is_ready() && self.activated;
        self.sampler.schedule_next(may_run);
    }

    fn discard_pending(&mut self) {
        let stale = self.loads.drain().len() + self.starts.drain().len();
        if stale > 0 {
            debug!(stale, "discarded pending completions");
        }
    }

    fn report(&mut self, error: ReactiveError) {
        if error.is_stale() {
            debug!("{}", error);
            return;
        }
        warn!("{}", error);
        self.last_error = Some(error);
    }
}

impl<B: AudioBackend> Drop for ReactiveGlow<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
