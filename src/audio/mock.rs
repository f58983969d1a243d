//! Scripted backend for exercising the engine without audio.
//!
//! Loads and playback starts stay pending until the test resolves them, and
//! every live context, playback handle and analyser is counted so tests can
//! assert that nothing leaks.

use std::cell::RefCell;
use std::rc::Rc;

use super::context::SharedContext;
use super::source::AudioReference;
use super::{Analyser, AudioBackend, Playback};
use crate::error::ReactiveError;
use crate::params::AnalyserConfig;
use crate::reactive::Completer;

#[derive(Default)]
struct MockState {
    pending_loads: Vec<(AudioReference, Completer<MockSource>)>,
    pending_plays: Vec<Completer<()>>,
    loads_issued: usize,
    plays_issued: usize,
    live_contexts: usize,
    live_playbacks: usize,
    live_analysers: usize,
    playbacks_opened: usize,
    playing: bool,
    rewinds: usize,
    fail_context: bool,
    fail_attach: bool,
    spectrum: Vec<u8>,
}

/// Loaded mock source
#[derive(Debug, Clone, PartialEq)]
pub struct MockSource {
    pub reference: AudioReference,
}

/// Context counted while alive
pub struct MockContext {
    state: Rc<RefCell<MockState>>,
}

impl Drop for MockContext {
    fn drop(&mut self) {
        self.state.borrow_mut().live_contexts -= 1;
    }
}

/// Backend whose async steps are resolved by hand
#[derive(Clone)]
pub struct MockBackend {
    state: Rc<RefCell<MockState>>,
    contexts: SharedContext<MockContext>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState::default())),
            contexts: SharedContext::new(),
        }
    }

    /// Resolve the oldest pending load
    pub fn resolve_load(&self, result: Result<(), ReactiveError>) -> bool {
        let next = {
            let mut state = self.state.borrow_mut();
            if state.pending_loads.is_empty() {
                None
            } else {
                Some(state.pending_loads.remove(0))
            }
        };
        match next {
            Some((reference, done)) => {
                done.complete(result.map(|()| MockSource { reference }));
                true
            }
            None => false,
        }
    }

    /// Resolve the oldest pending playback start
    pub fn resolve_play(&self, result: Result<(), ReactiveError>) -> bool {
        let next = {
            let mut state = self.state.borrow_mut();
            if state.pending_plays.is_empty() {
                None
            } else {
                Some(state.pending_plays.remove(0))
            }
        };
        match next {
            Some(done) => {
                if result.is_err() {
                    self.state.borrow_mut().playing = false;
                }
                done.complete(result);
                true
            }
            None => false,
        }
    }

    /// Resolve every pending playback start with success
    pub fn resolve_all_plays(&self) {
        while self.resolve_play(Ok(())) {}
    }

    /// Magnitudes every analyser reports (resized to its bin count)
    pub fn set_spectrum(&self, spectrum: Vec<u8>) {
        self.state.borrow_mut().spectrum = spectrum;
    }

    pub fn fail_context(&self, fail: bool) {
        self.state.borrow_mut().fail_context = fail;
    }

    pub fn fail_attach(&self, fail: bool) {
        self.state.borrow_mut().fail_attach = fail;
    }

    pub fn pending_loads(&self) -> usize {
        self.state.borrow().pending_loads.len()
    }

    pub fn pending_plays(&self) -> usize {
        self.state.borrow().pending_plays.len()
    }

    pub fn loads_issued(&self) -> usize {
        self.state.borrow().loads_issued
    }

    pub fn plays_issued(&self) -> usize {
        self.state.borrow().plays_issued
    }

    pub fn live_contexts(&self) -> usize {
        self.state.borrow().live_contexts
    }

    pub fn live_playbacks(&self) -> usize {
        self.state.borrow().live_playbacks
    }

    pub fn live_analysers(&self) -> usize {
        self.state.borrow().live_analysers
    }

    pub fn playbacks_opened(&self) -> usize {
        self.state.borrow().playbacks_opened
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    pub fn rewinds(&self) -> usize {
        self.state.borrow().rewinds
    }

    /// Nothing allocated by this backend is still alive
    pub fn is_idle(&self) -> bool {
        let state = self.state.borrow();
        state.live_contexts == 0 && state.live_playbacks == 0 && state.live_analysers == 0
    }
}

impl AudioBackend for MockBackend {
    type Context = MockContext;
    type Source = MockSource;
    type Playback = MockPlayback;
    type Analyser = MockAnalyser;

    fn acquire_context(&mut self) -> Result<Rc<MockContext>, ReactiveError> {
        let state = Rc::clone(&self.state);
        self.contexts.acquire(|| {
            if state.borrow().fail_context {
                return Err(ReactiveError::unavailable("mock", "context creation failed"));
            }
            state.borrow_mut().live_contexts += 1;
            Ok(MockContext { state })
        })
    }

    fn load(&mut self, reference: &AudioReference, done: Completer<MockSource>) {
        let mut state = self.state.borrow_mut();
        state.loads_issued += 1;
        state.pending_loads.push((reference.clone(), done));
    }

    fn open_playback(
        &mut self,
        _context: &MockContext,
        _source: MockSource,
    ) -> Result<MockPlayback, ReactiveError> {
        let mut state = self.state.borrow_mut();
        state.live_playbacks += 1;
        state.playbacks_opened += 1;
        Ok(MockPlayback {
            state: Rc::clone(&self.state),
            tapped: false,
        })
    }

    fn attach_analyser(
        &mut self,
        _context: &MockContext,
        playback: &mut MockPlayback,
        config: &AnalyserConfig,
    ) -> Result<MockAnalyser, ReactiveError> {
        if self.state.borrow().fail_attach {
            return Err(ReactiveError::AttachFailure("unsupported source".to_string()));
        }
        if playback.tapped {
            return Err(ReactiveError::AttachFailure(
                "playback handle already has an analysis tap".to_string(),
            ));
        }
        playback.tapped = true;
        self.state.borrow_mut().live_analysers += 1;
        Ok(MockAnalyser {
            state: Rc::clone(&self.state),
            bins: config.bin_count(),
        })
    }
}

/// Counted playback handle
pub struct MockPlayback {
    state: Rc<RefCell<MockState>>,
    tapped: bool,
}

impl Playback for MockPlayback {
    fn play(&mut self, done: Completer<()>) {
        let mut state = self.state.borrow_mut();
        state.plays_issued += 1;
        state.playing = true;
        state.pending_plays.push(done);
    }

    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
    }

    fn rewind(&mut self) {
        self.state.borrow_mut().rewinds += 1;
    }
}

impl Drop for MockPlayback {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.live_playbacks -= 1;
        state.playing = false;
    }
}

/// Counted analyser reporting the scripted spectrum
pub struct MockAnalyser {
    state: Rc<RefCell<MockState>>,
    bins: usize,
}

impl Analyser for MockAnalyser {
    fn bin_count(&self) -> usize {
        self.bins
    }

    fn byte_frequency_data(&mut self, bins: &mut [u8]) {
        let state = self.state.borrow();
        for (k, bin) in bins.iter_mut().enumerate() {
            *bin = state.spectrum.get(k).copied().unwrap_or(0);
        }
    }
}

impl Drop for MockAnalyser {
    fn drop(&mut self) {
        self.state.borrow_mut().live_analysers -= 1;
    }
}
