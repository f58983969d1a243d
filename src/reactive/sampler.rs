//! Per-frame sampling loop state machine.
//!
//! The loop never schedules itself recursively. The host calls the engine
//! once per rendered frame; the loop only records whether the next frame
//! should sample. Stopping is a single state flip that also drops the
//! pending request, so no sample can fire after `stop`.

use tracing::trace;

/// Loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// `Idle → Running → Idle` sampling loop
#[derive(Debug)]
pub struct SamplingLoop {
    state: LoopState,
    /// Next-frame request outstanding
    tick_requested: bool,
}

impl Default for SamplingLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplingLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            tick_requested: false,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Enter `Running` and request the first tick; no-op when already running
    pub fn start(&mut self) {
        if self.state == LoopState::Idle {
            trace!("sampling loop started");
            self.state = LoopState::Running;
            self.tick_requested = true;
        }
    }

    /// Return to `Idle`, cancelling any pending tick
    pub fn stop(&mut self) {
        if self.state == LoopState::Running {
            trace!("sampling loop stopped");
        }
        self.state = LoopState::Idle;
        self.tick_requested = false;
    }

    /// Consume the pending tick for this frame, if any
    pub fn take_tick(&mut self) -> bool {
        let due = self.state == LoopState::Running && self.tick_requested;
        self.tick_requested = false;
        due
    }

    /// Request the next tick, re-validating that sampling may still run
    pub fn schedule_next(&mut self, may_run: bool) {
        if self.state == LoopState::Running && may_run {
            self.tick_requested = true;
        } else {
            self.stop();
        }
    }
}
