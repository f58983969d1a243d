//! Looping transport shared between a playback handle and its analysis tap.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::fft::SpectrumAnalyser;
use super::source::{LoadedSource, PcmBuffer};
use super::Analyser;
use crate::error::ReactiveError;
use crate::params::AnalyserConfig;

/// Sound generator that loops forever
pub enum Voice {
    /// Decoded PCM with a fractional read position (source frames)
    Pcm {
        pcm: PcmBuffer,
        position: f64,
        /// Source frames per output frame
        step: f64,
    },
    #[cfg(feature = "synth")]
    Synth(Box<super::synthesis::SynthVoice>),
}

impl Voice {
    /// Build a voice rendering at `output_rate_hz`
    pub fn new(source: LoadedSource, output_rate_hz: u32) -> Result<Self, ReactiveError> {
        match source {
            LoadedSource::Pcm(pcm) => {
                if pcm.frames() == 0 {
                    return Err(ReactiveError::unavailable("pcm", "no audio frames"));
                }
                let step = pcm.sample_rate_hz as f64 / output_rate_hz.max(1) as f64;
                Ok(Self::Pcm {
                    pcm,
                    position: 0.0,
                    step,
                })
            }
            #[cfg(feature = "synth")]
            LoadedSource::Synth(code) => Ok(Self::Synth(Box::new(
                super::synthesis::SynthVoice::new(code, output_rate_hz)?,
            ))),
        }
    }

    /// Next stereo frame, wrapping at the end of the source
    pub fn next_frame(&mut self) -> [f32; 2] {
        match self {
            Self::Pcm {
                pcm,
                position,
                step,
            } => {
                let frames = pcm.frames();
                let index = (*position as usize).min(frames - 1);
                let frame = [pcm.samples[index * 2], pcm.samples[index * 2 + 1]];

                *position += *step;
                if *position >= frames as f64 {
                    *position %= frames as f64;
                }
                frame
            }
            #[cfg(feature = "synth")]
            Self::Synth(synth) => synth.next_frame(),
        }
    }

    /// Restart from the first frame
    pub fn rewind(&mut self) {
        match self {
            Self::Pcm { position, .. } => *position = 0.0,
            #[cfg(feature = "synth")]
            Self::Synth(synth) => synth.rewind(),
        }
    }
}

/// Ring of the most recent mono samples seen by the output
pub struct SampleTap {
    window: usize,
    samples: VecDeque<f32>,
}

impl SampleTap {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            samples: VecDeque::with_capacity(window),
        }
    }

    pub fn push(&mut self, frame: [f32; 2]) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(0.5 * (frame[0] + frame[1]));
    }

    /// Copy the window, oldest first
    pub fn copy_window(&self, out: &mut Vec<f32>) {
        out.clear();
        out.extend(self.samples.iter().copied());
    }
}

/// Voice + play state + optional analysis tap
pub struct Transport {
    voice: Voice,
    playing: bool,
    tap: Option<SampleTap>,
}

impl Transport {
    /// Transports start paused
    pub fn new(voice: Voice) -> Self {
        Self {
            voice,
            playing: false,
            tap: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn rewind(&mut self) {
        self.voice.rewind();
    }

    pub fn is_tapped(&self) -> bool {
        self.tap.is_some()
    }

    /// Install the tap; a transport can be tapped only once
    pub fn attach_tap(&mut self, window: usize) -> Result<(), ReactiveError> {
        if self.tap.is_some() {
            return Err(ReactiveError::AttachFailure(
                "playback handle already has an analysis tap".to_string(),
            ));
        }
        self.tap = Some(SampleTap::new(window));
        Ok(())
    }

    /// Fill interleaved output; silence while paused
    ///
    /// The tap sees exactly what is written, it never changes the output.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame_out in out.chunks_mut(channels) {
            let frame = self.next_frame();
            if channels == 1 {
                frame_out[0] = 0.5 * (frame[0] + frame[1]);
                continue;
            }
            for (c, sample) in frame_out.iter_mut().enumerate() {
                *sample = frame[c.min(1)];
            }
        }
    }

    /// Run the transport forward without an output device
    pub fn advance(&mut self, frames: usize) {
        for _ in 0..frames {
            self.next_frame();
        }
    }

    pub fn tap_window(&self, out: &mut Vec<f32>) {
        match &self.tap {
            Some(tap) => tap.copy_window(out),
            None => out.clear(),
        }
    }

    fn next_frame(&mut self) -> [f32; 2] {
        let frame = if self.playing {
            self.voice.next_frame()
        } else {
            [0.0, 0.0]
        };
        if let Some(tap) = self.tap.as_mut() {
            tap.push(frame);
        }
        frame
    }
}

/// Lock a transport, recovering from a panicked audio callback
pub(crate) fn lock(transport: &Mutex<Transport>) -> MutexGuard<'_, Transport> {
    transport.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Analyser reading the transport's tap
pub struct TapAnalyser {
    transport: Arc<Mutex<Transport>>,
    spectrum: SpectrumAnalyser,
    window: Vec<f32>,
    /// Frames to render before each read (0 when a device drives the transport)
    frames_per_read: usize,
}

impl TapAnalyser {
    /// Tap `transport`; fails when it is already tapped
    pub fn attach(
        transport: &Arc<Mutex<Transport>>,
        config: &AnalyserConfig,
        frames_per_read: usize,
    ) -> Result<Self, ReactiveError> {
        lock(transport).attach_tap(config.fft_size)?;

        Ok(Self {
            transport: Arc::clone(transport),
            spectrum: SpectrumAnalyser::new(config.clone()),
            window: Vec::with_capacity(config.fft_size),
            frames_per_read,
        })
    }
}

impl Analyser for TapAnalyser {
    fn bin_count(&self) -> usize {
        self.spectrum.bin_count()
    }

    fn byte_frequency_data(&mut self, bins: &mut [u8]) {
        {
            let mut transport = lock(&self.transport);
            if self.frames_per_read > 0 {
                transport.advance(self.frames_per_read);
            }
            transport.tap_window(&mut self.window);
        }
        self.spectrum.analyse(&self.window, bins);
    }
}
