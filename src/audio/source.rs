//! Audio references and source loading.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use tracing::{debug, info};

use crate::error::ReactiveError;
use crate::reactive::Completer;

/// Prefix selecting the built-in procedural composition
pub const SYNTH_SCHEME: &str = "synth:";

/// Locator for a playable audio source (WAV path or `synth:` reference)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioReference(String);

impl AudioReference {
    /// Wrap a locator; blank strings mean "no audio" and yield `None`
    pub fn new(locator: impl Into<String>) -> Option<Self> {
        let locator = locator.into();
        if locator.trim().is_empty() {
            None
        } else {
            Some(Self(locator))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Composition name for `synth:` references
    pub fn synth_name(&self) -> Option<&str> {
        self.0.strip_prefix(SYNTH_SCHEME)
    }
}

impl fmt::Display for AudioReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoded PCM, interleaved stereo
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    pub samples: Arc<[f32]>,
    pub sample_rate_hz: u32,
}

impl PcmBuffer {
    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }
}

/// Source ready to be turned into a playback handle
#[derive(Debug, Clone)]
pub enum LoadedSource {
    Pcm(PcmBuffer),
    /// Glicol composition code
    #[cfg(feature = "synth")]
    Synth(&'static str),
}

/// Load and decode a reference (blocking)
pub fn load_source(reference: &AudioReference) -> Result<LoadedSource, ReactiveError> {
    if let Some(name) = reference.synth_name() {
        return load_synth(reference, name);
    }

    let pcm = decode_wav(Path::new(reference.as_str()))
        .map_err(|reason| ReactiveError::unavailable(reference.as_str(), reason))?;

    info!(
        "Loaded {}: {} frames @ {}Hz",
        reference,
        pcm.frames(),
        pcm.sample_rate_hz
    );
    Ok(LoadedSource::Pcm(pcm))
}

#[cfg(feature = "synth")]
fn load_synth(reference: &AudioReference, name: &str) -> Result<LoadedSource, ReactiveError> {
    super::synthesis::composition(name)
        .map(LoadedSource::Synth)
        .ok_or_else(|| ReactiveError::unavailable(reference.as_str(), "unknown composition"))
}

#[cfg(not(feature = "synth"))]
fn load_synth(reference: &AudioReference, _name: &str) -> Result<LoadedSource, ReactiveError> {
    Err(ReactiveError::unavailable(
        reference.as_str(),
        "built without synth support",
    ))
}

/// Load on a worker thread and resolve `done` with the result
pub fn spawn_loader(reference: AudioReference, done: Completer<LoadedSource>) {
    let locator = reference.as_str().to_string();

    // Handed over only once the thread exists, so a spawn failure can still resolve it
    let (tx, rx) = crossbeam_channel::bounded::<Completer<LoadedSource>>(1);
    let spawned = thread::Builder::new()
        .name("vibeglow-loader".to_string())
        .spawn(move || {
            if let Ok(done) = rx.recv() {
                done.complete(load_source(&reference));
            }
        });

    match spawned {
        Ok(_) => {
            if let Err(unsent) = tx.send(done) {
                unsent.into_inner().complete(Err(ReactiveError::unavailable(
                    locator,
                    "loader thread exited early",
                )));
            }
        }
        Err(e) => {
            debug!("loader thread failed to spawn: {}", e);
            done.complete(Err(ReactiveError::unavailable(
                locator,
                format!("cannot spawn loader thread: {}", e),
            )));
        }
    }
}

/// Decode a WAV file into interleaved stereo f32
fn decode_wav(path: &Path) -> Result<PcmBuffer, String> {
    let mut reader = hound::WavReader::open(path).map_err(|e| e.to_string())?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| e.to_string())?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(|e| e.to_string())?
        }
    };

    let channels = usize::from(spec.channels.max(1));
    let stereo: Vec<f32> = samples
        .chunks_exact(channels)
        .flat_map(|frame| {
            let left = frame[0];
            let right = if channels > 1 { frame[1] } else { left };
            [left, right]
        })
        .collect();

    if stereo.is_empty() {
        return Err("no audio frames".to_string());
    }

    Ok(PcmBuffer {
        samples: stereo.into(),
        sample_rate_hz: spec.sample_rate,
    })
}
