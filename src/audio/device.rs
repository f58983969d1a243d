//! Live output through the default cpal device.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use tracing::{error, info};

use super::context::SharedContext;
use super::source::{spawn_loader, AudioReference, LoadedSource};
use super::transport::{lock, TapAnalyser, Transport, Voice};
use super::{AudioBackend, Playback};
use crate::error::ReactiveError;
use crate::params::AnalyserConfig;
use crate::reactive::Completer;

/// Output device and its stream configuration
pub struct DeviceContext {
    device: cpal::Device,
    config: cpal::StreamConfig,
}

impl DeviceContext {
    /// Open the default output device
    fn open() -> Result<Self, ReactiveError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| unavailable("No audio output device found"))?;

        let config = device
            .default_output_config()
            .map_err(|e| unavailable(format!("Failed to get audio config: {}", e)))?;

        info!(
            "Audio: {} @ {}Hz",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate().0
        );

        Ok(Self {
            device,
            config: config.into(),
        })
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.config.sample_rate.0
    }
}

fn unavailable(reason: impl ToString) -> ReactiveError {
    ReactiveError::unavailable("device", reason)
}

/// Backend playing through the default output device
#[derive(Clone, Default)]
pub struct DeviceBackend {
    contexts: SharedContext<DeviceContext>,
}

impl DeviceBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioBackend for DeviceBackend {
    type Context = DeviceContext;
    type Source = LoadedSource;
    type Playback = DevicePlayback;
    type Analyser = TapAnalyser;

    fn acquire_context(&mut self) -> Result<Rc<DeviceContext>, ReactiveError> {
        self.contexts.acquire(DeviceContext::open)
    }

    fn load(&mut self, reference: &AudioReference, done: Completer<LoadedSource>) {
        spawn_loader(reference.clone(), done);
    }

    fn open_playback(
        &mut self,
        context: &DeviceContext,
        source: LoadedSource,
    ) -> Result<DevicePlayback, ReactiveError> {
        let voice = Voice::new(source, context.sample_rate_hz())?;
        let transport = Arc::new(Mutex::new(Transport::new(voice)));
        let transport_clone = Arc::clone(&transport);
        let channels = usize::from(context.config.channels);

        // Build audio output stream
        let stream = context
            .device
            .build_output_stream(
                &context.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    lock(&transport_clone).render(data, channels);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| unavailable(format!("Failed to build audio stream: {}", e)))?;

        // Some hosts start streams on build; hold it until play is requested
        if let Err(e) = stream.pause() {
            tracing::debug!("stream pause after build not supported: {}", e);
        }

        Ok(DevicePlayback { transport, stream })
    }

    fn attach_analyser(
        &mut self,
        _context: &DeviceContext,
        playback: &mut DevicePlayback,
        config: &AnalyserConfig,
    ) -> Result<TapAnalyser, ReactiveError> {
        // The device callback drives the transport
        TapAnalyser::attach(&playback.transport, config, 0)
    }
}

/// Device playback handle (keeps the stream alive)
pub struct DevicePlayback {
    transport: Arc<Mutex<Transport>>,
    stream: cpal::Stream,
}

impl Playback for DevicePlayback {
    fn play(&mut self, done: Completer<()>) {
        match self.stream.play() {
            Ok(()) => {
                lock(&self.transport).set_playing(true);
                done.complete(Ok(()));
            }
            Err(e) => done.complete(Err(ReactiveError::PlaybackRejected(format!(
                "Failed to start audio stream: {}",
                e
            )))),
        }
    }

    fn pause(&mut self) {
        lock(&self.transport).set_playing(false);
        if let Err(e) = self.stream.pause() {
            tracing::debug!("stream pause not supported, output muted instead: {}", e);
        }
    }

    fn rewind(&mut self) {
        lock(&self.transport).rewind();
    }
}
