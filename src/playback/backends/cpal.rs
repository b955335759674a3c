//! Audio output through cpal
//!
//! The host output device is looked up on first use and kept for the
//! lifetime of the engine. Each session opens its own output stream at
//! the buffer's native format; when the device refuses that format the
//! stream falls back to the device default and adapts on the fly.

use crate::audio::{AudioFormat, SampleBuffer};
use crate::playback::engine::{AudioEngine, CompletionNotifier, PlayableStream, SessionId};
use crate::{Result, SpeakwaveError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{debug, error, info, warn};
use once_cell::unsync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Device name selecting the host default output
pub const DEFAULT_DEVICE: &str = "Default";

/// Walks a source buffer at the output device's rate and channel layout
///
/// Rate conversion is nearest-sample; mono sources are copied to every
/// output channel. With matching formats the samples pass through as-is.
struct FrameCursor {
    samples: Arc<[f32]>,
    source_channels: usize,
    output_channels: usize,
    /// Source frames advanced per output frame
    step: f64,
    position: f64,
}

impl FrameCursor {
    fn new(samples: Arc<[f32]>, source: AudioFormat, output_channels: u16, output_rate: u32) -> Self {
        Self {
            samples,
            source_channels: source.channels as usize,
            output_channels: output_channels as usize,
            step: source.sample_rate as f64 / output_rate as f64,
            position: 0.0,
        }
    }

    fn total_frames(&self) -> usize {
        self.samples.len() / self.source_channels
    }

    /// Fill `out` with the next frames, padding with silence past the end
    ///
    /// Returns true once every source frame has been rendered.
    fn fill(&mut self, out: &mut [f32]) -> bool {
        let total = self.total_frames();

        for frame in out.chunks_mut(self.output_channels) {
            let index = self.position as usize;
            if index >= total {
                frame.fill(0.0);
                continue;
            }

            let base = index * self.source_channels;
            for (channel, sample) in frame.iter_mut().enumerate() {
                *sample = self.samples[base + channel.min(self.source_channels - 1)];
            }
            self.position += self.step;
        }

        self.position as usize >= total
    }
}

/// Output engine backed by the cpal default host
pub struct CpalEngine {
    /// `Default` or an output device name
    device_name: String,

    /// Output device, acquired on first resume and reused afterwards
    device: OnceCell<cpal::Device>,
}

impl CpalEngine {
    pub fn new(device_name: &str) -> Self {
        Self {
            device_name: device_name.to_string(),
            device: OnceCell::new(),
        }
    }

    fn acquire_device(&self) -> Result<&cpal::Device> {
        self.device.get_or_try_init(|| {
            let host = cpal::default_host();
            let device = if self.device_name == DEFAULT_DEVICE {
                host.default_output_device()
            } else {
                host.output_devices().ok().and_then(|mut devices| {
                    devices.find(|d| d.name().ok().as_deref() == Some(self.device_name.as_str()))
                })
            }
            .ok_or_else(|| {
                SpeakwaveError::PlaybackUnavailable(format!(
                    "No output device '{}'",
                    self.device_name
                ))
            })?;

            info!(
                "Acquired output device: {}",
                device.name().unwrap_or_else(|_| "Unknown".to_string())
            );
            Ok(device)
        })
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    source: AudioFormat,
    samples: Arc<[f32]>,
    notifier: CompletionNotifier,
    cancelled: Arc<AtomicBool>,
) -> std::result::Result<cpal::Stream, cpal::BuildStreamError> {
    let mut cursor = FrameCursor::new(samples, source, config.channels, config.sample_rate.0);
    let mut notified = false;

    let err_fn = |err| error!("cpal output error: {}", err);

    device.build_output_stream(
        config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            if cancelled.load(Ordering::Acquire) {
                data.fill(0.0);
                return;
            }

            let finished = cursor.fill(data);
            if finished && !notified {
                notified = true;
                if !cancelled.load(Ordering::Acquire) {
                    notifier.notify();
                }
            }
        },
        err_fn,
        None,
    )
}

impl AudioEngine for CpalEngine {
    fn name(&self) -> &str {
        "cpal"
    }

    fn resume(&mut self) -> Result<()> {
        let device = self.acquire_device()?;

        // A vanished or busy device no longer reports a usable config
        device.default_output_config().map_err(|e| {
            SpeakwaveError::PlaybackUnavailable(format!("Output device unavailable: {}", e))
        })?;
        Ok(())
    }

    fn start(
        &mut self,
        buffer: SampleBuffer,
        notifier: CompletionNotifier,
    ) -> Result<Box<dyn PlayableStream>> {
        let source = buffer.format;
        source.validate()?;

        let device = self.acquire_device()?;
        let id = notifier.id();
        let samples: Arc<[f32]> = buffer.samples.into();
        let cancelled = Arc::new(AtomicBool::new(false));

        let native = cpal::StreamConfig {
            channels: source.channels,
            sample_rate: cpal::SampleRate(source.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = match build_stream(
            device,
            &native,
            source,
            Arc::clone(&samples),
            notifier.clone(),
            Arc::clone(&cancelled),
        ) {
            Ok(stream) => stream,
            Err(e) => {
                warn!(
                    "Device refused {} Hz / {} ch ({}), using its default config",
                    source.sample_rate, source.channels, e
                );

                let fallback = device.default_output_config().map_err(|e| {
                    SpeakwaveError::PlaybackUnavailable(format!("No output config: {}", e))
                })?;
                if fallback.sample_format() != cpal::SampleFormat::F32 {
                    return Err(SpeakwaveError::PlaybackUnavailable(format!(
                        "Unsupported output sample format {:?}",
                        fallback.sample_format()
                    )));
                }

                build_stream(
                    device,
                    &fallback.config(),
                    source,
                    samples,
                    notifier,
                    Arc::clone(&cancelled),
                )
                .map_err(|e| {
                    SpeakwaveError::PlaybackUnavailable(format!("Failed to open stream: {}", e))
                })?
            }
        };

        stream.play().map_err(|e| {
            SpeakwaveError::PlaybackUnavailable(format!("Failed to start stream: {}", e))
        })?;
        debug!("cpal stream running for {}", id);

        Ok(Box::new(CpalStream {
            id,
            stream: Some(stream),
            cancelled,
        }))
    }
}

struct CpalStream {
    id: SessionId,
    stream: Option<cpal::Stream>,
    cancelled: Arc<AtomicBool>,
}

impl PlayableStream for CpalStream {
    fn id(&self) -> SessionId {
        self.id
    }

    fn stop(&mut self) {
        self.cancelled.store(true, Ordering::Release);

        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                debug!("Failed to pause stream for {}: {}", self.id, e);
            }
            // Dropping the stream detaches it from the device
            drop(stream);
            debug!("cpal stream released for {}", self.id);
        }
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.stop();
    }
}
