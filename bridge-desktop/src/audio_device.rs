//! Audio Output using cpal
//!
//! [`CpalAudioDevice`] streams interleaved `i16` PCM to the default output
//! device. Samples pass through a bounded [`PcmRing`]; `write` blocks while
//! the ring is full, which paces the producer to real-time playback.
//! Pausing the stream, or losing the device, halts the ring so a blocked writer
//! returns instead of waiting on a consumer that no longer runs.

use bridge_traits::{
    audio::{AudioDevice, AudioDeviceFactory, AudioDeviceSpec, AudioEncoding, ChannelLayout},
    error::{BridgeError, Result},
};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample, Stream, StreamConfig};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::ring_buffer::PcmRing;

/// Default buffer length used by [`CpalAudioDeviceFactory::min_buffer_size`].
const DEFAULT_BUFFER_MILLIS: u32 = 50;

/// Lower bound on buffer length in frames.
const MIN_BUFFER_FRAMES: usize = 256;

/// How long a blocked writer sleeps before re-checking the ring.
const WRITE_POLL: Duration = Duration::from_millis(5);

/// Extra time allowed on top of the buffered duration when draining.
const DRAIN_SLACK: Duration = Duration::from_millis(500);

/// Creates [`CpalAudioDevice`]s on the default host's default output device.
#[derive(Debug, Clone)]
pub struct CpalAudioDeviceFactory {
    buffer_millis: u32,
}

impl CpalAudioDeviceFactory {
    pub fn new() -> Self {
        Self {
            buffer_millis: DEFAULT_BUFFER_MILLIS,
        }
    }

    /// Override the minimum buffer length reported to callers.
    pub fn with_buffer_millis(mut self, millis: u32) -> Self {
        self.buffer_millis = millis.max(1);
        self
    }
}

impl Default for CpalAudioDeviceFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDeviceFactory for CpalAudioDeviceFactory {
    fn min_buffer_size(
        &self,
        sample_rate: u32,
        layout: ChannelLayout,
        encoding: AudioEncoding,
    ) -> Result<usize> {
        if sample_rate == 0 {
            return Err(BridgeError::failed("Sample rate must be positive"));
        }
        let frames = (sample_rate as usize * self.buffer_millis as usize / 1000).max(MIN_BUFFER_FRAMES);
        Ok(frames * layout.channel_count() as usize * encoding.bytes_per_sample())
    }

    fn create_device(&self, spec: AudioDeviceSpec) -> Result<Box<dyn AudioDevice>> {
        Ok(Box::new(CpalAudioDevice::open(spec)?))
    }
}

/// Streaming output device backed by a cpal stream.
pub struct CpalAudioDevice {
    stream: Option<Stream>,
    ring: PcmRing,
    spec: AudioDeviceSpec,
}

impl CpalAudioDevice {
    pub fn open(spec: AudioDeviceSpec) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| BridgeError::NotAvailable("No output device available".to_string()))?;

        let default_config = device
            .default_output_config()
            .map_err(|e| BridgeError::failed(format!("Failed to get default output config: {}", e)))?;

        let config = StreamConfig {
            channels: spec.layout.channel_count(),
            sample_rate: cpal::SampleRate(spec.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let capacity = spec.buffer_size_bytes / spec.encoding.bytes_per_sample();
        let ring = PcmRing::new(capacity);

        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, ring.clone())?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, ring.clone())?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, ring.clone())?,
            format => {
                return Err(BridgeError::NotAvailable(format!(
                    "Unsupported sample format: {:?}",
                    format
                )))
            }
        };

        // Some backends start streams eagerly.
        if let Err(e) = stream.pause() {
            debug!("Could not pause new stream: {}", e);
        }
        ring.set_halted(true);

        info!(
            sample_rate = spec.sample_rate,
            channels = spec.layout.channel_count(),
            ring_samples = ring.capacity(),
            "Opened audio output"
        );

        Ok(Self {
            stream: Some(stream),
            ring,
            spec,
        })
    }

    pub fn spec(&self) -> AudioDeviceSpec {
        self.spec
    }

    /// Time to play the ring's full capacity, plus slack.
    fn drain_deadline(&self) -> Duration {
        let samples_per_second =
            u64::from(self.spec.sample_rate) * u64::from(self.spec.layout.channel_count());
        let capacity = self.ring.capacity() as u64;
        Duration::from_millis(capacity * 1000 / samples_per_second.max(1)) + DRAIN_SLACK
    }

    fn stream(&self) -> Result<&Stream> {
        self.stream
            .as_ref()
            .ok_or_else(|| BridgeError::invalid_state("Audio device released"))
    }
}

fn build_stream<T: SizedSample + FromSample<i16>>(
    device: &cpal::Device,
    config: &StreamConfig,
    ring: PcmRing,
) -> Result<Stream> {
    device
        .build_output_stream(
            config,
            {
                let ring = ring.clone();
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    ring.read_into(data, |sample| T::from_sample(sample));
                }
            },
            move |err| {
                error!("Audio output error: {}", err);
                if matches!(err, cpal::StreamError::DeviceNotAvailable) {
                    ring.set_halted(true);
                }
            },
            None,
        )
        .map_err(|e| BridgeError::failed(format!("Failed to build output stream: {}", e)))
}

impl AudioDevice for CpalAudioDevice {
    fn play(&mut self) -> Result<()> {
        self.stream()?
            .play()
            .map_err(|e| BridgeError::failed(format!("Failed to start stream: {}", e)))?;
        self.ring.set_halted(false);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.ring.set_halted(true);
        self.stream()?
            .pause()
            .map_err(|e| BridgeError::failed(format!("Failed to pause stream: {}", e)))
    }

    fn flush(&mut self) -> Result<()> {
        self.stream()?;
        self.ring.clear();
        Ok(())
    }

    fn write(&mut self, samples: &[i16]) -> Result<usize> {
        if self.ring.is_closed() {
            return Err(BridgeError::invalid_state("Audio device released"));
        }
        Ok(self.ring.write_blocking(samples, WRITE_POLL))
    }

    fn drain(&mut self) -> Result<()> {
        self.stream()?;
        let pending = self.ring.available();
        if !self.ring.wait_drained(self.drain_deadline(), WRITE_POLL) {
            warn!(
                pending,
                remaining = self.ring.available(),
                "Output stopped before buffered audio finished playing"
            );
        }
        Ok(())
    }

    fn release(&mut self) {
        self.ring.close();
        if self.stream.take().is_some() {
            debug!("Released audio output");
        }
    }
}

impl Drop for CpalAudioDevice {
    fn drop(&mut self) {
        self.release();
    }
}
