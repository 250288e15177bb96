//! # PCM Sink Player
//!
//! Feeds intermittent PCM batches into a continuously playing output device.
//!
//! The device is created lazily by [`SinkPlayer::configure`] once the real
//! output sample rate is known, and recreated whenever it changes.
//! [`SinkPlayer::feed`] blocks until the device accepted the whole batch,
//! which is what paces decoding to playback speed.

use crate::config::PlayerConfig;
use crate::error::{PlaybackError, Result};
use crate::pcm::OutputFormat;
use bridge_traits::audio::{AudioDevice, AudioDeviceFactory, AudioDeviceSpec, AudioEncoding};
use std::sync::Arc;
use tracing::{debug, info};

const COMPONENT: &str = "SinkPlayer";

/// Streaming PCM output.
pub struct SinkPlayer {
    factory: Arc<dyn AudioDeviceFactory>,
    config: PlayerConfig,
    device: Option<Box<dyn AudioDevice>>,
    format: Option<OutputFormat>,
    staging: Vec<i16>,
}

impl SinkPlayer {
    pub fn new(factory: Arc<dyn AudioDeviceFactory>, config: PlayerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            factory,
            config,
            device: None,
            format: None,
            staging: Vec::new(),
        })
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// (Re)create the output device for `sample_rate`.
    pub fn configure(&mut self, sample_rate: u32) -> Result<()> {
        self.release();

        let layout = self.config.channel_layout;
        let encoding = AudioEncoding::Pcm16Bit;
        let min_size = self.factory.min_buffer_size(sample_rate, layout, encoding)?;
        let buffer_size_bytes = min_size * self.config.buffer_multiplier as usize;

        let device = self.factory.create_device(AudioDeviceSpec {
            sample_rate,
            layout,
            encoding,
            buffer_size_bytes,
        })?;

        let format = OutputFormat::from((sample_rate, layout));
        info!(%format, buffer_size_bytes, "Output device configured");

        self.device = Some(device);
        self.format = Some(format);
        Ok(())
    }

    /// Begin playback.
    pub fn start(&mut self) -> Result<()> {
        self.device_mut()?.play()?;
        debug!("Playback started");
        Ok(())
    }

    /// Pause and drop buffered audio that has not played yet.
    pub fn stop(&mut self) -> Result<()> {
        let device = self.device_mut()?;
        device.pause()?;
        device.flush()?;
        debug!("Playback stopped");
        Ok(())
    }

    /// Write a batch of interleaved samples, blocking until all are accepted.
    pub fn feed(&mut self, frames: &[i16]) -> Result<()> {
        let device = self
            .device
            .as_mut()
            .ok_or(PlaybackError::NotConfigured(COMPONENT))?;

        if frames.is_empty() {
            return Ok(());
        }

        self.staging.clear();
        self.staging.extend_from_slice(frames);

        let mut written = 0;
        while written < self.staging.len() {
            let accepted = device.write(&self.staging[written..])?;
            if accepted == 0 {
                return Err(PlaybackError::Internal(format!(
                    "Output device accepted 0 of {} samples",
                    self.staging.len() - written
                )));
            }
            written += accepted;
        }
        Ok(())
    }

    /// Block until everything fed so far has played, or the device stopped.
    pub fn drain(&mut self) -> Result<()> {
        self.device_mut()?.drain()?;
        debug!("Output drained");
        Ok(())
    }

    /// Release the device. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.release();
            debug!("Output device released");
        }
        self.format = None;
    }

    /// Format the device currently runs at.
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.format
    }

    pub fn is_configured(&self) -> bool {
        self.device.is_some()
    }

    fn device_mut(&mut self) -> Result<&mut Box<dyn AudioDevice>> {
        self.device
            .as_mut()
            .ok_or(PlaybackError::NotConfigured(COMPONENT))
    }
}

impl Drop for SinkPlayer {
    fn drop(&mut self) {
        self.release();
    }
}
