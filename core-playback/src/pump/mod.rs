//! # Decode Pump
//!
//! Moves encoded access units from a demuxer into a decoder and hands the
//! decoded PCM to a [`Listener`].
//!
//! ## Overview
//!
//! The pump owns one demuxer ([`MediaExtractor`]) and one decoder
//! ([`MediaCodec`]) per session. `start` runs a blocking loop on the calling
//! thread. Each iteration:
//!
//! 1. Unless end of input was already submitted, waits briefly for a free
//!    input slot, reads the next access unit into it and queues it. When the
//!    demuxer is exhausted an empty slot tagged end-of-stream is queued
//!    instead.
//! 2. Waits briefly for decoder output and dispatches it: PCM batches go to
//!    `on_frames_available`, format changes to `on_output_format_changed`,
//!    unknown status codes to `on_error`.
//!
//! The loop ends when the decoder emits an end-of-stream output buffer or
//! the cancellation token fires. The decoder is then stopped and released
//! and `on_finished` fires once.
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{create_decode_pump, BufferAccess, CallbackListener, PumpConfig};
//!
//! let mut pump = create_decode_pump(BufferAccess::Direct, extractors, codecs, PumpConfig::default())?;
//! pump.configure(&locator, Some(Box::new(CallbackListener::new().with_frames(|pcm| sink(pcm)))))?;
//! pump.start()?;
//! pump.reset();
//! ```

mod strategy;

pub use strategy::{ArrayBuffers, BufferStrategy, DirectBuffers};

use crate::config::{PumpConfig, PumpOutcome, PumpStats, SessionState};
use crate::error::{DecodeSoftError, PlaybackError, Result};
use crate::listener::{noop_listener, Listener};
use crate::pcm::copy_native_i16;
use bridge_traits::buffer::{BufferFlags, BufferInfo};
use bridge_traits::codec::{CodecFactory, DequeueOutput, MediaCodec, ERROR_IO};
use bridge_traits::error::BridgeError;
use bridge_traits::extractor::{ContentLocator, ExtractorFactory, MediaExtractor};
use core_runtime::logging::strip_path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Track decoded by the pump. Only the first track is used.
const TRACK_INDEX: usize = 0;

/// A decode session driver.
pub trait DecodePump {
    /// Open `locator` and prepare a decoder for its first track.
    ///
    /// Any previous session is released first. Without a listener, events
    /// are discarded.
    fn configure(
        &mut self,
        locator: &ContentLocator,
        listener: Option<Box<dyn Listener>>,
    ) -> Result<()>;

    /// Run the decode loop to completion on the calling thread.
    fn start(&mut self) -> Result<PumpOutcome> {
        self.start_cancellable(&CancellationToken::new())
    }

    /// Run the decode loop, leaving early once `cancel` fires.
    fn start_cancellable(&mut self, cancel: &CancellationToken) -> Result<PumpOutcome>;

    /// Release the demuxer, decoder and listener. Safe to call at any time
    /// the loop is not running, any number of times.
    fn reset(&mut self);

    fn state(&self) -> SessionState;

    fn stats(&self) -> &PumpStats;

    /// Name of the buffer strategy in use.
    fn strategy_name(&self) -> &'static str;
}

/// [`DecodePump`] over the platform bridges, parameterised by how it
/// reaches codec buffer slots.
pub struct MediaDecodePump<S: BufferStrategy> {
    extractors: Arc<dyn ExtractorFactory>,
    codecs: Arc<dyn CodecFactory>,
    config: PumpConfig,
    strategy: S,
    extractor: Option<Box<dyn MediaExtractor>>,
    codec: Option<Box<dyn MediaCodec>>,
    listener: Box<dyn Listener>,
    state: SessionState,
    stats: PumpStats,
    scratch: Vec<i16>,
}

impl<S: BufferStrategy> MediaDecodePump<S> {
    pub fn new(
        extractors: Arc<dyn ExtractorFactory>,
        codecs: Arc<dyn CodecFactory>,
        config: PumpConfig,
    ) -> Self {
        Self {
            extractors,
            codecs,
            config,
            strategy: S::default(),
            extractor: None,
            codec: None,
            listener: noop_listener(),
            state: SessionState::Idle,
            stats: PumpStats::default(),
            scratch: Vec::new(),
        }
    }

    pub fn config(&self) -> &PumpConfig {
        &self.config
    }

    /// Create and configure a decoder for the selected track's format.
    fn open_codec(&self, extractor: &dyn MediaExtractor) -> Result<Box<dyn MediaCodec>> {
        let format = extractor.track_format(TRACK_INDEX)?;
        debug!(%format, "Input format");

        let mime = format
            .mime()
            .ok_or_else(|| PlaybackError::UnsupportedFormat {
                mime: "<missing>".to_string(),
            })?
            .to_string();

        let mut codec = match self.codecs.create_decoder_by_type(&mime) {
            Ok(codec) => codec,
            Err(BridgeError::UnsupportedMime(_)) => {
                return Err(PlaybackError::UnsupportedFormat { mime });
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = codec.configure(&format) {
            codec.release();
            return Err(e.into());
        }

        debug!(codec = codec.name(), format = %codec.output_format(), "Initial output format");
        Ok(codec)
    }

    /// Start the codec, select the track and prime the strategy.
    fn bring_up(&mut self) -> std::result::Result<(), BridgeError> {
        let (Some(extractor), Some(codec)) = (self.extractor.as_mut(), self.codec.as_mut()) else {
            return Err(BridgeError::invalid_state("Session not configured"));
        };
        codec.start()?;
        extractor.select_track(TRACK_INDEX)?;
        self.strategy.prime(&**codec);
        Ok(())
    }

    fn finish(&mut self) {
        if let Some(mut codec) = self.codec.take() {
            if let Err(e) = codec.stop() {
                warn!("Failed to stop decoder: {}", e);
            }
            codec.release();
        }
        self.strategy.release();
        self.state = SessionState::Finished;
        self.listener.on_finished();
    }
}

impl<S: BufferStrategy> DecodePump for MediaDecodePump<S> {
    #[instrument(skip(self, locator, listener), fields(source = %strip_path(locator.as_str()), strategy = S::NAME))]
    fn configure(
        &mut self,
        locator: &ContentLocator,
        listener: Option<Box<dyn Listener>>,
    ) -> Result<()> {
        self.reset();
        self.stats = PumpStats::default();

        let mut extractor = self.extractors.open(locator)?;

        if extractor.track_count() == 0 {
            extractor.release();
            warn!("Source has no tracks");
            return Err(PlaybackError::NoTrack {
                locator: locator.to_string(),
            });
        }

        let codec = match self.open_codec(&*extractor) {
            Ok(codec) => codec,
            Err(e) => {
                extractor.release();
                return Err(e);
            }
        };

        info!(codec = codec.name(), "Decode session configured");

        self.extractor = Some(extractor);
        self.codec = Some(codec);
        self.listener = listener.unwrap_or_else(noop_listener);
        self.state = SessionState::Configured;
        Ok(())
    }

    #[instrument(skip(self, cancel), fields(strategy = S::NAME))]
    fn start_cancellable(&mut self, cancel: &CancellationToken) -> Result<PumpOutcome> {
        if self.extractor.is_none() || self.codec.is_none() {
            return Err(PlaybackError::NotConfigured("DecodePump"));
        }

        if let Err(e) = self.bring_up() {
            error!("Failed to start decoder: {}", e);
            self.state = SessionState::Errored;
            return Err(e.into());
        }

        self.state = SessionState::Running;
        info!("Decoding started");

        let timeout = self.config.dequeue_timeout();
        let Self {
            extractor,
            codec,
            strategy,
            listener,
            stats,
            scratch,
            ..
        } = self;
        let (Some(extractor), Some(codec)) = (extractor.as_mut(), codec.as_mut()) else {
            return Err(PlaybackError::NotConfigured("DecodePump"));
        };

        let mut info = BufferInfo::default();
        let mut channels = codec.output_format().channel_count().unwrap_or(0);
        let mut saw_input_eos = false;
        let mut saw_output_eos = false;
        let mut outcome = PumpOutcome::Completed;

        while !saw_output_eos {
            if cancel.is_cancelled() {
                info!("Decoding cancelled");
                outcome = PumpOutcome::Cancelled;
                break;
            }

            if !saw_input_eos {
                match codec.dequeue_input_buffer(timeout) {
                    Some(index) => match strategy.input_slot(&**codec, index) {
                        Some(slot) => {
                            let read = extractor.read_sample_data(&mut slot.lock(), 0);
                            let (size, time_us) = match read {
                                Some(size) => {
                                    let time = extractor.sample_time();
                                    debug_assert!(
                                        time.is_some(),
                                        "demuxer returned data without a timestamp"
                                    );
                                    let time_us = time.unwrap_or_else(|| {
                                        error!(size, "Access unit has no timestamp, using 0");
                                        0
                                    });
                                    (size, time_us)
                                }
                                None => {
                                    debug!("Demuxer exhausted, submitting end of stream");
                                    saw_input_eos = true;
                                    (0, 0)
                                }
                            };

                            let flags = if saw_input_eos {
                                BufferFlags::END_OF_STREAM
                            } else {
                                BufferFlags::NONE
                            };

                            match codec.queue_input_buffer(index, 0, size, time_us, flags) {
                                Ok(()) => {
                                    stats.units_queued += 1;
                                }
                                Err(e) if saw_input_eos => {
                                    warn!("Failed to submit end of stream, retrying: {}", e);
                                    saw_input_eos = false;
                                }
                                Err(e) => {
                                    warn!(index, time_us, "Failed to submit access unit: {}", e);
                                    stats.soft_errors += 1;
                                    listener.on_error(&DecodeSoftError::new(ERROR_IO));
                                }
                            }

                            if !saw_input_eos {
                                extractor.advance();
                            }
                        }
                        None => {
                            error!(index, "Decoder granted an input slot it cannot provide");
                            stats.soft_errors += 1;
                            listener.on_error(&DecodeSoftError::new(ERROR_IO));
                        }
                    },
                    None => {
                        stats.input_slot_misses += 1;
                    }
                }
            }

            match codec.dequeue_output_buffer(&mut info, timeout) {
                DequeueOutput::Buffer(index) => {
                    match strategy.output_slot(&**codec, index, &info) {
                        Some(slot) => copy_native_i16(slot.lock().as_slice(), scratch),
                        None => {
                            error!(index, "Decoder returned an output slot it cannot provide");
                            scratch.clear();
                        }
                    }

                    stats.batches_delivered += 1;
                    stats.samples_delivered += scratch.len() as u64;
                    listener.on_frames_available(scratch.as_slice());

                    if let Err(e) = codec.release_output_buffer(index, false) {
                        warn!(index, "Failed to release output slot: {}", e);
                    }

                    if info.flags.is_end_of_stream() {
                        debug!("Decoder signaled end of stream");
                        saw_output_eos = true;
                    }
                }
                DequeueOutput::FormatChanged => {
                    let format = codec.output_format();
                    info!(%format, "Output format changed");
                    if !format.is_raw_audio() {
                        warn!(mime = ?format.mime(), "Decoder output is not tagged as raw PCM");
                    }
                    channels = format.channel_count().unwrap_or(channels);
                    stats.format_changes += 1;
                    listener.on_output_format_changed(&format);
                }
                DequeueOutput::BuffersChanged => {
                    strategy.refresh_outputs(&**codec);
                    stats.buffer_set_changes += 1;
                }
                DequeueOutput::TryAgainLater => {}
                DequeueOutput::Unexpected(code) => {
                    warn!(code, "Unexpected decoder status");
                    stats.soft_errors += 1;
                    listener.on_error(&DecodeSoftError::new(code));
                }
            }
        }

        self.finish();

        info!(
            batches = self.stats.batches_delivered,
            samples = self.stats.samples_delivered,
            frames = self.stats.frames_delivered(channels),
            input_backpressure = self.stats.input_backpressure_ratio(),
            soft_errors = self.stats.soft_errors,
            ?outcome,
            "Decoding finished"
        );

        Ok(outcome)
    }

    fn reset(&mut self) {
        if let Some(mut codec) = self.codec.take() {
            codec.release();
        }
        if let Some(mut extractor) = self.extractor.take() {
            extractor.release();
        }
        self.strategy.release();
        self.listener = noop_listener();
        if self.state != SessionState::Idle {
            debug!("Decode session reset");
        }
        self.state = SessionState::Idle;
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn stats(&self) -> &PumpStats {
        &self.stats
    }

    fn strategy_name(&self) -> &'static str {
        S::NAME
    }
}

impl<S: BufferStrategy> Drop for MediaDecodePump<S> {
    fn drop(&mut self) {
        self.reset();
    }
}
