//! Decoder Implementation using Symphonia
//!
//! [`SymphoniaCodec`] wraps a Symphonia decoder in the slot-based
//! [`MediaCodec`] state machine. Decoding happens synchronously when an input
//! slot is queued; results wait in an ordered pending queue until the caller
//! dequeues them through an output slot.
//!
//! ## Output
//!
//! Decoded audio is converted to interleaved native-endian `i16`. A
//! [`DequeueOutput::FormatChanged`] is reported before the first buffer of
//! every new signal spec. Undecodable packets surface as
//! [`DequeueOutput::Unexpected`] with [`ERROR_MALFORMED`] and decoding carries
//! on with the next packet.

use bridge_traits::{
    buffer::{BufferFlags, BufferHandle, BufferInfo, CodecBuffer},
    codec::{CodecFactory, DequeueOutput, MediaCodec, ERROR_MALFORMED, ERROR_UNSUPPORTED},
    error::{BridgeError, Result},
    format::{
        MediaFormat, KEY_BITS_PER_CODED_SAMPLE, KEY_BITS_PER_SAMPLE, KEY_CHANNEL_MASK, KEY_CSD_0,
        KEY_MAX_FRAMES_PER_PACKET, KEY_MAX_INPUT_SIZE, KEY_PCM_ENCODING, MIMETYPE_AUDIO_RAW,
        PCM_ENCODING_16BIT,
    },
};
use std::collections::VecDeque;
use std::time::Duration;
use symphonia::core::audio::{Channels, SampleBuffer, SignalSpec};
use symphonia::core::codecs::{CodecParameters, CodecType, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::Packet;
use tracing::{debug, info, warn};

use crate::mime::codec_for_mime;

/// Number of input and output slots per codec.
const SLOT_COUNT: usize = 4;

/// Default input slot capacity when the format does not carry a size hint.
const DEFAULT_INPUT_CAPACITY: usize = 64 * 1024;

/// Creates [`SymphoniaCodec`]s for every codec the Symphonia registry knows.
#[derive(Debug, Clone, Default)]
pub struct SymphoniaCodecFactory;

impl SymphoniaCodecFactory {
    pub fn new() -> Self {
        Self
    }
}

impl CodecFactory for SymphoniaCodecFactory {
    fn create_decoder_by_type(&self, mime: &str) -> Result<Box<dyn MediaCodec>> {
        let codec_type =
            codec_for_mime(mime).ok_or_else(|| BridgeError::UnsupportedMime(mime.to_string()))?;
        let descriptor = symphonia::default::get_codecs()
            .get_codec(codec_type)
            .ok_or_else(|| BridgeError::UnsupportedMime(mime.to_string()))?;

        debug!(mime, codec = descriptor.short_name, "Created decoder");
        Ok(Box::new(SymphoniaCodec::new(descriptor.short_name, codec_type)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodecState {
    Unconfigured,
    Configured,
    Running,
    Stopped,
    Released,
}

#[derive(Debug)]
enum PendingOutput {
    FormatChanged(MediaFormat),
    Data {
        bytes: Vec<u8>,
        presentation_time_us: u64,
        flags: BufferFlags,
    },
    Error(i32),
}

/// Symphonia-backed [`MediaCodec`].
pub struct SymphoniaCodec {
    name: String,
    codec_type: CodecType,
    state: CodecState,
    decoder: Option<Box<dyn Decoder>>,
    input_slots: Vec<BufferHandle>,
    output_slots: Vec<BufferHandle>,
    free_inputs: VecDeque<usize>,
    free_outputs: VecDeque<usize>,
    pending: VecDeque<PendingOutput>,
    output_format: MediaFormat,
    current_spec: Option<SignalSpec>,
    sample_buffer: Option<SampleBuffer<i16>>,
    input_ended: bool,
}

impl SymphoniaCodec {
    fn new(name: &str, codec_type: CodecType) -> Self {
        Self {
            name: name.to_string(),
            codec_type,
            state: CodecState::Unconfigured,
            decoder: None,
            input_slots: Vec::new(),
            output_slots: Vec::new(),
            free_inputs: VecDeque::new(),
            free_outputs: VecDeque::new(),
            pending: VecDeque::new(),
            output_format: MediaFormat::new(),
            current_spec: None,
            sample_buffer: None,
            input_ended: false,
        }
    }

    fn reset_queues(&mut self) {
        self.free_inputs = (0..self.input_slots.len()).collect();
        self.free_outputs = (0..self.output_slots.len()).collect();
        self.pending.clear();
        self.current_spec = None;
        self.sample_buffer = None;
        self.input_ended = false;
    }

    fn pending_data(&self) -> usize {
        self.pending
            .iter()
            .filter(|entry| matches!(entry, PendingOutput::Data { .. }))
            .count()
    }

    fn decode(&mut self, bytes: &[u8], presentation_time_us: u64) {
        let Some(decoder) = self.decoder.as_mut() else {
            return;
        };
        let packet = Packet::new_from_slice(0, presentation_time_us, 0, bytes);
        let mut reset_required = false;

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                if self.current_spec != Some(spec) {
                    info!(
                        rate = spec.rate,
                        channels = spec.channels.count(),
                        "Decoder output format changed"
                    );
                    self.pending
                        .push_back(PendingOutput::FormatChanged(raw_format(&spec)));
                    self.current_spec = Some(spec);
                    self.sample_buffer = None;
                }
                if decoded.frames() == 0 {
                    return;
                }

                let required = decoded.capacity() * spec.channels.count();
                let stale = self
                    .sample_buffer
                    .as_ref()
                    .map_or(true, |buffer| buffer.capacity() < required);
                if stale {
                    self.sample_buffer = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                }
                let Some(buffer) = self.sample_buffer.as_mut() else {
                    return;
                };
                buffer.copy_interleaved_ref(decoded);

                let bytes: Vec<u8> = buffer
                    .samples()
                    .iter()
                    .flat_map(|sample| sample.to_ne_bytes())
                    .collect();
                self.pending.push_back(PendingOutput::Data {
                    bytes,
                    presentation_time_us,
                    flags: BufferFlags::NONE,
                });
            }
            Err(SymphoniaError::ResetRequired) => {
                debug!("Decoder reset required");
                reset_required = true;
            }
            Err(SymphoniaError::Unsupported(feature)) => {
                warn!("Unsupported bitstream feature: {}", feature);
                self.pending.push_back(PendingOutput::Error(ERROR_UNSUPPORTED));
            }
            Err(e) => {
                warn!("Failed to decode packet: {}", e);
                self.pending.push_back(PendingOutput::Error(ERROR_MALFORMED));
            }
        }

        if reset_required {
            decoder.reset();
        }
    }

    fn require_state(&self, expected: CodecState, operation: &str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(BridgeError::invalid_state(format!(
                "{} called in state {:?}",
                operation, self.state
            )))
        }
    }
}

impl MediaCodec for SymphoniaCodec {
    fn name(&self) -> &str {
        &self.name
    }

    fn configure(&mut self, format: &MediaFormat) -> Result<()> {
        if !matches!(
            self.state,
            CodecState::Unconfigured | CodecState::Stopped | CodecState::Configured
        ) {
            return Err(BridgeError::invalid_state(format!(
                "configure called in state {:?}",
                self.state
            )));
        }

        let params = codec_parameters(self.codec_type, format);
        let decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| BridgeError::failed(format!("Failed to create decoder: {}", e)))?;

        let input_capacity = format
            .integer(KEY_MAX_INPUT_SIZE)
            .and_then(|size| usize::try_from(size).ok())
            .unwrap_or(DEFAULT_INPUT_CAPACITY);
        self.input_slots = (0..SLOT_COUNT)
            .map(|_| CodecBuffer::shared(input_capacity))
            .collect();
        self.output_slots = (0..SLOT_COUNT).map(|_| CodecBuffer::shared(0)).collect();

        self.output_format = MediaFormat::new_audio(
            MIMETYPE_AUDIO_RAW,
            format.sample_rate().unwrap_or(0),
            format.channel_count().unwrap_or(0),
        )
        .with_integer(KEY_PCM_ENCODING, PCM_ENCODING_16BIT);
        self.decoder = Some(decoder);
        self.state = CodecState::Configured;
        debug!(codec = %self.name, "Configured decoder");
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if !matches!(self.state, CodecState::Configured | CodecState::Stopped) {
            return Err(BridgeError::invalid_state(format!(
                "start called in state {:?}",
                self.state
            )));
        }
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.reset();
        }
        self.reset_queues();
        self.state = CodecState::Running;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.require_state(CodecState::Running, "stop")?;
        self.reset_queues();
        self.state = CodecState::Stopped;
        Ok(())
    }

    fn release(&mut self) {
        if self.state == CodecState::Released {
            return;
        }
        self.decoder = None;
        self.input_slots.clear();
        self.output_slots.clear();
        self.reset_queues();
        self.state = CodecState::Released;
        debug!(codec = %self.name, "Released decoder");
    }

    fn dequeue_input_buffer(&mut self, _timeout: Duration) -> Option<usize> {
        // Decoding is synchronous, so there is never anything to wait for.
        if self.state != CodecState::Running
            || self.input_ended
            || self.pending_data() >= SLOT_COUNT
        {
            return None;
        }
        self.free_inputs.pop_front()
    }

    fn input_buffer(&self, index: usize) -> Option<BufferHandle> {
        let handle = self.input_slots.get(index)?;
        handle.lock().clear();
        Some(handle.clone())
    }

    fn input_buffers(&self) -> Vec<BufferHandle> {
        self.input_slots.clone()
    }

    fn queue_input_buffer(
        &mut self,
        index: usize,
        offset: usize,
        size: usize,
        presentation_time_us: u64,
        flags: BufferFlags,
    ) -> Result<()> {
        self.require_state(CodecState::Running, "queue_input_buffer")?;
        if index >= self.input_slots.len() || self.free_inputs.contains(&index) {
            return Err(BridgeError::invalid_state(format!(
                "Input slot {} is not owned by the caller",
                index
            )));
        }
        if self.input_ended {
            return Err(BridgeError::invalid_state(
                "Input queued after end of stream",
            ));
        }

        let bytes = self.input_slots[index]
            .lock()
            .bytes_at(offset, size)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| {
                BridgeError::invalid_state(format!(
                    "Range {}+{} exceeds input slot {}",
                    offset, size, index
                ))
            })?;
        self.free_inputs.push_back(index);

        if !bytes.is_empty() {
            self.decode(&bytes, presentation_time_us);
        }
        if flags.is_end_of_stream() {
            debug!(codec = %self.name, "Input end of stream");
            self.input_ended = true;
            self.pending.push_back(PendingOutput::Data {
                bytes: Vec::new(),
                presentation_time_us,
                flags: BufferFlags::END_OF_STREAM,
            });
        }
        Ok(())
    }

    fn dequeue_output_buffer(&mut self, info: &mut BufferInfo, _timeout: Duration) -> DequeueOutput {
        if self.state != CodecState::Running {
            return DequeueOutput::TryAgainLater;
        }

        match self.pending.pop_front() {
            None => DequeueOutput::TryAgainLater,
            Some(PendingOutput::FormatChanged(format)) => {
                self.output_format = format;
                DequeueOutput::FormatChanged
            }
            Some(PendingOutput::Error(code)) => DequeueOutput::Unexpected(code),
            Some(PendingOutput::Data {
                bytes,
                presentation_time_us,
                flags,
            }) => {
                let Some(index) = self.free_outputs.pop_front() else {
                    self.pending.push_front(PendingOutput::Data {
                        bytes,
                        presentation_time_us,
                        flags,
                    });
                    return DequeueOutput::TryAgainLater;
                };
                self.output_slots[index].lock().write_at(0, &bytes);
                info.set(0, bytes.len(), presentation_time_us, flags);
                DequeueOutput::Buffer(index)
            }
        }
    }

    fn output_buffer(&self, index: usize) -> Option<BufferHandle> {
        self.output_slots.get(index).cloned()
    }

    fn output_buffers(&self) -> Vec<BufferHandle> {
        self.output_slots.clone()
    }

    fn release_output_buffer(&mut self, index: usize, _render: bool) -> Result<()> {
        if index >= self.output_slots.len() || self.free_outputs.contains(&index) {
            return Err(BridgeError::invalid_state(format!(
                "Output slot {} is not owned by the caller",
                index
            )));
        }
        self.free_outputs.push_back(index);
        Ok(())
    }

    fn output_format(&self) -> MediaFormat {
        self.output_format.clone()
    }
}

fn raw_format(spec: &SignalSpec) -> MediaFormat {
    MediaFormat::new_audio(
        MIMETYPE_AUDIO_RAW,
        spec.rate,
        u16::try_from(spec.channels.count()).unwrap_or(u16::MAX),
    )
    .with_integer(KEY_CHANNEL_MASK, i64::from(spec.channels.bits()))
    .with_integer(KEY_PCM_ENCODING, PCM_ENCODING_16BIT)
}

/// Rebuild Symphonia codec parameters from a track format.
fn codec_parameters(codec_type: CodecType, format: &MediaFormat) -> CodecParameters {
    let mut params = CodecParameters::new();
    params.for_codec(codec_type);

    if let Some(rate) = format.sample_rate().filter(|rate| *rate > 0) {
        params.with_sample_rate(rate);
    }

    let channels = format
        .integer(KEY_CHANNEL_MASK)
        .and_then(|mask| u32::try_from(mask).ok())
        .map(Channels::from_bits_truncate)
        .or_else(|| format.channel_count().and_then(channels_for_count));
    if let Some(channels) = channels.filter(|channels| !channels.is_empty()) {
        params.with_channels(channels);
    }

    if let Some(bits) = format
        .integer(KEY_BITS_PER_SAMPLE)
        .and_then(|bits| u32::try_from(bits).ok())
    {
        params.with_bits_per_sample(bits);
    }
    if let Some(bits) = format
        .integer(KEY_BITS_PER_CODED_SAMPLE)
        .and_then(|bits| u32::try_from(bits).ok())
    {
        params.with_bits_per_coded_sample(bits);
    }
    if let Some(frames) = format
        .integer(KEY_MAX_FRAMES_PER_PACKET)
        .and_then(|frames| u64::try_from(frames).ok())
    {
        params.with_max_frames_per_packet(frames);
    }
    if let Some(extra) = format.bytes(KEY_CSD_0) {
        params.with_extra_data(extra.to_vec().into_boxed_slice());
    }

    params
}

/// Speaker positions for the first `count` channels in Symphonia's order.
fn channels_for_count(count: u16) -> Option<Channels> {
    if count == 0 || count > 32 {
        return None;
    }
    let mask = if count == 32 {
        u32::MAX
    } else {
        (1u32 << count) - 1
    };
    Some(Channels::from_bits_truncate(mask))
}
