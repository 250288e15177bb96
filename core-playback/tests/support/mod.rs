//! Scripted demuxer/decoder fakes shared by the integration tests.
//!
//! The fake decoder is an identity transform: the bytes of each access unit
//! come back out as PCM. Every bridge call that matters to the tests is
//! written to a shared [`Ledger`].

#![allow(dead_code)]

use bridge_traits::{
    codec::ERROR_MALFORMED, BridgeError, BufferFlags, BufferHandle, BufferInfo, CodecBuffer,
    CodecFactory, ContentLocator, DequeueOutput, ExtractorFactory, MediaCodec, MediaExtractor,
    MediaFormat,
};
use core_playback::{DecodeSoftError, Listener};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

pub const FAKE_MIME: &str = "audio/x-fake";
pub const SAMPLE_RATE: u32 = 44_100;
pub const CHANNELS: u16 = 2;

/// Leading byte that makes the fake decoder reject a unit.
pub const CORRUPT_MARKER: u8 = 0xFF;

type BridgeResult<T> = std::result::Result<T, BridgeError>;

// ============================================================================
// Ledger
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUnit {
    pub size: usize,
    pub presentation_time_us: u64,
    pub end_of_stream: bool,
}

#[derive(Debug, Default)]
pub struct Ledger {
    pub opened: Vec<String>,
    pub extractor_releases: HashMap<String, u32>,
    pub codecs_created: usize,
    pub codec_releases: HashMap<usize, u32>,
    pub queued: Vec<QueuedUnit>,
    pub failed_submissions: u32,
    pub queued_after_end_of_stream: u32,
}

pub type SharedLedger = Arc<Mutex<Ledger>>;

// ============================================================================
// Sources and units
// ============================================================================

/// Interleaved samples of unit `unit`: `unit * 1000 + j`.
pub fn unit_samples(unit: usize, samples_per_unit: usize) -> Vec<i16> {
    (0..samples_per_unit)
        .map(|j| (unit * 1000 + j) as i16)
        .collect()
}

pub fn to_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
}

#[derive(Debug, Clone, Default)]
pub struct FakeSource {
    pub tracks: Vec<MediaFormat>,
    pub units: Vec<(Vec<u8>, u64)>,
}

impl FakeSource {
    /// `units` units of `samples_per_unit` interleaved samples, 10 ms apart.
    pub fn pcm(units: usize, samples_per_unit: usize) -> Self {
        Self {
            tracks: vec![MediaFormat::new_audio(FAKE_MIME, SAMPLE_RATE, CHANNELS)],
            units: (0..units)
                .map(|unit| {
                    (
                        to_bytes(&unit_samples(unit, samples_per_unit)),
                        unit as u64 * 10_000,
                    )
                })
                .collect(),
        }
    }

    pub fn without_tracks() -> Self {
        Self::default()
    }

    pub fn with_mime(mut self, mime: &str) -> Self {
        self.tracks = vec![MediaFormat::new_audio(mime, SAMPLE_RATE, CHANNELS)];
        self
    }

    /// Replace unit `index` with a payload the decoder rejects.
    pub fn corrupt_unit(mut self, index: usize) -> Self {
        if let Some(unit) = self.units.get_mut(index) {
            unit.0 = vec![CORRUPT_MARKER, 0, 0, 0];
        }
        self
    }

    /// All samples the fake decoder produces, in presentation order.
    pub fn expected_samples(&self) -> Vec<i16> {
        self.units
            .iter()
            .filter(|(bytes, _)| bytes.first() != Some(&CORRUPT_MARKER))
            .flat_map(|(bytes, _)| {
                bytes
                    .chunks_exact(2)
                    .map(|pair| i16::from_ne_bytes([pair[0], pair[1]]))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

// ============================================================================
// Extractor
// ============================================================================

pub struct FakeExtractorFactory {
    sources: HashMap<String, FakeSource>,
    ledger: SharedLedger,
}

impl FakeExtractorFactory {
    pub fn new(ledger: SharedLedger) -> Self {
        Self {
            sources: HashMap::new(),
            ledger,
        }
    }

    pub fn with_source(mut self, locator: &str, source: FakeSource) -> Self {
        self.sources.insert(locator.to_string(), source);
        self
    }
}

impl ExtractorFactory for FakeExtractorFactory {
    fn open(&self, locator: &ContentLocator) -> BridgeResult<Box<dyn MediaExtractor>> {
        let source = self
            .sources
            .get(locator.as_str())
            .cloned()
            .ok_or_else(|| BridgeError::NotAvailable(format!("No such source: {}", locator)))?;

        self.ledger.lock().opened.push(locator.to_string());

        Ok(Box::new(FakeExtractor {
            locator: locator.to_string(),
            source,
            cursor: 0,
            selected: false,
            ledger: self.ledger.clone(),
        }))
    }
}

pub struct FakeExtractor {
    locator: String,
    source: FakeSource,
    cursor: usize,
    selected: bool,
    ledger: SharedLedger,
}

impl FakeExtractor {
    fn current(&self) -> Option<&(Vec<u8>, u64)> {
        if !self.selected {
            return None;
        }
        self.source.units.get(self.cursor)
    }
}

impl MediaExtractor for FakeExtractor {
    fn track_count(&self) -> usize {
        self.source.tracks.len()
    }

    fn track_format(&self, index: usize) -> BridgeResult<MediaFormat> {
        self.source
            .tracks
            .get(index)
            .cloned()
            .ok_or_else(|| BridgeError::invalid_state("no track"))
    }

    fn select_track(&mut self, index: usize) -> BridgeResult<()> {
        if index >= self.source.tracks.len() {
            return Err(BridgeError::invalid_state("no track"));
        }
        self.selected = true;
        Ok(())
    }

    fn read_sample_data(&mut self, buffer: &mut CodecBuffer, offset: usize) -> Option<usize> {
        let (bytes, _) = self.current()?;
        let size = bytes.len();
        buffer.write_at(offset, bytes);
        Some(size)
    }

    fn sample_time(&mut self) -> Option<u64> {
        self.current().map(|(_, time)| *time)
    }

    fn advance(&mut self) -> bool {
        self.cursor += 1;
        self.current().is_some()
    }

    fn release(&mut self) {
        *self
            .ledger
            .lock()
            .extractor_releases
            .entry(self.locator.clone())
            .or_insert(0) += 1;
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Knobs for the fake decoder.
#[derive(Debug, Clone, Default)]
pub struct CodecScript {
    /// Withhold every other input slot request.
    pub stall_inputs: bool,
    /// Replace the output slot table after this many output buffers.
    pub buffers_changed_after: Option<usize>,
    /// Refuse to start.
    pub fail_start: bool,
    /// Reject the first end-of-stream submission.
    pub fail_first_end_of_stream: bool,
    /// Write output this many bytes into the slot.
    pub output_offset: usize,
}

const SLOTS: usize = 2;

enum Pending {
    Format,
    Data {
        bytes: Vec<u8>,
        time_us: u64,
        end_of_stream: bool,
    },
    Error(i32),
}

pub struct FakeCodecFactory {
    script: CodecScript,
    direct: bool,
    ledger: SharedLedger,
}

impl FakeCodecFactory {
    pub fn new(ledger: SharedLedger) -> Self {
        Self {
            script: CodecScript::default(),
            direct: true,
            ledger,
        }
    }

    pub fn with_script(mut self, script: CodecScript) -> Self {
        self.script = script;
        self
    }

    pub fn with_direct_buffers(mut self, direct: bool) -> Self {
        self.direct = direct;
        self
    }
}

impl CodecFactory for FakeCodecFactory {
    fn create_decoder_by_type(&self, mime: &str) -> BridgeResult<Box<dyn MediaCodec>> {
        if mime != FAKE_MIME {
            return Err(BridgeError::UnsupportedMime(mime.to_string()));
        }
        let serial = {
            let mut ledger = self.ledger.lock();
            ledger.codecs_created += 1;
            ledger.codecs_created
        };
        Ok(Box::new(FakeCodec::new(
            serial,
            self.script.clone(),
            self.ledger.clone(),
        )))
    }

    fn supports_direct_buffers(&self) -> bool {
        self.direct
    }
}

pub struct FakeCodec {
    serial: usize,
    script: CodecScript,
    ledger: SharedLedger,
    format: MediaFormat,
    running: bool,
    inputs: Vec<BufferHandle>,
    outputs: Vec<BufferHandle>,
    output_infos: Vec<BufferInfo>,
    free_inputs: VecDeque<usize>,
    free_outputs: VecDeque<usize>,
    pending: VecDeque<Pending>,
    format_announced: bool,
    input_polls: usize,
    outputs_emitted: usize,
    buffers_changed: bool,
    failed_end_of_stream: bool,
    saw_end_of_stream: bool,
}

impl FakeCodec {
    fn new(serial: usize, script: CodecScript, ledger: SharedLedger) -> Self {
        Self {
            serial,
            script,
            ledger,
            format: MediaFormat::new(),
            running: false,
            inputs: (0..SLOTS).map(|_| CodecBuffer::shared(64)).collect(),
            outputs: (0..SLOTS).map(|_| CodecBuffer::shared(64)).collect(),
            output_infos: vec![BufferInfo::default(); SLOTS],
            free_inputs: (0..SLOTS).collect(),
            free_outputs: (0..SLOTS).collect(),
            pending: VecDeque::new(),
            format_announced: false,
            input_polls: 0,
            outputs_emitted: 0,
            buffers_changed: false,
            failed_end_of_stream: false,
            saw_end_of_stream: false,
        }
    }

    fn pending_data(&self) -> usize {
        self.pending
            .iter()
            .filter(|p| matches!(p, Pending::Data { .. }))
            .count()
    }
}

impl MediaCodec for FakeCodec {
    fn name(&self) -> &str {
        "fake.identity"
    }

    fn configure(&mut self, format: &MediaFormat) -> BridgeResult<()> {
        self.format = format.clone();
        Ok(())
    }

    fn start(&mut self) -> BridgeResult<()> {
        if self.script.fail_start {
            return Err(BridgeError::failed("scripted start failure"));
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> BridgeResult<()> {
        self.running = false;
        Ok(())
    }

    fn release(&mut self) {
        self.running = false;
        *self
            .ledger
            .lock()
            .codec_releases
            .entry(self.serial)
            .or_insert(0) += 1;
    }

    fn dequeue_input_buffer(&mut self, _timeout: Duration) -> Option<usize> {
        if !self.running {
            return None;
        }
        self.input_polls += 1;
        if self.script.stall_inputs && self.input_polls % 2 == 0 {
            return None;
        }
        if self.pending_data() >= SLOTS {
            return None;
        }
        self.free_inputs.pop_front()
    }

    fn input_buffer(&self, index: usize) -> Option<BufferHandle> {
        let slot = self.inputs.get(index)?;
        slot.lock().clear();
        Some(slot.clone())
    }

    fn input_buffers(&self) -> Vec<BufferHandle> {
        self.inputs.clone()
    }

    fn queue_input_buffer(
        &mut self,
        index: usize,
        offset: usize,
        size: usize,
        presentation_time_us: u64,
        flags: BufferFlags,
    ) -> BridgeResult<()> {
        let end_of_stream = flags.is_end_of_stream();

        if end_of_stream && self.script.fail_first_end_of_stream && !self.failed_end_of_stream {
            self.failed_end_of_stream = true;
            self.free_inputs.push_back(index);
            self.ledger.lock().failed_submissions += 1;
            return Err(BridgeError::failed("scripted submission failure"));
        }

        let bytes = self
            .inputs
            .get(index)
            .and_then(|slot| slot.lock().bytes_at(offset, size).map(<[u8]>::to_vec))
            .ok_or_else(|| BridgeError::invalid_state("bad input slot"))?;
        self.free_inputs.push_back(index);

        {
            let mut ledger = self.ledger.lock();
            if self.saw_end_of_stream {
                ledger.queued_after_end_of_stream += 1;
            }
            ledger.queued.push(QueuedUnit {
                size,
                presentation_time_us,
                end_of_stream,
            });
        }

        if !self.format_announced {
            self.format_announced = true;
            self.pending.push_back(Pending::Format);
        }

        if bytes.first() == Some(&CORRUPT_MARKER) {
            self.pending.push_back(Pending::Error(ERROR_MALFORMED));
        } else if !bytes.is_empty() {
            self.pending.push_back(Pending::Data {
                bytes,
                time_us: presentation_time_us,
                end_of_stream: false,
            });
        }

        if end_of_stream {
            self.saw_end_of_stream = true;
            self.pending.push_back(Pending::Data {
                bytes: Vec::new(),
                time_us: presentation_time_us,
                end_of_stream: true,
            });
        }
        Ok(())
    }

    fn dequeue_output_buffer(&mut self, info: &mut BufferInfo, _timeout: Duration) -> DequeueOutput {
        if !self.running {
            return DequeueOutput::TryAgainLater;
        }

        if let Some(after) = self.script.buffers_changed_after {
            if !self.buffers_changed && self.outputs_emitted == after {
                self.buffers_changed = true;
                self.outputs = (0..SLOTS).map(|_| CodecBuffer::shared(64)).collect();
                return DequeueOutput::BuffersChanged;
            }
        }

        match self.pending.front() {
            None => DequeueOutput::TryAgainLater,
            Some(Pending::Format) => {
                self.pending.pop_front();
                DequeueOutput::FormatChanged
            }
            Some(Pending::Error(code)) => {
                let code = *code;
                self.pending.pop_front();
                DequeueOutput::Unexpected(code)
            }
            Some(Pending::Data { .. }) => {
                let Some(index) = self.free_outputs.pop_front() else {
                    return DequeueOutput::TryAgainLater;
                };
                let Some(Pending::Data {
                    bytes,
                    time_us,
                    end_of_stream,
                }) = self.pending.pop_front()
                else {
                    return DequeueOutput::TryAgainLater;
                };

                let offset = self.script.output_offset;
                {
                    let mut slot = self.outputs[index].lock();
                    // Garbage ahead of the payload; only a correctly
                    // positioned window hides it.
                    slot.write_at(0, &vec![0xAB; offset]);
                    slot.write_at(offset, &bytes);
                    slot.clear();
                }

                let flags = if end_of_stream {
                    BufferFlags::END_OF_STREAM
                } else {
                    BufferFlags::NONE
                };
                info.set(offset, bytes.len(), time_us, flags);
                self.output_infos[index] = *info;
                self.outputs_emitted += 1;
                DequeueOutput::Buffer(index)
            }
        }
    }

    fn output_buffer(&self, index: usize) -> Option<BufferHandle> {
        let slot = self.outputs.get(index)?;
        let info = self.output_infos.get(index)?;
        slot.lock().set_window(info.offset, info.size);
        Some(slot.clone())
    }

    fn output_buffers(&self) -> Vec<BufferHandle> {
        self.outputs.clone()
    }

    fn release_output_buffer(&mut self, index: usize, _render: bool) -> BridgeResult<()> {
        if index >= SLOTS || self.free_outputs.contains(&index) {
            return Err(BridgeError::invalid_state("slot not owned"));
        }
        self.free_outputs.push_back(index);
        Ok(())
    }

    fn output_format(&self) -> MediaFormat {
        MediaFormat::new_audio(
            "audio/raw",
            self.format.sample_rate().unwrap_or(SAMPLE_RATE),
            self.format.channel_count().unwrap_or(CHANNELS),
        )
    }
}

// ============================================================================
// Listener
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Frames(Vec<i16>),
    Format(MediaFormat),
    Error(i32),
    Finished,
}

/// Listener that appends every callback to a shared event list.
#[derive(Clone, Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn Listener> {
        Box::new(self.clone())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn batches(&self) -> Vec<Vec<i16>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Frames(frames) => Some(frames),
                _ => None,
            })
            .collect()
    }

    pub fn samples(&self) -> Vec<i16> {
        self.batches().into_iter().flatten().collect()
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }
}

impl Listener for RecordingListener {
    fn on_frames_available(&mut self, frames: &[i16]) {
        self.events.lock().push(Event::Frames(frames.to_vec()));
    }

    fn on_output_format_changed(&mut self, format: &MediaFormat) {
        self.events.lock().push(Event::Format(format.clone()));
    }

    fn on_error(&mut self, error: &DecodeSoftError) {
        self.events.lock().push(Event::Error(error.code));
    }

    fn on_finished(&mut self) {
        self.events.lock().push(Event::Finished);
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn ledger() -> SharedLedger {
    Arc::new(Mutex::new(Ledger::default()))
}

/// Write a 16-bit PCM WAV file with a deterministic ramp.
pub fn write_wav(sample_rate: u32, channels: u16, frames: usize) -> tempfile::NamedTempFile {
    let data_len = (frames * channels as usize * 2) as u32;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * channels as u32 * 2).to_le_bytes());
    bytes.extend_from_slice(&(channels * 2).to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for frame in 0..frames {
        for channel in 0..channels {
            let value = (frame % 1000) as i16 * 8 + channel as i16;
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }

    let mut file = tempfile::Builder::new()
        .suffix(".wav")
        .tempfile()
        .expect("create temp wav");
    file.write_all(&bytes).expect("write temp wav");
    file.flush().expect("flush temp wav");
    file
}
