//! Demuxer Implementation using Symphonia
//!
//! Opens local files through Symphonia's format detection and exposes each track with a
//! codec as a [`MediaFormat`]. Tracks whose codec has no MIME mapping keep a
//! synthetic MIME type so decoder lookup reports them as unsupported. Codec parameters that the decoder side needs to
//! rebuild a Symphonia decoder (bit depth, frames per packet, channel mask,
//! codec private data) are carried as extra format keys.

use bridge_traits::{
    buffer::CodecBuffer,
    error::{BridgeError, Result},
    extractor::{ContentLocator, ExtractorFactory, MediaExtractor},
    format::{
        MediaFormat, KEY_BITS_PER_CODED_SAMPLE, KEY_BITS_PER_SAMPLE, KEY_CHANNEL_MASK, KEY_CSD_0,
        KEY_DURATION, KEY_MAX_FRAMES_PER_PACKET,
    },
};
use std::fs::File;
use symphonia::core::codecs::{CodecParameters, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::units::TimeBase;
use tracing::{debug, info, warn};

use crate::mime::{hint_for, mime_for_codec, UNMAPPED_MIME_PREFIX};

/// Opens [`SymphoniaExtractor`]s for local files and `file://` URIs.
#[derive(Debug, Clone, Default)]
pub struct SymphoniaExtractorFactory;

impl SymphoniaExtractorFactory {
    pub fn new() -> Self {
        Self
    }
}

impl ExtractorFactory for SymphoniaExtractorFactory {
    fn open(&self, locator: &ContentLocator) -> Result<Box<dyn MediaExtractor>> {
        Ok(Box::new(SymphoniaExtractor::open(locator)?))
    }
}

struct TrackEntry {
    id: u32,
    format: MediaFormat,
    time_base: Option<TimeBase>,
    sample_rate: Option<u32>,
}

/// Symphonia-backed [`MediaExtractor`].
pub struct SymphoniaExtractor {
    reader: Option<Box<dyn FormatReader>>,
    tracks: Vec<TrackEntry>,
    selected: Option<usize>,
    current: Option<Packet>,
    exhausted: bool,
}

impl SymphoniaExtractor {
    pub fn open(locator: &ContentLocator) -> Result<Self> {
        let path = locator.to_file_path().ok_or_else(|| {
            BridgeError::NotAvailable(format!(
                "Desktop extractor only opens local files, got {}",
                locator
            ))
        })?;

        let file = File::open(&path)?;
        let hint = hint_for(locator);
        let source = Box::new(file) as Box<dyn MediaSource>;
        let stream = MediaSourceStream::new(source, Default::default());

        let detected = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| BridgeError::failed(format!("Failed to open {}: {}", locator, e)))?;

        let reader = detected.format;
        let tracks: Vec<TrackEntry> = reader
            .tracks()
            .iter()
            .filter_map(|track| {
                let format = track_format(&track.codec_params)?;
                Some(TrackEntry {
                    id: track.id,
                    format,
                    time_base: track.codec_params.time_base,
                    sample_rate: track.codec_params.sample_rate,
                })
            })
            .collect();

        info!(tracks = tracks.len(), "Opened media source");

        Ok(Self {
            reader: Some(reader),
            tracks,
            selected: None,
            current: None,
            exhausted: false,
        })
    }

    fn selected_track(&self) -> Option<&TrackEntry> {
        self.selected.and_then(|index| self.tracks.get(index))
    }

    /// Pull packets until one for the selected track is buffered.
    fn ensure_current(&mut self) {
        if self.current.is_some() || self.exhausted {
            return;
        }
        let Some(track_id) = self.selected_track().map(|track| track.id) else {
            return;
        };
        let Some(reader) = self.reader.as_mut() else {
            self.exhausted = true;
            return;
        };

        loop {
            match reader.next_packet() {
                Ok(packet) if packet.track_id() == track_id => {
                    self.current = Some(packet);
                    return;
                }
                Ok(_) => continue,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("Reached end of track");
                }
                Err(SymphoniaError::ResetRequired) => {
                    warn!("Track list changed mid-stream, treating as end of track");
                }
                Err(e) => {
                    warn!("Failed to read packet, ending track: {}", e);
                }
            }
            self.exhausted = true;
            return;
        }
    }

    fn to_micros(&self, ts: u64) -> u64 {
        match self.selected_track() {
            Some(TrackEntry {
                time_base: Some(time_base),
                ..
            }) => time_to_micros(time_base, ts),
            Some(TrackEntry {
                sample_rate: Some(rate),
                ..
            }) if *rate > 0 => ts.saturating_mul(1_000_000) / u64::from(*rate),
            _ => ts,
        }
    }
}

impl MediaExtractor for SymphoniaExtractor {
    fn track_count(&self) -> usize {
        self.tracks.len()
    }

    fn track_format(&self, index: usize) -> Result<MediaFormat> {
        self.tracks
            .get(index)
            .map(|track| track.format.clone())
            .ok_or_else(|| BridgeError::invalid_state(format!("No track at index {}", index)))
    }

    fn select_track(&mut self, index: usize) -> Result<()> {
        if index >= self.tracks.len() {
            return Err(BridgeError::invalid_state(format!(
                "Cannot select track {} of {}",
                index,
                self.tracks.len()
            )));
        }
        debug!(index, "Selected track");
        self.selected = Some(index);
        self.current = None;
        Ok(())
    }

    fn read_sample_data(&mut self, buffer: &mut CodecBuffer, offset: usize) -> Option<usize> {
        self.ensure_current();
        let packet = self.current.as_ref()?;
        buffer.write_at(offset, &packet.data);
        Some(packet.data.len())
    }

    fn sample_time(&mut self) -> Option<u64> {
        self.ensure_current();
        let ts = self.current.as_ref()?.ts();
        Some(self.to_micros(ts))
    }

    fn advance(&mut self) -> bool {
        self.current = None;
        self.ensure_current();
        self.current.is_some()
    }

    fn release(&mut self) {
        if self.reader.take().is_some() {
            debug!("Released media source");
        }
        self.current = None;
        self.exhausted = true;
    }
}

fn time_to_micros(time_base: &TimeBase, ts: u64) -> u64 {
    let time = time_base.calc_time(ts);
    time.seconds
        .saturating_mul(1_000_000)
        .saturating_add((time.frac * 1_000_000.0).round() as u64)
}

/// Describe a Symphonia track. Only tracks without any codec are skipped.
fn track_format(params: &CodecParameters) -> Option<MediaFormat> {
    if params.codec == CODEC_TYPE_NULL {
        return None;
    }
    let mime = mime_for_codec(params.codec);
    if mime.starts_with(UNMAPPED_MIME_PREFIX) {
        debug!(codec = ?params.codec, %mime, "Track codec has no MIME mapping");
    }

    let channels = params.channels.map(|channels| channels.count()).unwrap_or(0);
    let mut format = MediaFormat::new_audio(
        mime.into_owned(),
        params.sample_rate.unwrap_or(0),
        u16::try_from(channels).unwrap_or(0),
    );

    if let Some(channels) = params.channels {
        format.set_integer(KEY_CHANNEL_MASK, i64::from(channels.bits()));
    }
    if let Some(bits) = params.bits_per_sample {
        format.set_integer(KEY_BITS_PER_SAMPLE, i64::from(bits));
    }
    if let Some(bits) = params.bits_per_coded_sample {
        format.set_integer(KEY_BITS_PER_CODED_SAMPLE, i64::from(bits));
    }
    if let Some(frames) = params.max_frames_per_packet {
        format.set_integer(KEY_MAX_FRAMES_PER_PACKET, frames as i64);
    }
    if let Some(extra) = params.extra_data.as_deref() {
        format.set_bytes(KEY_CSD_0, extra.to_vec());
    }
    match (params.n_frames, params.time_base, params.sample_rate) {
        (Some(frames), Some(time_base), _) => {
            format.set_integer(KEY_DURATION, time_to_micros(&time_base, frames) as i64);
        }
        (Some(frames), None, Some(rate)) if rate > 0 => {
            format.set_integer(KEY_DURATION, (frames * 1_000_000 / u64::from(rate)) as i64);
        }
        _ => {}
    }

    Some(format)
}
