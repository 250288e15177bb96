//! Media Format Descriptions
//!
//! A [`MediaFormat`] is a string-keyed bag of typed values describing either an
//! encoded track (as reported by a [`MediaExtractor`](crate::extractor::MediaExtractor))
//! or the decoded output of a [`MediaCodec`](crate::codec::MediaCodec).
//!
//! Keys are open-ended so that platform bridges can carry codec-private
//! parameters alongside the well-known ones listed as `KEY_*` constants.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// MIME type (string).
pub const KEY_MIME: &str = "mime";
/// Sample rate in Hz (integer).
pub const KEY_SAMPLE_RATE: &str = "sample-rate";
/// Number of interleaved channels (integer).
pub const KEY_CHANNEL_COUNT: &str = "channel-count";
/// Speaker position bit mask (integer).
pub const KEY_CHANNEL_MASK: &str = "channel-mask";
/// Track duration in microseconds (integer).
pub const KEY_DURATION: &str = "durationUs";
/// Largest access unit the extractor will produce, in bytes (integer).
pub const KEY_MAX_INPUT_SIZE: &str = "max-input-size";
/// Bits per decoded sample (integer).
pub const KEY_BITS_PER_SAMPLE: &str = "bits-per-sample";
/// Bits per encoded sample, for PCM-style codecs (integer).
pub const KEY_BITS_PER_CODED_SAMPLE: &str = "bits-per-coded-sample";
/// Upper bound of frames in one access unit (integer).
pub const KEY_MAX_FRAMES_PER_PACKET: &str = "max-frames-per-packet";
/// Codec specific data blob (bytes).
pub const KEY_CSD_0: &str = "csd-0";
/// PCM sample encoding of decoded output (integer, see [`PCM_ENCODING_16BIT`]).
pub const KEY_PCM_ENCODING: &str = "pcm-encoding";

/// MIME type of decoded, interleaved PCM.
pub const MIMETYPE_AUDIO_RAW: &str = "audio/raw";

/// Signed 16-bit native-endian PCM.
pub const PCM_ENCODING_16BIT: i64 = 2;

/// A single format entry value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatValue {
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for FormatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatValue::Int(value) => write!(f, "{}", value),
            FormatValue::Str(value) => write!(f, "{}", value),
            FormatValue::Bytes(value) => write!(f, "<{} bytes>", value.len()),
        }
    }
}

/// Description of an encoded track or decoded stream.
///
/// # Example
///
/// ```
/// use bridge_traits::format::MediaFormat;
///
/// let format = MediaFormat::new_audio("audio/mpeg", 44_100, 2);
/// assert_eq!(format.mime(), Some("audio/mpeg"));
/// assert_eq!(format.sample_rate(), Some(44_100));
/// assert_eq!(format.channel_count(), Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaFormat {
    entries: BTreeMap<String, FormatValue>,
}

impl MediaFormat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an audio format with the three mandatory keys populated.
    pub fn new_audio(mime: impl Into<String>, sample_rate: u32, channel_count: u16) -> Self {
        Self::new()
            .with_string(KEY_MIME, mime)
            .with_integer(KEY_SAMPLE_RATE, i64::from(sample_rate))
            .with_integer(KEY_CHANNEL_COUNT, i64::from(channel_count))
    }

    pub fn with_integer(mut self, key: impl Into<String>, value: i64) -> Self {
        self.set_integer(key, value);
        self
    }

    pub fn with_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_string(key, value);
        self
    }

    pub fn with_bytes(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.set_bytes(key, value);
        self
    }

    pub fn set_integer(&mut self, key: impl Into<String>, value: i64) {
        self.entries.insert(key.into(), FormatValue::Int(value));
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(key.into(), FormatValue::Str(value.into()));
    }

    pub fn set_bytes(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.entries
            .insert(key.into(), FormatValue::Bytes(value.into()));
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.entries.get(key) {
            Some(FormatValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(FormatValue::Str(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn bytes(&self, key: &str) -> Option<&[u8]> {
        match self.entries.get(key) {
            Some(FormatValue::Bytes(value)) => Some(value.as_slice()),
            _ => None,
        }
    }

    pub fn mime(&self) -> Option<&str> {
        self.string(KEY_MIME)
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.integer(KEY_SAMPLE_RATE)
            .and_then(|value| u32::try_from(value).ok())
    }

    pub fn channel_count(&self) -> Option<u16> {
        self.integer(KEY_CHANNEL_COUNT)
            .and_then(|value| u16::try_from(value).ok())
    }

    pub fn duration_us(&self) -> Option<u64> {
        self.integer(KEY_DURATION)
            .and_then(|value| u64::try_from(value).ok())
    }

    /// True when the format describes decoded PCM rather than an encoded stream.
    pub fn is_raw_audio(&self) -> bool {
        self.mime() == Some(MIMETYPE_AUDIO_RAW)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormatValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (position, (key, value)) in self.entries.iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        write!(f, "}}")
    }
}
