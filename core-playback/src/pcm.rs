//! PCM helpers shared by the pump and the sink.

use bridge_traits::audio::ChannelLayout;
use bridge_traits::format::MediaFormat;
use std::fmt;

/// Sample rate and channel count of decoded PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl OutputFormat {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Summarise a decoder output format. `None` without a sample rate.
    pub fn from_media_format(format: &MediaFormat) -> Option<Self> {
        let sample_rate = format.sample_rate()?;
        Some(Self {
            sample_rate,
            channels: format.channel_count().unwrap_or(0),
        })
    }

    /// The matching device layout, if the channel count has one.
    pub fn layout(&self) -> Option<ChannelLayout> {
        ChannelLayout::from_channel_count(self.channels)
    }
}

impl From<(u32, ChannelLayout)> for OutputFormat {
    fn from((sample_rate, layout): (u32, ChannelLayout)) -> Self {
        Self::new(sample_rate, layout.channel_count())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz / {} ch", self.sample_rate, self.channels)
    }
}

/// Reinterpret native-endian bytes as 16-bit samples, replacing the contents
/// of `out`. A trailing odd byte is dropped.
pub fn copy_native_i16(bytes: &[u8], out: &mut Vec<i16>) {
    out.clear();
    out.reserve(bytes.len() / 2);
    out.extend(
        bytes
            .chunks_exact(2)
            .map(|pair| i16::from_ne_bytes([pair[0], pair[1]])),
    );
}
