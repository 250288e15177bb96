//! Audio Output Abstraction
//!
//! Streaming PCM output devices. A device is created for a fixed sample rate,
//! channel layout and encoding; callers push interleaved samples with a
//! blocking [`write`](AudioDevice::write).

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Channel layout of an output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    pub fn channel_count(self) -> u16 {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    pub fn from_channel_count(count: u16) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

/// Sample encoding accepted by an output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioEncoding {
    /// Signed 16-bit native-endian PCM.
    Pcm16Bit,
}

impl AudioEncoding {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            AudioEncoding::Pcm16Bit => 2,
        }
    }
}

/// Parameters for [`AudioDeviceFactory::create_device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioDeviceSpec {
    pub sample_rate: u32,
    pub layout: ChannelLayout,
    pub encoding: AudioEncoding,
    /// Internal buffer size in bytes.
    pub buffer_size_bytes: usize,
}

/// A streaming output device.
pub trait AudioDevice {
    /// Begin (or resume) playback.
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    /// Discard buffered but not yet played audio.
    fn flush(&mut self) -> Result<()>;

    /// Write interleaved samples, blocking until they fit in the device
    /// buffer. Returns the number of samples accepted, which is 0 once the
    /// device is paused or its stream has failed.
    fn write(&mut self, samples: &[i16]) -> Result<usize>;

    /// Block until every written sample has been handed to the hardware, or
    /// playback stopped.
    fn drain(&mut self) -> Result<()>;

    /// Free the device. Safe to call more than once.
    fn release(&mut self);
}

pub trait AudioDeviceFactory: Send + Sync {
    /// Smallest internal buffer, in bytes, the device supports for this
    /// configuration.
    fn min_buffer_size(
        &self,
        sample_rate: u32,
        layout: ChannelLayout,
        encoding: AudioEncoding,
    ) -> Result<usize>;

    fn create_device(&self, spec: AudioDeviceSpec) -> Result<Box<dyn AudioDevice>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_layout_counts() {
        assert_eq!(ChannelLayout::Stereo.channel_count(), 2);
        assert_eq!(ChannelLayout::from_channel_count(1), Some(ChannelLayout::Mono));
        assert_eq!(ChannelLayout::from_channel_count(6), None);
    }

    #[test]
    fn test_layout_serde_names() {
        let json = serde_json::to_string(&ChannelLayout::Stereo).unwrap();
        assert_eq!(json, "\"stereo\"");
    }
}
