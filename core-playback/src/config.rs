//! # Pump & Player Configuration
//!
//! Configuration and state types for the decode pump and the PCM sink.

use crate::error::{PlaybackError, Result};
use bridge_traits::audio::ChannelLayout;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Decode pump configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumpConfig {
    /// Bounded wait, in microseconds, for an input or output slot.
    ///
    /// Also bounds how long a cancellation request can go unnoticed.
    ///
    /// Default: 10 000 µs (10 ms).
    #[serde(default = "default_dequeue_timeout_us")]
    pub dequeue_timeout_us: u64,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            dequeue_timeout_us: default_dequeue_timeout_us(),
        }
    }
}

impl PumpConfig {
    /// Parse a configuration from JSON, filling omitted fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PlaybackError::InvalidConfig(format!("Malformed pump config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// The slot wait as a [`Duration`].
    pub fn dequeue_timeout(&self) -> Duration {
        Duration::from_micros(self.dequeue_timeout_us)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.dequeue_timeout_us == 0 {
            return Err(PlaybackError::InvalidConfig(
                "dequeue_timeout_us must be > 0".to_string(),
            ));
        }

        if self.dequeue_timeout_us > MAX_DEQUEUE_TIMEOUT_US {
            return Err(PlaybackError::InvalidConfig(format!(
                "dequeue_timeout_us must be <= {}",
                MAX_DEQUEUE_TIMEOUT_US
            )));
        }

        Ok(())
    }
}

/// Upper bound on the slot wait (1 s).
const MAX_DEQUEUE_TIMEOUT_US: u64 = 1_000_000;

/// PCM sink configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Channel layout the output device is opened with.
    ///
    /// Default: stereo.
    #[serde(default = "default_channel_layout")]
    pub channel_layout: ChannelLayout,

    /// Device buffer size as a multiple of the platform minimum.
    ///
    /// Default: 1.
    #[serde(default = "default_buffer_multiplier")]
    pub buffer_multiplier: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            channel_layout: default_channel_layout(),
            buffer_multiplier: default_buffer_multiplier(),
        }
    }
}

impl PlayerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_multiplier == 0 {
            return Err(PlaybackError::InvalidConfig(
                "buffer_multiplier must be > 0".to_string(),
            ));
        }

        if self.buffer_multiplier > MAX_BUFFER_MULTIPLIER {
            return Err(PlaybackError::InvalidConfig(format!(
                "buffer_multiplier must be <= {}",
                MAX_BUFFER_MULTIPLIER
            )));
        }

        Ok(())
    }
}

const MAX_BUFFER_MULTIPLIER: u32 = 16;

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_dequeue_timeout_us() -> u64 {
    10_000 // 10 ms
}

fn default_channel_layout() -> ChannelLayout {
    ChannelLayout::Stereo
}

fn default_buffer_multiplier() -> u32 {
    1
}

// ============================================================================
// Session State
// ============================================================================

/// Lifecycle of one decode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No source or decoder held.
    #[default]
    Idle,
    /// Source opened and decoder configured.
    Configured,
    /// The pump loop is running.
    Running,
    /// The loop ended and `on_finished` fired.
    Finished,
    /// The decoder could not be brought up.
    Errored,
}

impl SessionState {
    /// Returns `true` if the session holds a source and decoder.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Configured | Self::Running)
    }

    /// Returns `true` if the session can no longer run without a new `configure`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Errored)
    }
}

/// How a pump loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// The decoder signaled end of stream.
    Completed,
    /// The cancellation token fired before end of stream.
    Cancelled,
}

/// Counters for one decode session. Reset on every `configure`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Access units submitted to the decoder, end-of-stream marker included.
    pub units_queued: u64,
    /// Input polls that returned no slot.
    pub input_slot_misses: u64,
    /// Frame batches handed to the listener.
    pub batches_delivered: u64,
    /// Total samples across all delivered batches.
    pub samples_delivered: u64,
    /// Output format changes seen.
    pub format_changes: u64,
    /// Unexpected decoder status codes.
    pub soft_errors: u64,
    /// Output buffer set replacements.
    pub buffer_set_changes: u64,
}

impl PumpStats {
    /// Frames delivered for a given channel count.
    pub fn frames_delivered(&self, channels: u16) -> u64 {
        if channels == 0 {
            return 0;
        }
        self.samples_delivered / u64::from(channels)
    }

    /// Fraction of input polls that found no free slot.
    pub fn input_backpressure_ratio(&self) -> f64 {
        let polls = self.units_queued + self.input_slot_misses;
        if polls == 0 {
            return 0.0;
        }
        self.input_slot_misses as f64 / polls as f64
    }
}
