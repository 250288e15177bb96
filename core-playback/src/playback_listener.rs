//! Listener that plays decoded audio through a [`SinkPlayer`].

use crate::error::DecodeSoftError;
use crate::listener::Listener;
use crate::player::SinkPlayer;
use bridge_traits::format::MediaFormat;
use tracing::{error, info, warn};

/// Routes pump output into a [`SinkPlayer`].
///
/// The player is (re)configured and started on every output format change.
/// `on_finished` blocks until the queued audio has played, so dropping the
/// listener afterwards (which releases the device) loses nothing.
pub struct PlaybackListener {
    player: SinkPlayer,
    feed_failures: u64,
}

impl PlaybackListener {
    pub fn new(player: SinkPlayer) -> Self {
        Self {
            player,
            feed_failures: 0,
        }
    }

    pub fn player(&self) -> &SinkPlayer {
        &self.player
    }

    /// Batches the player refused.
    pub fn feed_failures(&self) -> u64 {
        self.feed_failures
    }
}

impl Listener for PlaybackListener {
    fn on_frames_available(&mut self, frames: &[i16]) {
        if let Err(e) = self.player.feed(frames) {
            self.feed_failures += 1;
            warn!(samples = frames.len(), "Dropped PCM batch: {}", e);
        }
    }

    fn on_output_format_changed(&mut self, format: &MediaFormat) {
        let Some(sample_rate) = format.sample_rate() else {
            warn!(%format, "Output format without sample rate, keeping current device");
            return;
        };

        let layout = self.player.config().channel_layout;
        if let Some(channels) = format.channel_count() {
            if channels != layout.channel_count() {
                warn!(
                    channels,
                    device_channels = layout.channel_count(),
                    "Decoder channel count differs from output layout"
                );
            }
        }

        if let Err(e) = self
            .player
            .configure(sample_rate)
            .and_then(|()| self.player.start())
        {
            error!(sample_rate, "Failed to open output device: {}", e);
        }
    }

    fn on_error(&mut self, error: &DecodeSoftError) {
        error!(code = error.code, "Decoder error");
    }

    fn on_finished(&mut self) {
        if self.player.is_configured() {
            if let Err(e) = self.player.drain() {
                warn!("Failed to drain output device: {}", e);
            }
        }
        info!(feed_failures = self.feed_failures, "Playback input finished");
    }
}
