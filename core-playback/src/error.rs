//! # Playback Error Types
//!
//! Error types for the decode pump and the PCM sink.
//!
//! Fatal failures surface as [`PlaybackError`] from `configure`/`start`.
//! Decoder status codes seen while the pump is running are not fatal: they
//! travel to the listener as [`DecodeSoftError`] values and the loop keeps
//! going.

use bridge_traits::error::BridgeError;
use std::fmt;
use thiserror::Error;

/// Errors that can occur during decode and playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The source opened but exposes no tracks.
    #[error("No track found in {locator}")]
    NoTrack { locator: String },

    /// No MIME type on the track, or no decoder for it.
    #[error("Unsupported audio format: {mime}")]
    UnsupportedFormat { mime: String },

    /// An operation was called before `configure`.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// Configuration values failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Platform Errors
    // ========================================================================
    /// A platform capability (demuxer, decoder, output device) failed.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if the error was raised while setting up a session.
    ///
    /// These are never retried; the caller reports them and gives up on the
    /// locator.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::NoTrack { .. }
                | PlaybackError::UnsupportedFormat { .. }
                | PlaybackError::InvalidConfig(_)
        )
    }
}

/// Non-fatal decoder status reported through `Listener::on_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeSoftError {
    /// Raw status code returned by the decoder.
    pub code: i32,
}

impl DecodeSoftError {
    pub fn new(code: i32) -> Self {
        Self { code }
    }
}

impl fmt::Display for DecodeSoftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decoder reported status {}", self.code)
    }
}

impl std::error::Error for DecodeSoftError {}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
