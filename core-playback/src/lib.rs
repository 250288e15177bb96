//! # Decode & Playback Module
//!
//! Pull-based audio decoding into 16-bit PCM and streaming playback.
//!
//! ## Overview
//!
//! This module handles:
//! - The decode pump that moves access units from a demuxer into a decoder
//!   and delivers PCM batches to a [`Listener`]
//! - Selection between array and direct codec buffer access
//! - A sink player that streams PCM into a platform output device
//! - Running a decode session on a dedicated worker thread
//!
//! Platform capabilities (demuxer, decoder, output device) come from
//! `bridge-traits` implementations, wired through
//! [`core_runtime::config::CoreConfig`].

pub mod config;
pub mod error;
pub mod listener;
pub mod pcm;
pub mod playback_listener;
pub mod player;
pub mod pump;
pub mod selection;
pub mod task;

pub use config::{PlayerConfig, PumpConfig, PumpOutcome, PumpStats, SessionState};
pub use error::{DecodeSoftError, PlaybackError, Result};
pub use listener::{noop_listener, CallbackListener, Listener, NoopListener};
pub use pcm::OutputFormat;
pub use playback_listener::PlaybackListener;
pub use player::SinkPlayer;
pub use pump::{ArrayBuffers, BufferStrategy, DecodePump, DirectBuffers, MediaDecodePump};
pub use selection::{create_decode_pump, create_decode_pump_for, BufferAccess};
pub use task::DecodeTask;
