//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides implementations of the media bridge traits using
//! desktop-appropriate libraries:
//! - `ExtractorFactory` using `symphonia` format readers (local files)
//! - `CodecFactory` using `symphonia` decoders behind a slot-based state machine
//! - `AudioDeviceFactory` using `cpal` output streams
//!
//! ## Feature Flags
//!
//! - `audio-output`: Enable the cpal output device. Off by default since it
//!   links the platform audio stack (ALSA on Linux).
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{CpalAudioDeviceFactory, SymphoniaCodecFactory, SymphoniaExtractorFactory};
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .extractor_factory(Arc::new(SymphoniaExtractorFactory::new()))
//!     .codec_factory(Arc::new(SymphoniaCodecFactory::new()))
//!     .audio_device_factory(Arc::new(CpalAudioDeviceFactory::new()))
//!     .build()?;
//! ```

mod codec;
mod extractor;
mod mime;

#[cfg(feature = "audio-output")]
mod audio_device;
#[cfg(feature = "audio-output")]
mod ring_buffer;

pub use codec::{SymphoniaCodec, SymphoniaCodecFactory};
pub use extractor::{SymphoniaExtractor, SymphoniaExtractorFactory};
pub use mime::{codec_for_mime, mime_for_codec, UNMAPPED_MIME_PREFIX};

#[cfg(feature = "audio-output")]
pub use audio_device::{CpalAudioDevice, CpalAudioDeviceFactory};
