//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the decode core and the
//! platform-specific media stack. Each trait represents a capability the core
//! requires but that is implemented differently per platform (a desktop
//! symphonia/cpal stack, Android's MediaExtractor/MediaCodec/AudioTrack, ...).
//!
//! ## Traits
//!
//! ### Demuxing & Decoding
//! - [`MediaExtractor`](extractor::MediaExtractor) / [`ExtractorFactory`](extractor::ExtractorFactory) - Open a container and read encoded access units
//! - [`MediaCodec`](codec::MediaCodec) / [`CodecFactory`](codec::CodecFactory) - Slot-based decoder state machine
//!
//! ### Output
//! - [`AudioDevice`](audio::AudioDevice) / [`AudioDeviceFactory`](audio::AudioDeviceFactory) - Blocking streaming PCM sink
//!
//! ### Utilities
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | Android  | TBD                 | 📋 Planned |
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a capability is missing:
//!
//! ```ignore
//! use core_runtime::error::Error;
//!
//! let codecs = builder.codec_factory
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "CodecFactory".to_string(),
//!         message: "No decoder factory provided. \
//!                  Desktop: enable the desktop-shims feature. \
//!                  Mobile: inject the platform-native adapter.".to_string(),
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and include context (locator, MIME
//! type, buffer index) in the message.
//!
//! ## Thread Safety
//!
//! Factories are `Send + Sync` so they can be shared across threads and moved
//! into a decode worker. The objects they create (extractors, codecs,
//! devices) are used from a single worker and carry no thread bounds, since
//! some platform handles cannot leave the thread that created them.

pub mod audio;
pub mod buffer;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod format;
pub mod log;

pub use audio::{AudioDevice, AudioDeviceFactory, AudioDeviceSpec, AudioEncoding, ChannelLayout};
pub use buffer::{BufferFlags, BufferHandle, BufferInfo, CodecBuffer};
pub use codec::{CodecFactory, DequeueOutput, MediaCodec};
pub use error::{BridgeError, Result};
pub use extractor::{ContentLocator, ExtractorFactory, MediaExtractor};
pub use format::MediaFormat;
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
