//! # Core Configuration Module
//!
//! Provides configuration management for the decode core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the platform bridges the decode pipeline needs. It
//! enforces fail-fast validation so a missing capability is reported when the
//! configuration is built, not in the middle of a decode session.
//!
//! ## Required Dependencies
//!
//! - `ExtractorFactory` - Opens media sources (desktop default: symphonia)
//! - `CodecFactory` - Creates decoders by MIME type (desktop default: symphonia)
//!
//! ## Optional Dependencies
//!
//! - `AudioDeviceFactory` - PCM output (desktop default: cpal). Required while
//!   [`FeatureFlags::enable_playback`] is set.
//!
//! When the `desktop-shims` feature is enabled, the symphonia demuxer and
//! decoder are injected automatically when not provided; `desktop-audio`
//! adds the cpal output device.
//!
//! ## Usage
//!
//! ### Desktop Defaults
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! // With `desktop-audio`
//! let config = CoreConfig::builder().build()?;
//! ```
//!
//! ### Custom Bridges
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .extractor_factory(Arc::new(MyExtractors))
//!     .codec_factory(Arc::new(MyCodecs))
//!     .enable_playback(false)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{AudioDeviceFactory, CodecFactory, ExtractorFactory};
use std::sync::Arc;

/// Core configuration for the decode pipeline.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Opens media sources by locator
    pub extractor_factory: Arc<dyn ExtractorFactory>,

    /// Creates decoders by MIME type
    pub codec_factory: Arc<dyn CodecFactory>,

    /// Creates PCM output devices (required when playback is enabled)
    pub audio_device_factory: Option<Arc<dyn AudioDeviceFactory>>,

    /// Features flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("extractor_factory", &"ExtractorFactory { ... }")
            .field("codec_factory", &"CodecFactory { ... }")
            .field(
                "audio_device_factory",
                &self
                    .audio_device_factory
                    .as_ref()
                    .map(|_| "AudioDeviceFactory { ... }"),
            )
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Route decoded audio to an output device (requires AudioDeviceFactory)
    pub enable_playback: bool,

    /// Use the array buffer strategy even when the codec factory supports
    /// direct buffer access
    pub force_array_buffers: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_playback: true,
            force_array_buffers: false,
        }
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Whether the pump should use direct buffer access.
    pub fn use_direct_buffers(&self) -> bool {
        !self.features.force_array_buffers && self.codec_factory.supports_direct_buffers()
    }

    /// The output device factory, or an actionable error if none is wired.
    pub fn require_audio_device_factory(&self) -> Result<Arc<dyn AudioDeviceFactory>> {
        self.audio_device_factory
            .clone()
            .ok_or_else(audio_device_factory_missing_error)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// Feature flags must be consistent with the available bridges.
    pub fn validate(&self) -> Result<()> {
        if self.features.enable_playback && self.audio_device_factory.is_none() {
            return Err(audio_device_factory_missing_error());
        }

        Ok(())
    }
}

fn audio_device_factory_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "AudioDeviceFactory".to_string(),
        message: "AudioDeviceFactory implementation is required for playback. \
                 Desktop: enable the 'desktop-audio' feature to use the default CpalAudioDeviceFactory, \
                 or disable playback for decode-only use. \
                 Mobile: inject the platform-native audio track adapter."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn extractor_factory_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "ExtractorFactory".to_string(),
        message: "ExtractorFactory implementation is required to open media sources. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default SymphoniaExtractorFactory. \
                 Mobile: inject the platform-native media extractor adapter."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn codec_factory_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "CodecFactory".to_string(),
        message: "CodecFactory implementation is required to decode audio. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default SymphoniaCodecFactory. \
                 Mobile: inject the platform-native media codec adapter."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_extractor_factory() -> Result<Arc<dyn ExtractorFactory>> {
    use bridge_desktop::SymphoniaExtractorFactory;

    let factory: Arc<dyn ExtractorFactory> = Arc::new(SymphoniaExtractorFactory::new());
    Ok(factory)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_extractor_factory() -> Result<Arc<dyn ExtractorFactory>> {
    Err(extractor_factory_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_codec_factory() -> Result<Arc<dyn CodecFactory>> {
    use bridge_desktop::SymphoniaCodecFactory;

    let factory: Arc<dyn CodecFactory> = Arc::new(SymphoniaCodecFactory::new());
    Ok(factory)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_codec_factory() -> Result<Arc<dyn CodecFactory>> {
    Err(codec_factory_missing_error())
}

#[cfg(feature = "desktop-audio")]
fn provide_default_audio_device_factory() -> Option<Arc<dyn AudioDeviceFactory>> {
    use bridge_desktop::CpalAudioDeviceFactory;

    let factory: Arc<dyn AudioDeviceFactory> = Arc::new(CpalAudioDeviceFactory::new());
    Some(factory)
}

#[cfg(not(feature = "desktop-audio"))]
fn provide_default_audio_device_factory() -> Option<Arc<dyn AudioDeviceFactory>> {
    None
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Set bridges and flags incrementally, then call
/// [`build()`](CoreConfigBuilder::build).
#[derive(Default)]
pub struct CoreConfigBuilder {
    extractor_factory: Option<Arc<dyn ExtractorFactory>>,
    codec_factory: Option<Arc<dyn CodecFactory>>,
    audio_device_factory: Option<Arc<dyn AudioDeviceFactory>>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the demuxer factory.
    pub fn extractor_factory(mut self, factory: Arc<dyn ExtractorFactory>) -> Self {
        self.extractor_factory = Some(factory);
        self
    }

    /// Sets the decoder factory.
    pub fn codec_factory(mut self, factory: Arc<dyn CodecFactory>) -> Self {
        self.codec_factory = Some(factory);
        self
    }

    /// Sets the output device factory.
    pub fn audio_device_factory(mut self, factory: Arc<dyn AudioDeviceFactory>) -> Self {
        self.audio_device_factory = Some(factory);
        self
    }

    /// Enables or disables routing decoded audio to an output device.
    pub fn enable_playback(mut self, enabled: bool) -> Self {
        self.features.enable_playback = enabled;
        self
    }

    /// Forces the array buffer strategy.
    pub fn force_array_buffers(mut self, forced: bool) -> Self {
        self.features.force_array_buffers = forced;
        self
    }

    /// Sets all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns an error if:
    /// - A required bridge is missing and no platform default exists
    /// - Feature flags are inconsistent with available bridges
    pub fn build(self) -> Result<CoreConfig> {
        let extractor_factory = match self.extractor_factory {
            Some(factory) => factory,
            None => provide_default_extractor_factory()?,
        };

        let codec_factory = match self.codec_factory {
            Some(factory) => factory,
            None => provide_default_codec_factory()?,
        };

        let audio_device_factory = self
            .audio_device_factory
            .or_else(provide_default_audio_device_factory);

        let config = CoreConfig {
            extractor_factory,
            codec_factory,
            audio_device_factory,
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}
