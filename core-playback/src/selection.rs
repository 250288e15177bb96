//! Decoder buffer access selection.

use crate::config::PumpConfig;
use crate::error::Result;
use crate::pump::{ArrayBuffers, DecodePump, DirectBuffers, MediaDecodePump};
use bridge_traits::codec::CodecFactory;
use bridge_traits::extractor::ExtractorFactory;
use core_runtime::config::CoreConfig;
use std::sync::Arc;
use tracing::debug;

/// How the pump addresses codec buffer slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferAccess {
    /// Cached slot tables, windows positioned by the pump.
    Array,
    /// Per-index slots fetched from the codec, already positioned.
    Direct,
}

impl BufferAccess {
    /// Pick the access mode a codec factory supports.
    pub fn detect(codecs: &dyn CodecFactory) -> Self {
        if codecs.supports_direct_buffers() {
            BufferAccess::Direct
        } else {
            BufferAccess::Array
        }
    }

    /// Access mode for a runtime configuration, honouring `force_array_buffers`.
    pub fn for_config(core: &CoreConfig) -> Self {
        if core.use_direct_buffers() {
            BufferAccess::Direct
        } else {
            BufferAccess::Array
        }
    }
}

/// Build a pump using the given access mode.
pub fn create_decode_pump(
    access: BufferAccess,
    extractors: Arc<dyn ExtractorFactory>,
    codecs: Arc<dyn CodecFactory>,
    config: PumpConfig,
) -> Result<Box<dyn DecodePump>> {
    config.validate()?;
    debug!(?access, "Creating decode pump");

    let pump: Box<dyn DecodePump> = match access {
        BufferAccess::Array => Box::new(MediaDecodePump::<ArrayBuffers>::new(
            extractors, codecs, config,
        )),
        BufferAccess::Direct => Box::new(MediaDecodePump::<DirectBuffers>::new(
            extractors, codecs, config,
        )),
    };
    Ok(pump)
}

/// Build a pump from the bridges and flags in a [`CoreConfig`].
pub fn create_decode_pump_for(core: &CoreConfig, config: PumpConfig) -> Result<Box<dyn DecodePump>> {
    create_decode_pump(
        BufferAccess::for_config(core),
        core.extractor_factory.clone(),
        core.codec_factory.clone(),
        config,
    )
}
