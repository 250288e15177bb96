//! Buffer access strategies.
//!
//! Decoders hand out slot indices; a strategy turns an index into a usable
//! [`BufferHandle`]. Array access caches the codec's slot tables once and
//! positions buffers itself. Direct access asks the codec for each slot and
//! receives it already positioned. Both deliver the same bytes.

use bridge_traits::buffer::{BufferHandle, BufferInfo};
use bridge_traits::codec::MediaCodec;
use tracing::debug;

/// How the pump reaches codec buffer slots.
pub trait BufferStrategy: Default {
    /// Short name for logs.
    const NAME: &'static str;

    /// Called once after the codec starts.
    fn prime(&mut self, codec: &dyn MediaCodec);

    /// Input slot `index`, emptied and ready to be written at offset zero.
    fn input_slot(&self, codec: &dyn MediaCodec, index: usize) -> Option<BufferHandle>;

    /// Output slot `index` with its window covering the bytes in `info`.
    fn output_slot(
        &self,
        codec: &dyn MediaCodec,
        index: usize,
        info: &BufferInfo,
    ) -> Option<BufferHandle>;

    /// The codec replaced its output slot table.
    fn refresh_outputs(&mut self, codec: &dyn MediaCodec);

    /// Drop any cached slots.
    fn release(&mut self);
}

/// Index-addressed cached slot tables.
#[derive(Default)]
pub struct ArrayBuffers {
    inputs: Vec<BufferHandle>,
    outputs: Vec<BufferHandle>,
}

impl BufferStrategy for ArrayBuffers {
    const NAME: &'static str = "array";

    fn prime(&mut self, codec: &dyn MediaCodec) {
        self.inputs = codec.input_buffers();
        self.outputs = codec.output_buffers();
        debug!(
            inputs = self.inputs.len(),
            outputs = self.outputs.len(),
            "Cached codec buffer tables"
        );
    }

    fn input_slot(&self, _codec: &dyn MediaCodec, index: usize) -> Option<BufferHandle> {
        let slot = self.inputs.get(index)?;
        slot.lock().clear();
        Some(slot.clone())
    }

    fn output_slot(
        &self,
        _codec: &dyn MediaCodec,
        index: usize,
        info: &BufferInfo,
    ) -> Option<BufferHandle> {
        let slot = self.outputs.get(index)?;
        slot.lock().set_window(info.offset, info.size);
        Some(slot.clone())
    }

    fn refresh_outputs(&mut self, codec: &dyn MediaCodec) {
        self.outputs = codec.output_buffers();
        debug!(outputs = self.outputs.len(), "Refreshed output buffer table");
    }

    fn release(&mut self) {
        self.inputs.clear();
        self.outputs.clear();
    }
}

/// Per-index slot access through the codec.
#[derive(Default)]
pub struct DirectBuffers;

impl BufferStrategy for DirectBuffers {
    const NAME: &'static str = "direct";

    fn prime(&mut self, _codec: &dyn MediaCodec) {}

    fn input_slot(&self, codec: &dyn MediaCodec, index: usize) -> Option<BufferHandle> {
        codec.input_buffer(index)
    }

    fn output_slot(
        &self,
        codec: &dyn MediaCodec,
        index: usize,
        _info: &BufferInfo,
    ) -> Option<BufferHandle> {
        codec.output_buffer(index)
    }

    fn refresh_outputs(&mut self, _codec: &dyn MediaCodec) {}

    fn release(&mut self) {}
}
