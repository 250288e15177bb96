//! Decoder Abstraction
//!
//! A [`MediaCodec`] is a stateful transform driven through indexed buffer
//! slots. Callers dequeue an input slot, fill it with one access unit and
//! queue it back; decoded data comes out through output slots that must be
//! released after use.
//!
//! ## Lifecycle
//!
//! ```text
//! Unconfigured --configure--> Configured --start--> Running --stop--> Stopped
//!        \___________________________________________________\--release--> Released
//! ```
//!
//! ## Buffer access
//!
//! Two access styles exist. The array style hands out the whole slot table
//! once ([`input_buffers`](MediaCodec::input_buffers) /
//! [`output_buffers`](MediaCodec::output_buffers)); callers cache it, clear
//! input slots themselves and reposition output slots from [`BufferInfo`].
//! The table may be replaced mid-stream, announced by
//! [`DequeueOutput::BuffersChanged`]. The direct style asks for one
//! positioned slot per index ([`input_buffer`](MediaCodec::input_buffer) /
//! [`output_buffer`](MediaCodec::output_buffer)).

use std::time::Duration;

use crate::buffer::{BufferFlags, BufferHandle, BufferInfo};
use crate::error::Result;
use crate::format::MediaFormat;

/// Unexpected dequeue result code reported for undecodable input.
pub const ERROR_MALFORMED: i32 = -1007;
/// Unexpected dequeue result code reported for unsupported bitstream features.
pub const ERROR_UNSUPPORTED: i32 = -1010;
/// Status reported when a slot could not be submitted or retrieved.
pub const ERROR_IO: i32 = -1004;

/// Outcome of [`MediaCodec::dequeue_output_buffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DequeueOutput {
    /// Output slot `index` holds data described by the filled-in [`BufferInfo`].
    Buffer(usize),
    /// Nothing ready within the timeout.
    TryAgainLater,
    /// The output format changed; see [`MediaCodec::output_format`].
    FormatChanged,
    /// The output slot table was replaced (array access only).
    BuffersChanged,
    /// Any other status code.
    Unexpected(i32),
}

pub trait MediaCodec {
    /// Human readable codec name, used in logs.
    fn name(&self) -> &str;

    fn configure(&mut self, format: &MediaFormat) -> Result<()>;

    fn start(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    /// Free all resources. Safe to call in any state, more than once.
    fn release(&mut self);

    /// Wait up to `timeout` for a free input slot.
    fn dequeue_input_buffer(&mut self, timeout: Duration) -> Option<usize>;

    /// Positioned handle to input slot `index` (direct access).
    fn input_buffer(&self, index: usize) -> Option<BufferHandle>;

    /// Entire input slot table (array access).
    fn input_buffers(&self) -> Vec<BufferHandle>;

    /// Submit input slot `index` holding `size` bytes at `offset`.
    fn queue_input_buffer(
        &mut self,
        index: usize,
        offset: usize,
        size: usize,
        presentation_time_us: u64,
        flags: BufferFlags,
    ) -> Result<()>;

    /// Wait up to `timeout` for decoded output. `info` is filled in when a
    /// buffer is returned.
    fn dequeue_output_buffer(&mut self, info: &mut BufferInfo, timeout: Duration) -> DequeueOutput;

    /// Positioned handle to output slot `index` (direct access).
    fn output_buffer(&self, index: usize) -> Option<BufferHandle>;

    /// Entire output slot table (array access).
    fn output_buffers(&self) -> Vec<BufferHandle>;

    /// Hand output slot `index` back to the codec.
    fn release_output_buffer(&mut self, index: usize, render: bool) -> Result<()>;

    /// Current output format.
    fn output_format(&self) -> MediaFormat;
}

/// Creates decoders by MIME type.
pub trait CodecFactory: Send + Sync {
    /// Instantiate an unconfigured decoder for `mime`.
    ///
    /// Fails with [`BridgeError::UnsupportedMime`](crate::error::BridgeError::UnsupportedMime)
    /// when no decoder handles the type.
    fn create_decoder_by_type(&self, mime: &str) -> Result<Box<dyn MediaCodec>>;

    /// Whether decoders from this factory support per-index buffer access.
    fn supports_direct_buffers(&self) -> bool {
        true
    }
}
