//! Codec Buffer Slots
//!
//! Decoders exchange data with their callers through indexed buffer slots.
//! Each slot is a [`CodecBuffer`]: a growable byte region with a
//! position/limit window marking the valid bytes. Slots are shared between
//! the codec and its caller as [`BufferHandle`]s.

use parking_lot::Mutex;
use std::sync::Arc;

/// Shared, lockable handle to a codec buffer slot.
pub type BufferHandle = Arc<Mutex<CodecBuffer>>;

/// Byte buffer with a `[position, limit)` window of valid data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecBuffer {
    data: Vec<u8>,
    position: usize,
    limit: usize,
}

impl CodecBuffer {
    /// Create an empty buffer with `capacity` bytes pre-allocated.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            position: 0,
            limit: 0,
        }
    }

    /// Wrap a handle around a fresh buffer.
    pub fn shared(capacity: usize) -> BufferHandle {
        Arc::new(Mutex::new(Self::with_capacity(capacity)))
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of valid bytes in the window.
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.position)
    }

    /// Reset the window to an empty range at offset zero.
    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = 0;
    }

    /// Reposition the window to `[offset, offset + size)`, clamped to capacity.
    pub fn set_window(&mut self, offset: usize, size: usize) {
        let capacity = self.data.len();
        self.position = offset.min(capacity);
        self.limit = offset.saturating_add(size).min(capacity);
    }

    /// Copy `bytes` in at `offset`, growing the buffer if needed, and make the
    /// written range the window.
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) {
        let end = offset + bytes.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[offset..end].copy_from_slice(bytes);
        self.position = offset;
        self.limit = end;
    }

    /// The bytes inside the window.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.position..self.limit]
    }

    /// Raw bytes in an arbitrary range, ignoring the window.
    pub fn bytes_at(&self, offset: usize, size: usize) -> Option<&[u8]> {
        let end = offset.checked_add(size)?;
        self.data.get(offset..end)
    }
}

/// Flags attached to a queued or dequeued buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BufferFlags(u32);

impl BufferFlags {
    pub const NONE: BufferFlags = BufferFlags(0);
    pub const KEY_FRAME: BufferFlags = BufferFlags(1);
    pub const CODEC_CONFIG: BufferFlags = BufferFlags(1 << 1);
    pub const END_OF_STREAM: BufferFlags = BufferFlags(1 << 2);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: BufferFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_end_of_stream(self) -> bool {
        self.contains(Self::END_OF_STREAM)
    }
}

impl std::ops::BitOr for BufferFlags {
    type Output = BufferFlags;

    fn bitor(self, rhs: BufferFlags) -> BufferFlags {
        BufferFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for BufferFlags {
    fn bitor_assign(&mut self, rhs: BufferFlags) {
        self.0 |= rhs.0;
    }
}

/// Metadata describing a dequeued output buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferInfo {
    /// Start of valid data in the slot.
    pub offset: usize,
    /// Number of valid bytes.
    pub size: usize,
    /// Presentation timestamp in microseconds.
    pub presentation_time_us: u64,
    pub flags: BufferFlags,
}

impl BufferInfo {
    pub fn set(&mut self, offset: usize, size: usize, presentation_time_us: u64, flags: BufferFlags) {
        self.offset = offset;
        self.size = size;
        self.presentation_time_us = presentation_time_us;
        self.flags = flags;
    }
}
