//! # Ring Buffer for PCM Output
//!
//! Bounded FIFO of `i16` samples between the decode worker (producer) and the
//! audio callback thread (consumer).
//!
//! ## Design
//!
//! - **Capacity**: Fixed size determined at creation
//! - **No overwrite**: A full buffer makes the producer wait; the consumer
//!   wakes it after each read
//! - **Underrun**: The consumer pads with silence when starved
//! - **Halt**: While the consumer is paused or dead, producers stop waiting
//!   and `write_blocking` returns early
//!
//! ## Usage
//!
//! ```ignore
//! let ring = PcmRing::new(4096);
//!
//! // Producer: blocks while the ring is full
//! ring.write_blocking(&[100, -100, 200, -200], Duration::from_millis(5));
//!
//! // Consumer: fills the device buffer
//! let mut output = [0i16; 512];
//! let read = ring.read_into(&mut output, |sample| sample);
//! ```

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct PcmRing {
    inner: Arc<PcmRingInner>,
}

struct PcmRingInner {
    samples: Mutex<VecDeque<i16>>,
    capacity: usize,
    /// Signalled after every read that consumed samples.
    space_available: Condvar,
    closed: AtomicBool,
    halted: AtomicBool,
}

impl PcmRing {
    /// Create a ring holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(PcmRingInner {
                samples: Mutex::new(VecDeque::with_capacity(capacity)),
                capacity,
                space_available: Condvar::new(),
                closed: AtomicBool::new(false),
                halted: AtomicBool::new(false),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Number of samples waiting to be played.
    pub fn available(&self) -> usize {
        self.inner.samples.lock().len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn is_halted(&self) -> bool {
        self.inner.halted.load(Ordering::Acquire)
    }

    /// Mark the consumer as stopped (or running again) and wake waiters.
    pub fn set_halted(&self, halted: bool) {
        self.inner.halted.store(halted, Ordering::Release);
        let _queue = self.inner.samples.lock();
        self.inner.space_available.notify_all();
    }

    /// Copy as many samples as currently fit. Returns the count written.
    pub fn write(&self, samples: &[i16]) -> usize {
        if self.is_closed() {
            return 0;
        }
        let mut queue = self.inner.samples.lock();
        Self::push_some(&mut queue, self.inner.capacity, samples)
    }

    /// Write every sample, waiting for the consumer to make room.
    ///
    /// Waits are bounded by `poll` so a ring closed or halted from another
    /// thread is noticed. Returns fewer than `samples.len()` only if the ring
    /// is closed, or halted while full.
    pub fn write_blocking(&self, samples: &[i16], poll: Duration) -> usize {
        let mut written = 0;
        let mut queue = self.inner.samples.lock();

        while written < samples.len() {
            if self.is_closed() {
                break;
            }
            written += Self::push_some(&mut queue, self.inner.capacity, &samples[written..]);
            if written < samples.len() {
                if self.is_halted() {
                    break;
                }
                self.inner.space_available.wait_for(&mut queue, poll);
            }
        }

        written
    }

    /// Wait until the consumer has read every buffered sample.
    ///
    /// Gives up when the ring is closed or halted, or once `deadline` has
    /// elapsed. Returns whether the ring ended up empty.
    pub fn wait_drained(&self, deadline: Duration, poll: Duration) -> bool {
        let start = Instant::now();
        let mut queue = self.inner.samples.lock();

        while !queue.is_empty() {
            if self.is_closed() || self.is_halted() || start.elapsed() >= deadline {
                return false;
            }
            self.inner.space_available.wait_for(&mut queue, poll);
        }
        true
    }

    /// Drain samples into `output`, converting each one, and pad the rest
    /// with converted silence. Returns the number of real samples read.
    pub fn read_into<T>(&self, output: &mut [T], convert: impl Fn(i16) -> T) -> usize {
        let mut queue = self.inner.samples.lock();
        let to_read = queue.len().min(output.len());

        for (slot, sample) in output.iter_mut().zip(queue.drain(..to_read)) {
            *slot = convert(sample);
        }
        drop(queue);

        for slot in &mut output[to_read..] {
            *slot = convert(0);
        }

        if to_read > 0 {
            self.inner.space_available.notify_all();
        }
        to_read
    }

    /// Discard buffered samples.
    pub fn clear(&self) {
        self.inner.samples.lock().clear();
        self.inner.space_available.notify_all();
    }

    /// Stop accepting samples and wake any waiting producer.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.clear();
    }

    fn push_some(queue: &mut VecDeque<i16>, capacity: usize, samples: &[i16]) -> usize {
        let room = capacity.saturating_sub(queue.len());
        let count = room.min(samples.len());
        queue.extend(&samples[..count]);
        count
    }
}
