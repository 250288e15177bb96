//! # Pump Listener
//!
//! Callbacks the decode pump fires on its worker thread.
//!
//! ## Ordering
//!
//! - `on_frames_available` fires 0..N times, always before `on_finished`.
//!   The slice is borrowed from the pump and is only valid for the duration
//!   of the call; copy it to keep it.
//! - `on_output_format_changed` fires 0..N times. Frames delivered after it
//!   are in the new format.
//! - `on_error` fires 0..N times and is never terminal.
//! - `on_finished` fires exactly once per started session, last.
//!
//! Every method has a no-op default, so implementors override only what they
//! consume.

use crate::error::DecodeSoftError;
use bridge_traits::format::MediaFormat;

/// Receiver for decode pump events.
pub trait Listener {
    /// A batch of interleaved 16-bit PCM in the current output format.
    fn on_frames_available(&mut self, _frames: &[i16]) {}

    /// The decoder switched to a new output format.
    fn on_output_format_changed(&mut self, _format: &MediaFormat) {}

    /// The decoder returned an unexpected status. Decoding continues.
    fn on_error(&mut self, _error: &DecodeSoftError) {}

    /// The session is over. No further callbacks follow.
    fn on_finished(&mut self) {}
}

/// Listener that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl Listener for NoopListener {}

/// A fresh no-op listener, used when `configure` is given none.
pub fn noop_listener() -> Box<dyn Listener> {
    Box::new(NoopListener)
}

type FramesFn = Box<dyn FnMut(&[i16])>;
type FormatFn = Box<dyn FnMut(&MediaFormat)>;
type ErrorFn = Box<dyn FnMut(&DecodeSoftError)>;
type FinishedFn = Box<dyn FnMut()>;

/// Listener assembled from closures.
///
/// ```ignore
/// let listener = CallbackListener::new()
///     .with_frames(|frames| total += frames.len())
///     .with_finished(|| println!("done"));
/// ```
#[derive(Default)]
pub struct CallbackListener {
    frames: Option<FramesFn>,
    format: Option<FormatFn>,
    error: Option<ErrorFn>,
    finished: Option<FinishedFn>,
}

impl CallbackListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frames(mut self, f: impl FnMut(&[i16]) + 'static) -> Self {
        self.frames = Some(Box::new(f));
        self
    }

    pub fn with_format_changed(mut self, f: impl FnMut(&MediaFormat) + 'static) -> Self {
        self.format = Some(Box::new(f));
        self
    }

    pub fn with_error(mut self, f: impl FnMut(&DecodeSoftError) + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    pub fn with_finished(mut self, f: impl FnMut() + 'static) -> Self {
        self.finished = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for CallbackListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackListener")
            .field("frames", &self.frames.is_some())
            .field("format", &self.format.is_some())
            .field("error", &self.error.is_some())
            .field("finished", &self.finished.is_some())
            .finish()
    }
}

impl Listener for CallbackListener {
    fn on_frames_available(&mut self, frames: &[i16]) {
        if let Some(f) = self.frames.as_mut() {
            f(frames);
        }
    }

    fn on_output_format_changed(&mut self, format: &MediaFormat) {
        if let Some(f) = self.format.as_mut() {
            f(format);
        }
    }

    fn on_error(&mut self, error: &DecodeSoftError) {
        if let Some(f) = self.error.as_mut() {
            f(error);
        }
    }

    fn on_finished(&mut self) {
        if let Some(f) = self.finished.as_mut() {
            f();
        }
    }
}
