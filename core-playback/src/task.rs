//! # Decode Task
//!
//! Runs one decode session on a dedicated worker thread.
//!
//! The pump and its listener are built on the worker, so output devices that
//! are not `Send` never cross threads. The session is configured, run and
//! reset entirely on the worker; dropping the task cancels the loop and joins
//! the worker before returning.

use crate::config::PumpOutcome;
use crate::error::{PlaybackError, Result};
use crate::listener::Listener;
use crate::pump::DecodePump;
use bridge_traits::extractor::ContentLocator;
use core_runtime::logging::strip_path;
use std::thread::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

/// Builds the pump and listener for a task, on the worker thread.
pub type SessionBuilder =
    Box<dyn FnOnce() -> Result<(Box<dyn DecodePump>, Box<dyn Listener>)> + Send + 'static>;

/// Handle to a running decode session.
pub struct DecodeTask {
    id: Uuid,
    cancel: CancellationToken,
    handle: Option<JoinHandle<Result<PumpOutcome>>>,
}

impl DecodeTask {
    /// Spawn a worker that decodes `locator` to completion.
    ///
    /// Configure failures (no track, unsupported format) are returned from
    /// [`join`](Self::join).
    pub fn spawn<F>(locator: ContentLocator, build: F) -> Result<Self>
    where
        F: FnOnce() -> Result<(Box<dyn DecodePump>, Box<dyn Listener>)> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let name = format!("decode-{}", &id.simple().to_string()[..8]);

        let handle = std::thread::Builder::new()
            .name(name)
            .spawn(move || run_session(id, locator, Box::new(build), token))?;

        debug!(task = %id, "Decode task spawned");

        Ok(Self {
            id,
            cancel,
            handle: Some(handle),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Ask the loop to stop at its next iteration.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token observed by the worker; cancelling it is the same as [`cancel`](Self::cancel).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }

    /// Wait for the worker and return how the session ended.
    pub fn join(mut self) -> Result<PumpOutcome> {
        self.join_inner()
    }

    fn join_inner(&mut self) -> Result<PumpOutcome> {
        let Some(handle) = self.handle.take() else {
            return Err(PlaybackError::Internal("Decode task already joined".to_string()));
        };
        handle
            .join()
            .map_err(|_| PlaybackError::Internal("Decode worker panicked".to_string()))?
    }
}

impl Drop for DecodeTask {
    fn drop(&mut self) {
        if self.handle.is_none() {
            return;
        }
        self.cancel.cancel();
        if let Err(e) = self.join_inner() {
            warn!(task = %self.id, "Decode task ended with error: {}", e);
        }
    }
}

fn run_session(
    id: Uuid,
    locator: ContentLocator,
    build: SessionBuilder,
    cancel: CancellationToken,
) -> Result<PumpOutcome> {
    let span = info_span!("decode_task", task = %id, source = %strip_path(locator.as_str()));
    let _guard = span.enter();

    let (mut pump, listener) = build()?;

    if let Err(e) = pump.configure(&locator, Some(listener)) {
        warn!("Failed to configure decode session: {}", e);
        return Err(e);
    }

    let outcome = pump.start_cancellable(&cancel);
    pump.reset();

    if let Ok(outcome) = &outcome {
        info!(?outcome, "Decode task finished");
    }
    outcome
}
