//! Demuxer Abstraction
//!
//! A [`MediaExtractor`] opens a media container and exposes the encoded
//! access units of one selected track, in presentation order, together with
//! their timestamps.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::buffer::CodecBuffer;
use crate::error::Result;
use crate::format::MediaFormat;

const FILE_SCHEME: &str = "file://";

/// Platform content identifier for a media source.
///
/// Accepts plain paths and `file://` URIs. Other schemes are carried through
/// untouched so that host bridges can resolve them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentLocator(String);

impl ContentLocator {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self(path.as_ref().to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve the locator to a local filesystem path, if it names one.
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if let Some(rest) = self.0.strip_prefix(FILE_SCHEME) {
            return Some(PathBuf::from(rest));
        }
        if self.0.contains("://") {
            return None;
        }
        Some(PathBuf::from(&self.0))
    }

    /// File extension, lower-cased, used as a container hint.
    pub fn extension(&self) -> Option<String> {
        let path = self.to_file_path()?;
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

impl fmt::Display for ContentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentLocator {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<PathBuf> for ContentLocator {
    fn from(value: PathBuf) -> Self {
        Self::from_path(value)
    }
}

/// An opened media container.
///
/// All methods operate on the currently selected track. Before
/// [`select_track`](MediaExtractor::select_track) is called, reads return
/// `None`.
pub trait MediaExtractor {
    /// Number of tracks exposed by the container.
    fn track_count(&self) -> usize;

    /// Format of track `index`.
    fn track_format(&self, index: usize) -> Result<MediaFormat>;

    /// Restrict reads to track `index`.
    fn select_track(&mut self, index: usize) -> Result<()>;

    /// Copy the current access unit into `buffer` at `offset`.
    ///
    /// Returns the number of bytes written, or `None` once the track is
    /// exhausted. Does not move the cursor.
    fn read_sample_data(&mut self, buffer: &mut CodecBuffer, offset: usize) -> Option<usize>;

    /// Presentation timestamp of the current access unit in microseconds.
    fn sample_time(&mut self) -> Option<u64>;

    /// Move to the next access unit. Returns `false` when none remain.
    fn advance(&mut self) -> bool;

    /// Release the underlying source. Further calls behave as if exhausted.
    fn release(&mut self);
}

/// Opens extractors for content locators.
pub trait ExtractorFactory: Send + Sync {
    fn open(&self, locator: &ContentLocator) -> Result<Box<dyn MediaExtractor>>;
}
