//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-runtime`, `core-playback`, `bridge-traits` and the
//! optional `bridge-desktop`). Host applications can depend on
//! `pcm-pump-workspace` and enable the documented features without needing to
//! wire each crate individually.
//!
//! ## Features
//!
//! - `desktop-shims` (default): pulls in the symphonia backed demuxer and
//!   decoder and lets [`core_runtime::config::CoreConfig::builder`] fall back
//!   to them.
//! - `desktop-audio`: adds the cpal output device on top of `desktop-shims`.

pub use bridge_traits;
pub use core_playback;
pub use core_runtime;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;
