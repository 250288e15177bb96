//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the decode core:
//! - Logging and tracing infrastructure
//! - Configuration management and bridge wiring
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that `core-playback` depends on.
//! It establishes the logging conventions and the fail-fast capability checks
//! used throughout the system.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
