//! # Play a Local File
//!
//! Decodes a file on a worker thread and plays it through the default
//! output device.
//!
//! Run with:
//! `cargo run --example play_file --package core-playback --features desktop-audio -- song.flac`

use anyhow::{bail, Context, Result};
use bridge_traits::ContentLocator;
use core_playback::{
    create_decode_pump_for, DecodeTask, Listener, PlaybackListener, PlayerConfig, PumpConfig,
    SinkPlayer,
};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};

fn main() -> Result<()> {
    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: play_file <path>");
    };

    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_thread_info(true),
    )?;

    let core = CoreConfig::builder()
        .build()
        .context("desktop bridges unavailable")?;
    let devices = core.require_audio_device_factory()?;

    let locator = ContentLocator::from_path(&path);
    let task = DecodeTask::spawn(locator, move || {
        let pump = create_decode_pump_for(&core, PumpConfig::default())?;
        let player = SinkPlayer::new(devices, PlayerConfig::default())?;
        let listener: Box<dyn Listener> = Box::new(PlaybackListener::new(player));
        Ok((pump, listener))
    })?;

    let outcome = task
        .join()
        .with_context(|| format!("failed to play {path}"))?;
    println!("{path}: {outcome:?}");

    Ok(())
}
