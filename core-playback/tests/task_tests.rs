//! Worker-thread decode task tests.

mod support;

use bridge_traits::ContentLocator;
use core_playback::{
    create_decode_pump, BufferAccess, CallbackListener, DecodePump, DecodeTask, Listener,
    PlaybackError, PumpConfig, PumpOutcome,
};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use support::{
    ledger, CodecScript, Event, FakeCodecFactory, FakeExtractorFactory, FakeSource,
    RecordingListener, SharedLedger,
};

fn build_pump(ledger: &SharedLedger, locator: &str, source: FakeSource) -> Box<dyn DecodePump> {
    let extractors = FakeExtractorFactory::new(ledger.clone()).with_source(locator, source);
    let codecs = FakeCodecFactory::new(ledger.clone()).with_script(CodecScript::default());
    create_decode_pump(
        BufferAccess::Direct,
        Arc::new(extractors),
        Arc::new(codecs),
        PumpConfig {
            dequeue_timeout_us: 1_000,
        },
    )
    .unwrap()
}

/// Listener that signals the first batch and then slows the loop down.
fn slow_listener(
    recorder: RecordingListener,
    first_batch: mpsc::Sender<()>,
) -> Box<dyn Listener> {
    let mut recorder_frames = recorder.clone();
    let mut recorder_finished = recorder;
    let mut signalled = false;
    Box::new(
        CallbackListener::new()
            .with_frames(move |frames| {
                recorder_frames.on_frames_available(frames);
                if !signalled {
                    signalled = true;
                    let _ = first_batch.send(());
                }
                std::thread::sleep(Duration::from_millis(2));
            })
            .with_finished(move || recorder_finished.on_finished()),
    )
}

#[test]
fn test_task_runs_session_to_completion() {
    let ledger = ledger();
    let recorder = RecordingListener::new();
    let source = FakeSource::pcm(8, 16);
    let expected = source.expected_samples();

    let task = {
        let ledger = ledger.clone();
        let recorder = recorder.clone();
        DecodeTask::spawn(ContentLocator::new("song.fake"), move || {
            Ok((build_pump(&ledger, "song.fake", source), recorder.boxed()))
        })
        .unwrap()
    };

    assert_eq!(task.join().unwrap(), PumpOutcome::Completed);
    assert_eq!(recorder.samples(), expected);
    assert_eq!(recorder.count(|e| *e == Event::Finished), 1);

    let ledger = ledger.lock();
    assert_eq!(ledger.extractor_releases.get("song.fake"), Some(&1));
    assert_eq!(ledger.codec_releases.get(&1), Some(&1));
}

#[test]
fn test_configure_failure_surfaces_through_join() {
    let ledger = ledger();
    let recorder = RecordingListener::new();

    let task = {
        let ledger = ledger.clone();
        let recorder = recorder.clone();
        DecodeTask::spawn(ContentLocator::new("empty.fake"), move || {
            Ok((
                build_pump(&ledger, "empty.fake", FakeSource::without_tracks()),
                recorder.boxed(),
            ))
        })
        .unwrap()
    };

    let err = task.join().unwrap_err();
    assert!(matches!(err, PlaybackError::NoTrack { .. }));
    assert!(recorder.events().is_empty());
}

#[test]
fn test_build_failure_surfaces_through_join() {
    let task = DecodeTask::spawn(ContentLocator::new("a"), || {
        Err(PlaybackError::InvalidConfig("no pump".to_string()))
    })
    .unwrap();

    assert!(matches!(
        task.join(),
        Err(PlaybackError::InvalidConfig(_))
    ));
}

#[test]
fn test_cancel_stops_running_session() {
    let ledger = ledger();
    let recorder = RecordingListener::new();
    let (tx, rx) = mpsc::channel();

    let task = {
        let ledger = ledger.clone();
        let recorder = recorder.clone();
        DecodeTask::spawn(ContentLocator::new("long.fake"), move || {
            Ok((
                build_pump(&ledger, "long.fake", FakeSource::pcm(100_000, 4)),
                slow_listener(recorder, tx),
            ))
        })
        .unwrap()
    };

    rx.recv_timeout(Duration::from_secs(10))
        .expect("decoding should start");
    assert!(!task.is_finished());
    task.cancel();

    assert_eq!(task.join().unwrap(), PumpOutcome::Cancelled);

    let events = recorder.events();
    assert_eq!(events.last(), Some(&Event::Finished));
    assert_eq!(recorder.count(|e| *e == Event::Finished), 1);
    assert!(recorder.samples().len() < 100_000 * 4);
    assert_eq!(ledger.lock().extractor_releases.get("long.fake"), Some(&1));
}

#[test]
fn test_drop_cancels_and_joins_worker() {
    let ledger = ledger();
    let recorder = RecordingListener::new();
    let (tx, rx) = mpsc::channel();

    let task = {
        let ledger = ledger.clone();
        let recorder = recorder.clone();
        DecodeTask::spawn(ContentLocator::new("long.fake"), move || {
            Ok((
                build_pump(&ledger, "long.fake", FakeSource::pcm(100_000, 4)),
                slow_listener(recorder, tx),
            ))
        })
        .unwrap()
    };
    let token = task.cancellation_token();

    rx.recv_timeout(Duration::from_secs(10))
        .expect("decoding should start");
    drop(task);

    // The worker has exited and torn the session down
    assert!(token.is_cancelled());
    assert_eq!(recorder.count(|e| *e == Event::Finished), 1);
    let ledger = ledger.lock();
    assert_eq!(ledger.extractor_releases.get("long.fake"), Some(&1));
    assert_eq!(ledger.codec_releases.get(&1), Some(&1));
}

#[test]
fn test_task_ids_are_unique() {
    let a = DecodeTask::spawn(ContentLocator::new("a"), || {
        Err(PlaybackError::Internal("unused".to_string()))
    })
    .unwrap();
    let b = DecodeTask::spawn(ContentLocator::new("b"), || {
        Err(PlaybackError::Internal("unused".to_string()))
    })
    .unwrap();

    assert_ne!(a.id(), b.id());
}
