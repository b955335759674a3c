//! Playback session tests
//!
//! Drives the controller through the headless engine so session handoff,
//! completion and device failures can be observed without audio hardware

use speakwave::audio::{AudioFormat, SampleBuffer};
use speakwave::playback::backends::manual::{ManualEngine, ManualProbe};
use speakwave::playback::{PlaybackController, PlaybackEvent, PlaybackState};
use speakwave::SpeakwaveError;
use std::time::Duration;

fn controller() -> (PlaybackController, ManualProbe) {
    let (engine, probe) = ManualEngine::new();
    (PlaybackController::new(Box::new(engine)), probe)
}

fn buffer(value: f32) -> SampleBuffer {
    SampleBuffer {
        format: AudioFormat::new(24000, 1),
        samples: vec![value; 240],
    }
}

#[test]
fn test_play_a_then_b() {
    let (mut controller, probe) = controller();

    let a = controller.play(buffer(0.1)).unwrap();
    let b = controller.play(buffer(0.2)).unwrap();

    // Exactly one audible stream, and it is B
    assert_eq!(probe.live_streams(), vec![b]);
    assert_eq!(probe.buffer(b), Some(buffer(0.2)));
    assert_eq!(probe.stopped(), vec![a]);

    // A was halted, so it can no longer complete on its own
    assert!(!probe.finish(a));
    controller.poll_events();
    assert_eq!(controller.state(), PlaybackState::Playing(b));
}

#[test]
fn test_in_flight_completion_from_superseded_session() {
    let (mut controller, probe) = controller();

    let a = controller.play(buffer(0.1)).unwrap();
    let b = controller.play(buffer(0.2)).unwrap();

    // A's completion was already queued when B took over
    assert!(probe.deliver_completion(a));
    controller.poll_events();
    assert_eq!(controller.state(), PlaybackState::Playing(b));

    assert!(probe.finish(b));
    controller.poll_events();
    assert_eq!(controller.state(), PlaybackState::Idle);
}

#[test]
fn test_natural_completion() {
    let (mut controller, probe) = controller();

    let id = controller.play(buffer(0.5)).unwrap();
    assert!(controller.is_playing());

    probe.finish(id);
    assert!(controller.wait_until_idle(Duration::from_secs(1)));
    assert_eq!(controller.state(), PlaybackState::Idle);
    assert_eq!(controller.active_session(), None);
}

#[test]
fn test_stop_when_idle() {
    let (mut controller, _probe) = controller();

    controller.stop();
    assert_eq!(controller.state(), PlaybackState::Idle);

    let id = controller.play(buffer(0.5)).unwrap();
    controller.stop();
    controller.stop();
    assert_eq!(controller.state(), PlaybackState::Idle);

    // Completion for a stopped session changes nothing
    assert!(!controller.handle_event(PlaybackEvent::Finished(id)));
    assert_eq!(controller.state(), PlaybackState::Idle);
}

#[test]
fn test_unavailable_device_from_idle() {
    let (mut controller, probe) = controller();
    probe.set_suspended(true);

    let result = controller.play(buffer(0.5));
    assert!(matches!(result, Err(SpeakwaveError::PlaybackUnavailable(_))));
    assert_eq!(controller.state(), PlaybackState::Idle);
    assert!(probe.started().is_empty());

    // The device recovers and the next play succeeds
    probe.set_suspended(false);
    let id = controller.play(buffer(0.5)).unwrap();
    assert_eq!(probe.live_streams(), vec![id]);
}

#[test]
fn test_unavailable_device_keeps_previous_session() {
    let (mut controller, probe) = controller();

    let a = controller.play(buffer(0.1)).unwrap();
    probe.set_suspended(true);

    assert!(controller.play(buffer(0.2)).is_err());
    assert_eq!(controller.state(), PlaybackState::Playing(a));
    assert_eq!(probe.live_streams(), vec![a]);
}

#[test]
fn test_failed_stream_start_leaves_idle() {
    let (mut controller, probe) = controller();

    let a = controller.play(buffer(0.1)).unwrap();
    probe.fail_next_start();

    assert!(controller.play(buffer(0.2)).is_err());
    assert_eq!(controller.state(), PlaybackState::Idle);
    assert_eq!(probe.stopped(), vec![a]);
    assert!(probe.live_streams().is_empty());
}

#[test]
fn test_device_acquired_once() {
    let (mut controller, probe) = controller();

    for value in [0.1, 0.2, 0.3] {
        let id = controller.play(buffer(value)).unwrap();
        probe.finish(id);
        controller.poll_events();
    }
    controller.play(buffer(0.4)).unwrap();

    assert_eq!(probe.acquisitions(), 1);
    assert_eq!(probe.started().len(), 4);
}

#[test]
fn test_session_ids_unique() {
    let (mut controller, _probe) = controller();

    let ids: Vec<_> = (0..5)
        .map(|_| controller.play(buffer(0.0)).unwrap())
        .collect();

    for (i, id) in ids.iter().enumerate() {
        assert!(ids[i + 1..].iter().all(|other| other != id));
    }
}
