//! Playback session controller
//!
//! Owns the single "now playing" slot. A new `play` always stops and
//! releases the previous stream before the next one is constructed, and
//! completion events are matched against the active session id so a
//! superseded stream can never end a newer session.

use super::engine::{AudioEngine, CompletionNotifier, PlayableStream, PlaybackEvent, SessionId};
use crate::audio::SampleBuffer;
use crate::Result;
use log::{debug, info, warn};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// Observable controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing(SessionId),
}

struct ActiveSession {
    id: SessionId,
    stream: Box<dyn PlayableStream>,
}

/// Single-stream playback controller
pub struct PlaybackController {
    /// Output device handle, acquired lazily by the engine and kept for the process lifetime
    engine: Box<dyn AudioEngine>,

    /// The audible session, if any
    active: Option<ActiveSession>,

    /// Last issued session number
    last_id: u64,

    /// Completion events from engine streams
    events_tx: Sender<PlaybackEvent>,
    events_rx: Receiver<PlaybackEvent>,
}

impl PlaybackController {
    pub fn new(engine: Box<dyn AudioEngine>) -> Self {
        debug!("Creating playback controller on {} engine", engine.name());
        let (events_tx, events_rx) = mpsc::channel();

        Self {
            engine,
            active: None,
            last_id: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> PlaybackState {
        match &self.active {
            Some(session) => PlaybackState::Playing(session.id),
            None => PlaybackState::Idle,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.active.as_ref().map(|session| session.id)
    }

    /// Start playing `buffer`, superseding any current session
    ///
    /// If the buffer's format is unusable or the output device cannot be
    /// resumed the controller is left untouched. If the engine fails to
    /// start the new stream after the previous one was released, the
    /// controller ends up `Idle`.
    pub fn play(&mut self, buffer: SampleBuffer) -> Result<SessionId> {
        buffer.format.validate()?;

        self.poll_events();

        self.engine.resume()?;

        self.stop();

        self.last_id += 1;
        let id = SessionId::new(self.last_id);
        let notifier = CompletionNotifier::new(id, self.events_tx.clone());

        debug!(
            "Starting {} ({} frames, {:?})",
            id,
            buffer.frames(),
            buffer.duration()
        );
        let stream = self.engine.start(buffer, notifier)?;

        self.active = Some(ActiveSession { id, stream });
        info!("Playback started: {}", id);
        Ok(id)
    }

    /// Halt and release the active stream; a no-op when idle
    pub fn stop(&mut self) {
        match self.active.take() {
            Some(mut session) => {
                session.stream.stop();
                info!("Playback stopped: {}", session.id);
            }
            None => debug!("Stop requested while idle"),
        }
    }

    /// Apply one engine event to the state machine
    ///
    /// Returns true when the event ended the active session.
    pub fn handle_event(&mut self, event: PlaybackEvent) -> bool {
        match event {
            PlaybackEvent::Finished(id) => {
                if self.active_session() != Some(id) {
                    debug!("Discarding stale completion for {}", id);
                    return false;
                }

                if let Some(mut session) = self.active.take() {
                    // Rendering is over; release the engine resources
                    session.stream.stop();
                }
                info!("Playback finished: {}", id);
                true
            }
        }
    }

    /// Drain pending engine events
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Block until the active session completes or `timeout` elapses
    ///
    /// Returns true when the controller is idle on return.
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.poll_events();

        while self.active.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }

            match self.events_rx.recv_timeout(remaining) {
                Ok(event) => {
                    self.handle_event(event);
                }
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("Playback event channel closed");
                    return false;
                }
            }
        }

        true
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioFormat;
    use crate::playback::backends::manual::ManualEngine;
    use crate::SpeakwaveError;

    fn buffer(len: usize) -> SampleBuffer {
        SampleBuffer {
            format: AudioFormat::new(24000, 1),
            samples: vec![0.25; len],
        }
    }

    #[test]
    fn test_idle_stop_is_noop() {
        let (engine, probe) = ManualEngine::new();
        let mut controller = PlaybackController::new(Box::new(engine));

        controller.stop();
        controller.stop();
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(probe.acquisitions(), 0);
    }

    #[test]
    fn test_play_then_finish() {
        let (engine, probe) = ManualEngine::new();
        let mut controller = PlaybackController::new(Box::new(engine));

        let id = controller.play(buffer(4)).unwrap();
        assert_eq!(controller.state(), PlaybackState::Playing(id));
        assert_eq!(probe.live_streams(), vec![id]);

        assert!(probe.finish(id));
        controller.poll_events();
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(probe.live_streams().is_empty());
    }

    #[test]
    fn test_supersede_stops_previous_first() {
        let (engine, probe) = ManualEngine::new();
        let mut controller = PlaybackController::new(Box::new(engine));

        let first = controller.play(buffer(4)).unwrap();
        let second = controller.play(buffer(8)).unwrap();

        assert_ne!(first, second);
        assert_eq!(probe.live_streams(), vec![second]);
        assert_eq!(probe.stopped(), vec![first]);
        assert_eq!(controller.active_session(), Some(second));
    }

    #[test]
    fn test_stale_completion_ignored() {
        let (engine, _probe) = ManualEngine::new();
        let mut controller = PlaybackController::new(Box::new(engine));

        let first = controller.play(buffer(4)).unwrap();
        let second = controller.play(buffer(4)).unwrap();

        assert!(!controller.handle_event(PlaybackEvent::Finished(first)));
        assert_eq!(controller.state(), PlaybackState::Playing(second));
    }

    #[test]
    fn test_suspended_device_leaves_state() {
        let (engine, probe) = ManualEngine::new();
        let mut controller = PlaybackController::new(Box::new(engine));

        let first = controller.play(buffer(4)).unwrap();
        probe.set_suspended(true);

        let result = controller.play(buffer(4));
        assert!(matches!(result, Err(SpeakwaveError::PlaybackUnavailable(_))));
        assert_eq!(controller.state(), PlaybackState::Playing(first));
        assert_eq!(probe.live_streams(), vec![first]);
    }

    #[test]
    fn test_invalid_buffer_leaves_state() {
        let (engine, handle) = ManualEngine::new();
        let mut controller = PlaybackController::new(Box::new(engine));

        let first = controller.play(buffer(4)).unwrap();
        let broken = SampleBuffer {
            format: AudioFormat::new(0, 1),
            samples: Vec::new(),
        };

        let result = controller.play(broken);
        assert!(matches!(result, Err(SpeakwaveError::Format(_))));
        assert_eq!(controller.state(), PlaybackState::Playing(first));
        assert_eq!(handle.live_streams(), vec![first]);
        assert_eq!(handle.started().len(), 1);
        assert_eq!(handle.acquisitions(), 1);
    }

    #[test]
    fn test_wait_until_idle_times_out() {
        let (engine, _probe) = ManualEngine::new();
        let mut controller = PlaybackController::new(Box::new(engine));

        controller.play(buffer(4)).unwrap();
        assert!(!controller.wait_until_idle(Duration::from_millis(10)));
        assert!(controller.is_playing());
    }

    #[test]
    fn test_drop_stops_stream() {
        let (engine, probe) = ManualEngine::new();
        let mut controller = PlaybackController::new(Box::new(engine));

        let id = controller.play(buffer(4)).unwrap();
        drop(controller);
        assert_eq!(probe.stopped(), vec![id]);
    }
}
