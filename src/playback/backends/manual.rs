//! Headless engine driven by its caller
//!
//! Renders nothing. Streams stay "audible" until the caller finishes or
//! the controller stops them, which makes session handoff observable
//! without audio hardware. Used for `--no-play` runs and tests.

use crate::audio::SampleBuffer;
use crate::playback::engine::{AudioEngine, CompletionNotifier, PlayableStream, SessionId};
use crate::{Result, SpeakwaveError};
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

struct StreamRecord {
    buffer: SampleBuffer,
    notifier: CompletionNotifier,
    stopped: bool,
    finished: bool,
}

impl StreamRecord {
    fn is_live(&self) -> bool {
        !self.stopped && !self.finished
    }
}

#[derive(Default)]
struct ProbeState {
    /// Output context refuses to resume
    suspended: bool,
    /// Next `start` call fails
    fail_next_start: bool,
    /// Times the device was acquired
    acquisitions: usize,
    streams: Vec<StreamRecord>,
}

impl ProbeState {
    fn record(&mut self, id: SessionId) -> Option<&mut StreamRecord> {
        self.streams.iter_mut().find(|s| s.notifier.id() == id)
    }
}

/// Caller's view into a [`ManualEngine`]
#[derive(Clone)]
pub struct ManualProbe {
    state: Rc<RefCell<ProbeState>>,
}

impl ManualProbe {
    /// Simulate an output context that cannot be resumed
    pub fn set_suspended(&self, suspended: bool) {
        self.state.borrow_mut().suspended = suspended;
    }

    /// Make the next stream construction fail
    pub fn fail_next_start(&self) {
        self.state.borrow_mut().fail_next_start = true;
    }

    pub fn acquisitions(&self) -> usize {
        self.state.borrow().acquisitions
    }

    /// Sessions whose streams are currently rendering
    pub fn live_streams(&self) -> Vec<SessionId> {
        self.collect(|s| s.is_live())
    }

    /// Sessions ever started, in order
    pub fn started(&self) -> Vec<SessionId> {
        self.collect(|_| true)
    }

    /// Sessions halted before they finished
    pub fn stopped(&self) -> Vec<SessionId> {
        self.collect(|s| s.stopped)
    }

    /// Samples handed to the stream of `id`
    pub fn buffer(&self, id: SessionId) -> Option<SampleBuffer> {
        self.state.borrow_mut().record(id).map(|s| s.buffer.clone())
    }

    /// Let the stream of `id` run to completion
    ///
    /// Returns false if the stream is unknown or no longer rendering.
    pub fn finish(&self, id: SessionId) -> bool {
        let mut state = self.state.borrow_mut();
        match state.record(id) {
            Some(record) if record.is_live() => {
                record.finished = true;
                record.notifier.notify();
                true
            }
            _ => false,
        }
    }

    /// Deliver a completion event for `id` regardless of stream state
    ///
    /// Models an engine whose notification was already in flight when
    /// the stream was stopped.
    pub fn deliver_completion(&self, id: SessionId) -> bool {
        let mut state = self.state.borrow_mut();
        match state.record(id) {
            Some(record) => {
                record.notifier.notify();
                true
            }
            None => false,
        }
    }

    fn collect(&self, filter: impl Fn(&StreamRecord) -> bool) -> Vec<SessionId> {
        self.state
            .borrow()
            .streams
            .iter()
            .filter(|s| filter(s))
            .map(|s| s.notifier.id())
            .collect()
    }
}

/// Engine that never touches audio hardware
pub struct ManualEngine {
    acquired: bool,
    state: Rc<RefCell<ProbeState>>,
}

impl ManualEngine {
    pub fn new() -> (Self, ManualProbe) {
        let state = Rc::new(RefCell::new(ProbeState::default()));
        (
            Self {
                acquired: false,
                state: Rc::clone(&state),
            },
            ManualProbe { state },
        )
    }
}

impl AudioEngine for ManualEngine {
    fn name(&self) -> &str {
        "manual"
    }

    fn resume(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.suspended {
            return Err(SpeakwaveError::PlaybackUnavailable(
                "output context is suspended".to_string(),
            ));
        }
        if !self.acquired {
            debug!("Acquiring manual output device");
            state.acquisitions += 1;
            self.acquired = true;
        }
        Ok(())
    }

    fn start(
        &mut self,
        buffer: SampleBuffer,
        notifier: CompletionNotifier,
    ) -> Result<Box<dyn PlayableStream>> {
        let mut state = self.state.borrow_mut();
        if std::mem::take(&mut state.fail_next_start) {
            return Err(SpeakwaveError::PlaybackUnavailable(
                "stream could not be started".to_string(),
            ));
        }

        let id = notifier.id();
        debug!("Manual stream {} holding {} samples", id, buffer.samples.len());
        state.streams.push(StreamRecord {
            buffer,
            notifier,
            stopped: false,
            finished: false,
        });

        Ok(Box::new(ManualStream {
            id,
            state: Rc::clone(&self.state),
        }))
    }
}

struct ManualStream {
    id: SessionId,
    state: Rc<RefCell<ProbeState>>,
}

impl PlayableStream for ManualStream {
    fn id(&self) -> SessionId {
        self.id
    }

    fn stop(&mut self) {
        if let Some(record) = self.state.borrow_mut().record(self.id) {
            if !record.finished {
                record.stopped = true;
            }
        }
    }
}
