//! Playback engine abstraction
//!
//! An engine owns the process-wide output device and turns sample
//! buffers into rendering streams. Rendering runs asynchronously; the
//! end of a stream is reported back as a [`PlaybackEvent`] carrying the
//! session that started it.

use crate::audio::SampleBuffer;
use crate::Result;
use std::fmt;
use std::sync::mpsc::Sender;

/// Identity of one playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Notifications delivered from an engine to the session controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The stream rendered all of its samples
    Finished(SessionId),
}

/// Handle a stream uses to report its own completion
#[derive(Debug, Clone)]
pub struct CompletionNotifier {
    id: SessionId,
    tx: Sender<PlaybackEvent>,
}

impl CompletionNotifier {
    pub(crate) fn new(id: SessionId, tx: Sender<PlaybackEvent>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Report that the stream finished rendering
    ///
    /// Safe to call after the controller is gone; the event is dropped.
    pub fn notify(&self) {
        let _ = self.tx.send(PlaybackEvent::Finished(self.id));
    }
}

/// A decoded, rendering stream owned by the active session
pub trait PlayableStream {
    /// Session this stream belongs to
    fn id(&self) -> SessionId;

    /// Halt rendering, detach from the output device and release buffers
    ///
    /// Must be idempotent. Once it returns no further audio is rendered
    /// and the stream does not report completion.
    fn stop(&mut self);
}

/// Audio output engine
///
/// The engine is the lazily acquired device handle: it is created once,
/// handed to the controller, and reused for every session.
pub trait AudioEngine {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Acquire the output device on first use and resume it if suspended
    ///
    /// Fails with `PlaybackUnavailable` without side effects.
    fn resume(&mut self) -> Result<()>;

    /// Construct a stream from `buffer` and begin rendering it
    ///
    /// `notifier` must be signalled once when rendering completes
    /// naturally, never after [`PlayableStream::stop`].
    fn start(
        &mut self,
        buffer: SampleBuffer,
        notifier: CompletionNotifier,
    ) -> Result<Box<dyn PlayableStream>>;
}
