//! Device output behind a trait seam

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::{SessionEvent, SessionEventKind};
use crate::error::{PlaybackError, PlaybackResult};

/// Low-level audio output. Implementations own the decode buffer and the
/// device handle for at most one session; `stop` must release both and be
/// safe to call with no session live.
pub trait AudioSink: Send {
    /// Begin a new session. The engine guarantees any previous session was
    /// stopped first. Terminal events go to `events`, tagged with `session`.
    fn start(
        &mut self,
        audio: Vec<u8>,
        volume: f32,
        session: u64,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> PlaybackResult<()>;

    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn set_volume(&mut self, volume: f32);
}

struct RodioSession {
    sink: Arc<rodio::Sink>,
    /// Set before `Sink::stop` so the watcher thread knows the drain it
    /// observes is a teardown, not a natural end.
    cancelled: Arc<AtomicBool>,
}

/// [`AudioSink`] backed by rodio. The output stream is opened lazily on the
/// first session and kept for the lifetime of the sink.
pub struct RodioSink {
    stream: Option<rodio::OutputStream>,
    session: Option<RodioSession>,
}

impl RodioSink {
    pub fn new() -> Self {
        Self {
            stream: None,
            session: None,
        }
    }

    fn ensure_stream(&mut self) -> PlaybackResult<&rodio::OutputStream> {
        if self.stream.is_none() {
            let stream = rodio::OutputStreamBuilder::open_default_stream()
                .map_err(|e| PlaybackError::Device(e.to_string()))?;
            self.stream = Some(stream);
        }
        match &self.stream {
            Some(stream) => Ok(stream),
            None => Err(PlaybackError::Device("no output stream".into())),
        }
    }
}

impl Default for RodioSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for RodioSink {
    fn start(
        &mut self,
        audio: Vec<u8>,
        volume: f32,
        session: u64,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> PlaybackResult<()> {
        self.stop();

        let source = rodio::Decoder::new(Cursor::new(audio))
            .map_err(|e| PlaybackError::Decode(e.to_string()))?;
        let stream = self.ensure_stream()?;
        let sink = Arc::new(rodio::Sink::connect_new(stream.mixer()));
        sink.set_volume(volume);
        sink.append(source);

        let cancelled = Arc::new(AtomicBool::new(false));
        let watcher_sink = Arc::clone(&sink);
        let watcher_cancelled = Arc::clone(&cancelled);
        std::thread::spawn(move || {
            watcher_sink.sleep_until_end();
            if !watcher_cancelled.load(Ordering::SeqCst) {
                let _ = events.send(SessionEvent {
                    session,
                    kind: SessionEventKind::Ended,
                });
            }
        });

        debug!(session, "rodio session started");
        self.session = Some(RodioSession { sink, cancelled });
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(session) = &self.session {
            session.sink.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(session) = &self.session {
            session.sink.play();
        }
    }

    fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancelled.store(true, Ordering::SeqCst);
            session.sink.stop();
        }
    }

    fn set_volume(&mut self, volume: f32) {
        if let Some(session) = &self.session {
            session.sink.set_volume(volume);
        }
    }
}
