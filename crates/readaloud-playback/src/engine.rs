//! Session state machine: `Idle -> Playing <-> Paused -> Idle`

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::PlaybackResult;
use crate::sink::AudioSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Playing,
    Paused,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEventKind {
    /// Playback reached the end of the audio.
    Ended,
    /// The session died mid-play.
    Error(String),
}

/// Terminal event reported by a sink, tagged with the session it belongs to
/// so events from an already-superseded session can be ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub session: u64,
    pub kind: SessionEventKind,
}

/// Owns the single current audio session.
///
/// `Paused` is only reachable from `Playing`; every terminal path returns to
/// `Idle` and releases the sink resource exactly once.
pub struct PlaybackEngine {
    sink: Box<dyn AudioSink>,
    state: EngineState,
    session: u64,
    volume: f32,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl PlaybackEngine {
    pub fn new(sink: Box<dyn AudioSink>, event_tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            sink,
            state: EngineState::Idle,
            session: 0,
            volume: 1.0,
            event_tx,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Tear down any existing session and start a new one at `volume`.
    ///
    /// The pending completion surfaces later as a [`SessionEvent`] on the
    /// channel supplied at construction.
    pub fn play(&mut self, audio: Vec<u8>, volume: f32) -> PlaybackResult<()> {
        self.stop();
        self.session += 1;
        self.volume = volume.clamp(0.0, 1.0);
        self.sink
            .start(audio, self.volume, self.session, self.event_tx.clone())?;
        self.state = EngineState::Playing;
        debug!(session = self.session, volume = self.volume as f64, "session started");
        Ok(())
    }

    /// No-op unless currently playing.
    pub fn pause(&mut self) {
        if self.state == EngineState::Playing {
            self.sink.pause();
            self.state = EngineState::Paused;
        }
    }

    /// No-op unless currently paused.
    pub fn resume(&mut self) {
        if self.state == EngineState::Paused {
            self.sink.resume();
            self.state = EngineState::Playing;
        }
    }

    /// Unconditionally release the current session and return to idle.
    pub fn stop(&mut self) {
        self.sink.stop();
        self.state = EngineState::Idle;
    }

    /// Clamp to [0, 1]; applies to the live session if one exists, otherwise
    /// only sets the default for the next session.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if self.state != EngineState::Idle {
            self.sink.set_volume(self.volume);
        }
    }

    /// Apply a terminal event from the sink.
    ///
    /// Returns `true` when the event belonged to the current session and the
    /// engine transitioned to idle; stale events (from a superseded session)
    /// are ignored.
    pub fn handle_event(&mut self, event: &SessionEvent) -> bool {
        if event.session != self.session || self.state == EngineState::Idle {
            debug!(event = ?event.kind, session = event.session, "ignoring stale session event");
            return false;
        }
        self.sink.stop();
        self.state = EngineState::Idle;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeSinkState {
        started: Vec<(usize, f32, u64)>,
        live_session: Option<u64>,
        releases: u64,
        pauses: u64,
        resumes: u64,
        volume_updates: Vec<f32>,
        fail_start: bool,
    }

    #[derive(Clone, Default)]
    struct FakeSink {
        state: Arc<Mutex<FakeSinkState>>,
    }

    impl AudioSink for FakeSink {
        fn start(
            &mut self,
            audio: Vec<u8>,
            volume: f32,
            session: u64,
            _events: mpsc::UnboundedSender<SessionEvent>,
        ) -> PlaybackResult<()> {
            let mut state = self.state.lock();
            if state.fail_start {
                return Err(PlaybackError::Decode("bad payload".into()));
            }
            assert!(
                state.live_session.is_none(),
                "previous session must be released before a new one starts"
            );
            state.started.push((audio.len(), volume, session));
            state.live_session = Some(session);
            Ok(())
        }

        fn pause(&mut self) {
            self.state.lock().pauses += 1;
        }

        fn resume(&mut self) {
            self.state.lock().resumes += 1;
        }

        fn stop(&mut self) {
            let mut state = self.state.lock();
            if state.live_session.take().is_some() {
                state.releases += 1;
            }
        }

        fn set_volume(&mut self, volume: f32) {
            self.state.lock().volume_updates.push(volume);
        }
    }

    fn engine_with_fake() -> (
        PlaybackEngine,
        FakeSink,
        mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let sink = FakeSink::default();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let engine = PlaybackEngine::new(Box::new(sink.clone()), event_tx);
        (engine, sink, event_rx)
    }

    #[test]
    fn play_supersedes_previous_session() {
        let (mut engine, sink, _events) = engine_with_fake();
        engine.play(vec![1, 2, 3], 0.8).unwrap();
        engine.play(vec![4, 5], 0.8).unwrap();

        let state = sink.state.lock();
        assert_eq!(engine.state(), EngineState::Playing);
        assert_eq!(state.started.len(), 2);
        assert_eq!(state.releases, 1);
        assert_eq!(state.live_session, Some(2));
    }

    #[test]
    fn stop_releases_exactly_once_from_any_state() {
        let (mut engine, sink, _events) = engine_with_fake();

        engine.stop();
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(sink.state.lock().releases, 0);

        engine.play(vec![1], 1.0).unwrap();
        engine.pause();
        engine.stop();
        engine.stop();
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(sink.state.lock().releases, 1);
    }

    #[test]
    fn pause_and_resume_are_guarded() {
        let (mut engine, sink, _events) = engine_with_fake();

        engine.pause();
        engine.resume();
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(sink.state.lock().pauses, 0);
        assert_eq!(sink.state.lock().resumes, 0);

        engine.play(vec![1], 1.0).unwrap();
        engine.resume();
        assert_eq!(engine.state(), EngineState::Playing);

        engine.pause();
        engine.pause();
        assert_eq!(engine.state(), EngineState::Paused);
        assert_eq!(sink.state.lock().pauses, 1);

        engine.resume();
        engine.resume();
        assert_eq!(engine.state(), EngineState::Playing);
        assert_eq!(sink.state.lock().resumes, 1);
    }

    #[test]
    fn terminal_event_returns_to_idle_and_releases() {
        let (mut engine, sink, _events) = engine_with_fake();
        engine.play(vec![1], 1.0).unwrap();

        let handled = engine.handle_event(&SessionEvent {
            session: 1,
            kind: SessionEventKind::Ended,
        });
        assert!(handled);
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(sink.state.lock().releases, 1);

        // A second delivery of the same event must not double-release.
        let handled = engine.handle_event(&SessionEvent {
            session: 1,
            kind: SessionEventKind::Ended,
        });
        assert!(!handled);
        assert_eq!(sink.state.lock().releases, 1);
    }

    #[test]
    fn stale_event_from_superseded_session_is_ignored() {
        let (mut engine, sink, _events) = engine_with_fake();
        engine.play(vec![1], 1.0).unwrap();
        engine.play(vec![2], 1.0).unwrap();

        let handled = engine.handle_event(&SessionEvent {
            session: 1,
            kind: SessionEventKind::Ended,
        });
        assert!(!handled);
        assert_eq!(engine.state(), EngineState::Playing);
        // One release from the supersede, none from the stale event.
        assert_eq!(sink.state.lock().releases, 1);
    }

    #[test]
    fn error_event_also_resets_to_idle() {
        let (mut engine, _sink, _events) = engine_with_fake();
        engine.play(vec![1], 1.0).unwrap();

        let handled = engine.handle_event(&SessionEvent {
            session: 1,
            kind: SessionEventKind::Error("device lost".into()),
        });
        assert!(handled);
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn set_volume_clamps_and_only_touches_live_sessions() {
        let (mut engine, sink, _events) = engine_with_fake();

        engine.set_volume(0.4);
        assert!(sink.state.lock().volume_updates.is_empty());

        engine.play(vec![1], 0.4).unwrap();
        engine.set_volume(1.5);
        engine.pause();
        engine.set_volume(-0.5);
        assert_eq!(sink.state.lock().volume_updates, vec![1.0, 0.0]);
    }

    #[test]
    fn play_clamps_the_requested_volume() {
        let (mut engine, sink, _events) = engine_with_fake();
        engine.play(vec![1], 2.0).unwrap();
        assert_eq!(sink.state.lock().started[0].1, 1.0);
    }

    #[test]
    fn failed_start_leaves_the_engine_idle() {
        let (mut engine, sink, _events) = engine_with_fake();
        sink.state.lock().fail_start = true;
        assert!(engine.play(vec![1], 1.0).is_err());
        assert_eq!(engine.state(), EngineState::Idle);
    }
}
