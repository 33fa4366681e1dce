//! Audio-host context router
//!
//! One instance per context that can render audio: the offscreen context on
//! hosts that support it, and the popup as fallback. Owns the playback
//! engine, answers control messages, and forwards the engine's terminal
//! events to the background as `AUDIO_ENDED`/`AUDIO_ERROR` notifications.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use readaloud_playback::{AudioSink, PlaybackEngine, SessionEvent, SessionEventKind};
use readaloud_protocol::{ContextBus, ContextId, Envelope, Message, PlaybackStatus, Reply};

pub struct PlayerRouter {
    id: ContextId,
    bus: ContextBus,
    engine: PlaybackEngine,
    inbox: mpsc::Receiver<Envelope>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    /// Popup instances publish status broadcasts here for the UI.
    status_tx: Option<watch::Sender<PlaybackStatus>>,
}

impl PlayerRouter {
    pub fn new(
        id: ContextId,
        bus: ContextBus,
        sink: Box<dyn AudioSink>,
        inbox: mpsc::Receiver<Envelope>,
    ) -> Self {
        let (event_tx, events) = mpsc::unbounded_channel();
        Self {
            id,
            bus,
            engine: PlaybackEngine::new(sink, event_tx),
            inbox,
            events,
            status_tx: None,
        }
    }

    pub fn with_status_watch(mut self, status_tx: watch::Sender<PlaybackStatus>) -> Self {
        self.status_tx = Some(status_tx);
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                envelope = self.inbox.recv() => match envelope {
                    Some(envelope) => self.dispatch(envelope),
                    None => break,
                },
                Some(event) = self.events.recv() => self.forward_terminal(event).await,
            }
        }
        debug!(id = ?self.id, "player inbox closed");
    }

    fn dispatch(&mut self, envelope: Envelope) {
        let Envelope { message, reply, .. } = envelope;

        let outcome = match message {
            Message::PlayAudio { audio_data, volume } => Some(self.play(audio_data, volume)),
            Message::PauseAudio => {
                self.engine.pause();
                Some(Reply::ok())
            }
            Message::ResumeAudio => {
                self.engine.resume();
                Some(Reply::ok())
            }
            Message::StopAudio => {
                self.engine.stop();
                Some(Reply::ok())
            }
            Message::SetVolume { volume } => {
                self.engine.set_volume(volume);
                Some(Reply::ok())
            }
            Message::PlaybackStatus {
                status: Some(status),
            } => {
                if let Some(tx) = &self.status_tx {
                    let _ = tx.send(status);
                }
                None
            }
            Message::GetSelectedText
            | Message::ReadAloud { .. }
            | Message::PausePlayback
            | Message::ResumePlayback
            | Message::StopPlayback
            | Message::PlaybackStatus { status: None }
            | Message::AudioEnded
            | Message::AudioError { .. } => Some(Reply::err("unsupported message for this context")),
        };

        if let (Some(tx), Some(reply)) = (reply, outcome) {
            let _ = tx.send(reply);
        }
    }

    fn play(&mut self, audio_data: String, volume: f32) -> Reply {
        let audio = match BASE64.decode(audio_data.as_bytes()) {
            Ok(audio) => audio,
            Err(e) => return Reply::err(format!("invalid audio payload: {e}")),
        };
        match self.engine.play(audio, volume) {
            Ok(()) => Reply::ok(),
            Err(e) => Reply::err(e.to_string()),
        }
    }

    /// Engine-reported end of life. Stale events from superseded sessions
    /// are dropped by the engine; current ones are forwarded to the
    /// coordinator, which treats this context as authoritative.
    async fn forward_terminal(&mut self, event: SessionEvent) {
        if !self.engine.handle_event(&event) {
            return;
        }
        let message = match event.kind {
            SessionEventKind::Ended => Message::AudioEnded,
            SessionEventKind::Error(error) => Message::AudioError {
                error: Some(error),
            },
        };
        self.bus.notify(self.id, ContextId::Background, message).await;
    }
}
