//! Shared wiring for coordinator integration tests: a fake synthesizer and
//! recording sinks behind real routers on a real bus.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use readaloud_app::capability::{resolve_playback_target, HostCapabilities, PlaybackTarget};
use readaloud_app::contexts::{BackgroundRouter, ContentRouter, PageSelection, PlayerRouter};
use readaloud_app::coordinator::{NoopInjector, PlaybackCoordinator};
use readaloud_playback::{AudioSink, PlaybackResult, SessionEvent, SessionEventKind};
use readaloud_protocol::{ContextBus, ContextId, Message, PlaybackStatus, Reply};
use readaloud_tts::{SpeechSynthesizer, TtsConfig, TtsError, TtsResult};

pub enum SynthBehavior {
    Succeed(Vec<u8>),
    FailApi { status: u16, message: String },
}

pub struct FakeSynth {
    pub behavior: SynthBehavior,
    pub delay: Option<Duration>,
    pub calls: Arc<AtomicUsize>,
    pub last_text: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl SpeechSynthesizer for FakeSynth {
    async fn synthesize(&self, text: &str, _config: &TtsConfig) -> TtsResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_text.lock() = Some(text.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.behavior {
            SynthBehavior::Succeed(audio) => Ok(audio.clone()),
            SynthBehavior::FailApi { status, message } => Err(TtsError::Api {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

#[derive(Default)]
pub struct RecState {
    pub started: Vec<(Vec<u8>, f32, u64)>,
    pub live_session: Option<u64>,
    pub releases: u64,
    pub pauses: u64,
    pub resumes: u64,
    pub volume_updates: Vec<f32>,
    events_tx: Option<mpsc::UnboundedSender<SessionEvent>>,
}

/// Sink that records engine calls and lets the test finish or fail the live
/// session, standing in for real audio hardware.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub state: Arc<Mutex<RecState>>,
}

impl RecordingSink {
    /// Simulate the live session reaching its natural end.
    pub fn finish_current(&self) {
        let state = self.state.lock();
        if let (Some(tx), Some(session)) = (state.events_tx.clone(), state.live_session) {
            let _ = tx.send(SessionEvent {
                session,
                kind: SessionEventKind::Ended,
            });
        }
    }

    /// Simulate the live session dying with an error.
    pub fn fail_current(&self, error: &str) {
        let state = self.state.lock();
        if let (Some(tx), Some(session)) = (state.events_tx.clone(), state.live_session) {
            let _ = tx.send(SessionEvent {
                session,
                kind: SessionEventKind::Error(error.to_string()),
            });
        }
    }
}

impl AudioSink for RecordingSink {
    fn start(
        &mut self,
        audio: Vec<u8>,
        volume: f32,
        session: u64,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> PlaybackResult<()> {
        let mut state = self.state.lock();
        state.started.push((audio, volume, session));
        state.live_session = Some(session);
        state.events_tx = Some(events);
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

pub struct HarnessOptions {
    pub register_offscreen: bool,
    pub register_popup: bool,
    pub register_content: bool,
    /// Override the resolved target (to model an unreachable primary).
    pub target: Option<PlaybackTarget>,
    pub behavior: SynthBehavior,
    pub synth_delay: Option<Duration>,
    pub config: TtsConfig,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            register_offscreen: true,
            register_popup: true,
            register_content: true,
            target: None,
            behavior: SynthBehavior::Succeed(b"fake-mp3-bytes".to_vec()),
            synth_delay: None,
            config: TtsConfig::default(),
        }
    }
}

pub struct Harness {
    pub bus: ContextBus,
    pub selection: Arc<PageSelection>,
    pub offscreen_sink: RecordingSink,
    pub popup_sink: RecordingSink,
    pub status: watch::Receiver<PlaybackStatus>,
    /// Context-menu entry point into the background router.
    pub menu: mpsc::UnboundedSender<String>,
    pub synth_calls: Arc<AtomicUsize>,
    pub last_text: Arc<Mutex<Option<String>>>,
}

pub fn start(options: HarnessOptions) -> Harness {
    let bus = ContextBus::new();
    let offscreen_sink = RecordingSink::default();
    let popup_sink = RecordingSink::default();

    if options.register_offscreen {
        let inbox = bus.register(ContextId::Offscreen, 16);
        PlayerRouter::new(
            ContextId::Offscreen,
            bus.clone(),
            Box::new(offscreen_sink.clone()),
            inbox,
        )
        .spawn();
    }

    let (status_tx, status_rx) = watch::channel(PlaybackStatus::idle());
    if options.register_popup {
        let inbox = bus.register(ContextId::Popup, 16);
        PlayerRouter::new(
            ContextId::Popup,
            bus.clone(),
            Box::new(popup_sink.clone()),
            inbox,
        )
        .with_status_watch(status_tx)
        .spawn();
    }

    let selection = PageSelection::new();
    if options.register_content {
        let content_inbox = bus.register(ContextId::Content, 16);
        ContentRouter::new(selection.clone(), content_inbox).spawn();
    }

    let target = options
        .target
        .unwrap_or_else(|| resolve_playback_target(HostCapabilities::probe(&bus)));

    let synth_calls = Arc::new(AtomicUsize::new(0));
    let last_text = Arc::new(Mutex::new(None));
    let synth = FakeSynth {
        behavior: options.behavior,
        delay: options.synth_delay,
        calls: synth_calls.clone(),
        last_text: last_text.clone(),
    };

    let coordinator = PlaybackCoordinator::new(
        bus.clone(),
        Box::new(synth),
        Box::new(NoopInjector),
        options.config,
        target,
    );
    let background_inbox = bus.register(ContextId::Background, 16);
    let (menu, menu_rx) = mpsc::unbounded_channel();
    BackgroundRouter::new(coordinator, background_inbox)
        .with_context_menu(menu_rx)
        .spawn();

    Harness {
        bus,
        selection,
        offscreen_sink,
        popup_sink,
        status: status_rx,
        menu,
        synth_calls,
        last_text,
    }
}

impl Harness {
    /// Issue a UI intent as the popup would and await its reply.
    pub async fn request(&self, message: Message) -> Reply {
        self.bus
            .send(ContextId::Popup, ContextId::Background, message)
            .await
            .expect("background context should be reachable")
    }

    pub async fn status_query(&self) -> PlaybackStatus {
        match self
            .request(Message::PlaybackStatus { status: None })
            .await
        {
            Reply::Status(status) => status,
            other => panic!("expected status reply, got {other:?}"),
        }
    }
}

/// Poll until `cond` holds, failing the test after two seconds. Needed for
/// effects of fire-and-forget control messages, which carry no reply to
/// synchronize on.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met within two seconds");
}
