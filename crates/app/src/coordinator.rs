//! Playback coordinator
//!
//! Authoritative owner of the logical playback state (`is_playing`,
//! `is_paused`, current text). Lives in the background context, drives the
//! TTS client and whichever context hosts the audio engine, and broadcasts a
//! fresh [`PlaybackStatus`] after every change. The playback target is
//! authoritative for end-of-life events: `AUDIO_ENDED`/`AUDIO_ERROR` always
//! force the state back to idle, whatever the coordinator believed.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::{debug, warn};

use readaloud_protocol::{ContextBus, ContextId, Message, PlaybackStatus, Reply};
use readaloud_tts::{SpeechSynthesizer, TtsConfig};

use crate::capability::PlaybackTarget;
use crate::error::CoordinatorError;

/// On-demand (re)injection of the content script into the active tab.
///
/// Failures are tolerated: the script may already be present, and the
/// subsequent selection request will fail on its own if it is not.
#[async_trait]
pub trait ContentInjector: Send + Sync {
    async fn inject(&self) -> Result<(), String>;
}

/// In-process contexts are wired at startup, nothing to inject.
pub struct NoopInjector;

#[async_trait]
impl ContentInjector for NoopInjector {
    async fn inject(&self) -> Result<(), String> {
        Ok(())
    }
}

pub struct PlaybackCoordinator {
    bus: ContextBus,
    synth: Box<dyn SpeechSynthesizer>,
    injector: Box<dyn ContentInjector>,
    config: TtsConfig,
    target: PlaybackTarget,
    /// Where the current session actually plays; follows the fallback when
    /// the primary dispatch fails so control messages reach the right place.
    active_target: ContextId,
    is_playing: bool,
    is_paused: bool,
    current_text: Option<String>,
}

impl PlaybackCoordinator {
    pub fn new(
        bus: ContextBus,
        synth: Box<dyn SpeechSynthesizer>,
        injector: Box<dyn ContentInjector>,
        config: TtsConfig,
        target: PlaybackTarget,
    ) -> Self {
        Self {
            bus,
            synth,
            injector,
            config,
            target,
            active_target: target.primary,
            is_playing: false,
            is_paused: false,
            current_text: None,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            is_playing: self.is_playing,
            is_paused: self.is_paused,
            current_text: self.current_text.clone(),
        }
    }

    pub fn config(&self) -> &TtsConfig {
        &self.config
    }

    /// Replace the held configuration (explicit save path only).
    pub fn set_config(&mut self, config: TtsConfig) {
        self.config = config;
    }

    /// Speak `text`, or the current page selection when none is given.
    ///
    /// The sequence is not atomic: any failure after the state flips to
    /// playing resets it to idle and propagates to the caller.
    pub async fn read_aloud(&mut self, text: Option<String>) -> Result<(), CoordinatorError> {
        let text = match text {
            Some(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => self.fetch_selection().await?,
        };
        if text.is_empty() {
            return Err(CoordinatorError::EmptyInput);
        }

        self.is_playing = true;
        self.is_paused = false;
        self.current_text = Some(text.clone());
        self.broadcast_status().await;

        match self.synthesize_and_dispatch(&text).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.reset_idle().await;
                Err(e)
            }
        }
    }

    /// Context-menu entry point: the host already supplied the selection, so
    /// the content-router round trip is skipped entirely.
    pub async fn read_aloud_from_menu(&mut self, selection: &str) -> Result<(), CoordinatorError> {
        self.read_aloud(Some(selection.to_string())).await
    }

    /// Guarded: only acts while playing and not paused.
    pub async fn pause(&mut self) {
        if self.is_playing && !self.is_paused {
            self.bus
                .notify(ContextId::Background, self.active_target, Message::PauseAudio)
                .await;
            self.is_paused = true;
            self.broadcast_status().await;
        }
    }

    /// Guarded: only acts while playing and paused.
    pub async fn resume(&mut self) {
        if self.is_playing && self.is_paused {
            self.bus
                .notify(
                    ContextId::Background,
                    self.active_target,
                    Message::ResumeAudio,
                )
                .await;
            self.is_paused = false;
            self.broadcast_status().await;
        }
    }

    /// Unconditional: routes a stop regardless of current state, then forces
    /// the logical state to idle.
    pub async fn stop(&mut self) {
        self.bus
            .notify(ContextId::Background, self.active_target, Message::StopAudio)
            .await;
        self.reset_idle().await;
    }

    /// Forward a volume update to the active playback target. Does not touch
    /// the logical play/pause state.
    pub async fn set_volume(&mut self, volume: f32) {
        self.bus
            .notify(
                ContextId::Background,
                self.active_target,
                Message::SetVolume { volume },
            )
            .await;
    }

    /// The playback target finished naturally.
    pub async fn on_audio_ended(&mut self) {
        self.reset_idle().await;
    }

    /// The playback target died mid-session.
    pub async fn on_audio_error(&mut self, error: Option<String>) {
        warn!(error = error.as_deref(), "playback target reported an error");
        self.reset_idle().await;
    }

    async fn reset_idle(&mut self) {
        self.is_playing = false;
        self.is_paused = false;
        self.current_text = None;
        self.broadcast_status().await;
    }

    /// Best-effort status fan-out; contexts that are not open simply miss it.
    async fn broadcast_status(&self) {
        self.bus
            .broadcast(
                ContextId::Background,
                Message::PlaybackStatus {
                    status: Some(self.status()),
                },
            )
            .await;
    }

    async fn fetch_selection(&self) -> Result<String, CoordinatorError> {
        if let Err(e) = self.injector.inject().await {
            debug!("content script injection skipped: {e}");
        }
        let reply = self
            .bus
            .send(
                ContextId::Background,
                ContextId::Content,
                Message::GetSelectedText,
            )
            .await
            .map_err(|e| CoordinatorError::Routing(format!("content script unreachable: {e}")))?;
        match reply {
            Reply::Selection { text } => Ok(text.trim().to_string()),
            other => Err(CoordinatorError::Routing(format!(
                "unexpected selection reply: {other:?}"
            ))),
        }
    }

    async fn synthesize_and_dispatch(&mut self, text: &str) -> Result<(), CoordinatorError> {
        let audio = self.synth.synthesize(text, &self.config).await?;
        let audio_data = BASE64.encode(&audio);
        self.dispatch_play(audio_data).await
    }

    /// Deliver `PLAY_AUDIO` to the primary target, retrying once via the
    /// fallback when the primary is unreachable. Losing this message would
    /// mean audio silently never plays, so unlike the control messages it
    /// must surface routing failures.
    async fn dispatch_play(&mut self, audio_data: String) -> Result<(), CoordinatorError> {
        let message = Message::PlayAudio {
            audio_data,
            volume: self.config.volume,
        };
        let primary = self.target.primary;
        match self
            .bus
            .send(ContextId::Background, primary, message.clone())
            .await
        {
            Ok(reply) => {
                self.active_target = primary;
                ack_to_result(reply).map_err(CoordinatorError::Playback)
            }
            Err(primary_err) => {
                warn!(
                    ?primary,
                    %primary_err,
                    "primary playback target unreachable, retrying via fallback"
                );
                let fallback = self.target.fallback;
                match self
                    .bus
                    .send(ContextId::Background, fallback, message)
                    .await
                {
                    Ok(reply) => {
                        self.active_target = fallback;
                        ack_to_result(reply).map_err(CoordinatorError::Playback)
                    }
                    Err(fallback_err) => Err(CoordinatorError::Routing(format!(
                        "{primary_err}; fallback: {fallback_err}"
                    ))),
                }
            }
        }
    }
}

fn ack_to_result(reply: Reply) -> Result<(), String> {
    match reply {
        Reply::Ack { success: true, .. } => Ok(()),
        Reply::Ack {
            success: false,
            error,
        } => Err(error.unwrap_or_else(|| "playback target rejected the audio".into())),
        other => Err(format!("unexpected reply from playback target: {other:?}")),
    }
}
