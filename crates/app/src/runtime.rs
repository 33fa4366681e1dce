//! Runtime wiring
//!
//! Registers every context on the bus, spawns its router task, resolves the
//! playback target from the probed capabilities, and hands back an
//! [`AppHandle`] that owns the task handles for graceful shutdown.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use readaloud_playback::RodioSink;
use readaloud_protocol::{BusError, ContextBus, ContextId, Message, PlaybackStatus, Reply};
use readaloud_tts::{TtsClient, TtsConfig};

use crate::capability::{resolve_playback_target, HostCapabilities};
use crate::contexts::{BackgroundRouter, ContentRouter, PageSelection, PlayerRouter};
use crate::coordinator::{NoopInjector, PlaybackCoordinator};

const INBOX_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub config: TtsConfig,
    /// Hosts without offscreen support (Gecko-style) get no offscreen
    /// context, so audio routes to the popup instead.
    pub offscreen_supported: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            config: TtsConfig::default(),
            offscreen_supported: true,
        }
    }
}

/// Handle to the running context tasks.
pub struct AppHandle {
    pub bus: ContextBus,
    /// Stand-in for the page; set its text to exercise the selection path.
    pub selection: Arc<PageSelection>,
    /// Last playback status observed by the popup.
    pub status: watch::Receiver<PlaybackStatus>,
    menu_tx: mpsc::UnboundedSender<String>,
    background: JoinHandle<()>,
    content: JoinHandle<()>,
    offscreen: Option<JoinHandle<()>>,
    popup: JoinHandle<()>,
}

pub fn start(options: RuntimeOptions) -> AppHandle {
    let bus = ContextBus::new();

    let offscreen = if options.offscreen_supported {
        let inbox = bus.register(ContextId::Offscreen, INBOX_CAPACITY);
        Some(
            PlayerRouter::new(
                ContextId::Offscreen,
                bus.clone(),
                Box::new(RodioSink::new()),
                inbox,
            )
            .spawn(),
        )
    } else {
        None
    };

    let (status_tx, status_rx) = watch::channel(PlaybackStatus::idle());
    let popup_inbox = bus.register(ContextId::Popup, INBOX_CAPACITY);
    let popup = PlayerRouter::new(
        ContextId::Popup,
        bus.clone(),
        Box::new(RodioSink::new()),
        popup_inbox,
    )
    .with_status_watch(status_tx)
    .spawn();

    let selection = PageSelection::new();
    let content_inbox = bus.register(ContextId::Content, INBOX_CAPACITY);
    let content = ContentRouter::new(selection.clone(), content_inbox).spawn();

    let capabilities = HostCapabilities::probe(&bus);
    let target = resolve_playback_target(capabilities);
    info!(?capabilities, ?target, "resolved playback target");

    let coordinator = PlaybackCoordinator::new(
        bus.clone(),
        Box::new(TtsClient::new()),
        Box::new(NoopInjector),
        options.config,
        target,
    );
    let background_inbox = bus.register(ContextId::Background, INBOX_CAPACITY);
    let (menu_tx, menu_rx) = mpsc::unbounded_channel();
    let background = BackgroundRouter::new(coordinator, background_inbox)
        .with_context_menu(menu_rx)
        .spawn();

    AppHandle {
        bus,
        selection,
        status: status_rx,
        menu_tx,
        background,
        content,
        offscreen,
        popup,
    }
}

impl AppHandle {
    /// Issue a UI intent to the coordinator, as the popup would.
    pub async fn request(&self, message: Message) -> Result<Reply, BusError> {
        self.bus
            .send(ContextId::Popup, ContextId::Background, message)
            .await
    }

    /// Activate the context-menu entry point with host-supplied selection
    /// text. Fire-and-forget, like the host's menu-click event.
    pub fn context_menu(&self, selection: impl Into<String>) {
        let _ = self.menu_tx.send(selection.into());
    }

    /// Wait for the next broadcast that says playback has gone idle.
    pub async fn wait_for_idle(&mut self) {
        loop {
            if self.status.changed().await.is_err() {
                return;
            }
            if !self.status.borrow_and_update().is_playing {
                return;
            }
        }
    }

    /// Abort every router task and wait for them to wind down.
    pub async fn shutdown(self) {
        info!("shutting down read-aloud runtime");
        self.background.abort();
        self.content.abort();
        self.popup.abort();
        if let Some(offscreen) = &self.offscreen {
            offscreen.abort();
        }

        let _ = self.background.await;
        let _ = self.content.await;
        let _ = self.popup.await;
        if let Some(offscreen) = self.offscreen {
            let _ = offscreen.await;
        }
    }
}
