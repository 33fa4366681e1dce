//! Background context router

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use readaloud_protocol::{Envelope, Message, Reply};

use crate::coordinator::PlaybackCoordinator;

/// Routes inbound messages to the [`PlaybackCoordinator`].
///
/// Besides the bus inbox, an optional context-menu channel delivers
/// host-supplied selection text: the alternate entry point that bypasses
/// the content-router round trip.
pub struct BackgroundRouter {
    coordinator: PlaybackCoordinator,
    inbox: mpsc::Receiver<Envelope>,
    menu: Option<mpsc::UnboundedReceiver<String>>,
}

impl BackgroundRouter {
    pub fn new(coordinator: PlaybackCoordinator, inbox: mpsc::Receiver<Envelope>) -> Self {
        Self {
            coordinator,
            inbox,
            menu: None,
        }
    }

    pub fn with_context_menu(mut self, menu: mpsc::UnboundedReceiver<String>) -> Self {
        self.menu = Some(menu);
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                envelope = self.inbox.recv() => match envelope {
                    Some(envelope) => self.dispatch(envelope).await,
                    None => break,
                },
                selection = recv_menu(&mut self.menu) => match selection {
                    Some(selection) => self.menu_activation(selection).await,
                    None => self.menu = None,
                },
            }
        }
        debug!("background inbox closed");
    }

    async fn menu_activation(&mut self, selection: String) {
        if let Err(e) = self.coordinator.read_aloud_from_menu(&selection).await {
            error!("context menu read aloud failed: {e}");
        }
    }

    async fn dispatch(&mut self, envelope: Envelope) {
        let Envelope {
            from,
            message,
            reply,
        } = envelope;
        debug!(?from, ?message, "background dispatch");

        let outcome = match message {
            Message::ReadAloud { text } => Some(ack(self.coordinator.read_aloud(text).await)),
            Message::PausePlayback => {
                self.coordinator.pause().await;
                Some(Reply::ok())
            }
            Message::ResumePlayback => {
                self.coordinator.resume().await;
                Some(Reply::ok())
            }
            Message::StopPlayback => {
                self.coordinator.stop().await;
                Some(Reply::ok())
            }
            // No payload: a status query from the UI.
            Message::PlaybackStatus { status: None } => {
                Some(Reply::Status(self.coordinator.status()))
            }
            // A broadcast echo; the coordinator is the source of these.
            Message::PlaybackStatus { status: Some(_) } => None,
            Message::SetVolume { volume } => {
                self.coordinator.set_volume(volume).await;
                Some(Reply::ok())
            }
            // Notifications from the playback target; no reply expected.
            Message::AudioEnded => {
                self.coordinator.on_audio_ended().await;
                None
            }
            Message::AudioError { error } => {
                self.coordinator.on_audio_error(error).await;
                None
            }
            Message::GetSelectedText
            | Message::PlayAudio { .. }
            | Message::PauseAudio
            | Message::ResumeAudio
            | Message::StopAudio => Some(Reply::err("unsupported message for this context")),
        };

        if let (Some(tx), Some(reply)) = (reply, outcome) {
            let _ = tx.send(reply);
        }
    }
}

fn ack(result: Result<(), crate::error::CoordinatorError>) -> Reply {
    match result {
        Ok(()) => Reply::ok(),
        Err(e) => Reply::err(e.to_string()),
    }
}

async fn recv_menu(menu: &mut Option<mpsc::UnboundedReceiver<String>>) -> Option<String> {
    match menu {
        Some(rx) => rx.recv().await,
        // No menu channel: park this select arm forever.
        None => std::future::pending().await,
    }
}
