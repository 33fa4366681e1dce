//! Content context router
//!
//! Runs in the page context and answers selection queries. The page itself
//! is an external primitive reached through [`SelectionProvider`].

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use readaloud_protocol::{Envelope, Message, Reply};

/// Access to the page's current text selection.
pub trait SelectionProvider: Send + Sync {
    fn selected_text(&self) -> String;
}

/// Settable selection used by the demo binary and tests in place of a real
/// page.
#[derive(Default)]
pub struct PageSelection {
    text: RwLock<String>,
}

impl PageSelection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, text: impl Into<String>) {
        *self.text.write() = text.into();
    }
}

impl SelectionProvider for PageSelection {
    fn selected_text(&self) -> String {
        self.text.read().clone()
    }
}

pub struct ContentRouter {
    selection: Arc<dyn SelectionProvider>,
    inbox: mpsc::Receiver<Envelope>,
}

impl ContentRouter {
    pub fn new(selection: Arc<dyn SelectionProvider>, inbox: mpsc::Receiver<Envelope>) -> Self {
        Self { selection, inbox }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        while let Some(envelope) = self.inbox.recv().await {
            self.dispatch(envelope);
        }
        debug!("content inbox closed");
    }

    fn dispatch(&mut self, envelope: Envelope) {
        let Envelope { message, reply, .. } = envelope;

        let outcome = match message {
            Message::GetSelectedText => Some(Reply::Selection {
                text: self.selection.selected_text().trim().to_string(),
            }),
            // Status broadcasts reach every context; nothing to do here.
            Message::PlaybackStatus { status: Some(_) } => None,
            Message::ReadAloud { .. }
            | Message::PausePlayback
            | Message::ResumePlayback
            | Message::StopPlayback
            | Message::PlaybackStatus { status: None }
            | Message::PlayAudio { .. }
            | Message::PauseAudio
            | Message::ResumeAudio
            | Message::StopAudio
            | Message::SetVolume { .. }
            | Message::AudioEnded
            | Message::AudioError { .. } => Some(Reply::err("unsupported message for this context")),
        };

        if let (Some(tx), Some(reply)) = (reply, outcome) {
            let _ = tx.send(reply);
        }
    }
}
