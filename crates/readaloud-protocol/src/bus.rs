//! In-process context bus
//!
//! Contexts register an inbox under their `ContextId` and receive
//! [`Envelope`]s from it. Two send disciplines exist and tests rely on the
//! distinction: [`ContextBus::send`] awaits exactly one reply and surfaces
//! routing failures, while [`ContextBus::notify`] and
//! [`ContextBus::broadcast`] are fire-and-forget and swallow them.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use crate::message::{Message, Reply};

/// The fixed set of execution contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextId {
    /// Service-worker context owning the playback coordinator.
    Background,
    /// Script injected into the active page.
    Content,
    /// Auxiliary audio-capable context (not present on all hosts).
    Offscreen,
    /// Popup UI context, also the fallback playback target.
    Popup,
}

/// A routed message plus its (optional) reply slot.
///
/// Handlers must answer a present reply slot exactly once; dropping it
/// unanswered surfaces as [`BusError::ReplyDropped`] at the sender.
#[derive(Debug)]
pub struct Envelope {
    pub from: ContextId,
    pub message: Message,
    pub reply: Option<oneshot::Sender<Reply>>,
}

#[derive(Debug, Error)]
pub enum BusError {
    #[error("no context registered for {0:?}")]
    Unreachable(ContextId),
    #[error("context {0:?} stopped receiving")]
    ChannelClosed(ContextId),
    #[error("context {0:?} dropped the reply channel without answering")]
    ReplyDropped(ContextId),
}

/// Routing table shared by every context in the process.
///
/// Message delivery is at-most-once and ordering is only guaranteed between
/// a single sender/receiver pair; independently triggered sends may race.
#[derive(Clone, Default)]
pub struct ContextBus {
    routes: Arc<RwLock<HashMap<ContextId, mpsc::Sender<Envelope>>>>,
}

impl ContextBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an inbox for `id`, replacing any previous registration.
    ///
    /// Re-registering models a context that was torn down by the host and
    /// restarted: the new instance takes over the identity.
    pub fn register(&self, id: ContextId, capacity: usize) -> mpsc::Receiver<Envelope> {
        let (tx, rx) = mpsc::channel(capacity);
        self.routes.write().insert(id, tx);
        rx
    }

    /// Remove `id` from the routing table (context teardown).
    pub fn unregister(&self, id: ContextId) {
        self.routes.write().remove(&id);
    }

    pub fn is_registered(&self, id: ContextId) -> bool {
        self.routes.read().contains_key(&id)
    }

    /// Send `message` to `to` and await its single reply.
    pub async fn send(
        &self,
        from: ContextId,
        to: ContextId,
        message: Message,
    ) -> Result<Reply, BusError> {
        let sender = self.routes.read().get(&to).cloned();
        let sender = sender.ok_or(BusError::Unreachable(to))?;
        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope = Envelope {
            from,
            message,
            reply: Some(reply_tx),
        };
        sender
            .send(envelope)
            .await
            .map_err(|_| BusError::ChannelClosed(to))?;
        reply_rx.await.map_err(|_| BusError::ReplyDropped(to))
    }

    /// Best-effort send with no reply. Routing failures are swallowed.
    pub async fn notify(&self, from: ContextId, to: ContextId, message: Message) {
        let sender = self.routes.read().get(&to).cloned();
        let Some(sender) = sender else {
            trace!(?from, ?to, "notify dropped: target not registered");
            return;
        };
        let envelope = Envelope {
            from,
            message,
            reply: None,
        };
        if sender.send(envelope).await.is_err() {
            trace!(?from, ?to, "notify dropped: target stopped receiving");
        }
    }

    /// Best-effort fan-out to every registered context except the sender.
    pub async fn broadcast(&self, from: ContextId, message: Message) {
        let targets: Vec<ContextId> = self
            .routes
            .read()
            .keys()
            .copied()
            .filter(|id| *id != from)
            .collect();
        for to in targets {
            self.notify(from, to, message.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::PlaybackStatus;

    #[tokio::test]
    async fn send_delivers_and_returns_reply() {
        let bus = ContextBus::new();
        let mut inbox = bus.register(ContextId::Content, 4);

        let handler = tokio::spawn(async move {
            let envelope = inbox.recv().await.expect("envelope");
            assert_eq!(envelope.from, ContextId::Background);
            assert_eq!(envelope.message, Message::GetSelectedText);
            envelope
                .reply
                .expect("reply slot")
                .send(Reply::Selection { text: "hi".into() })
                .unwrap();
        });

        let reply = bus
            .send(
                ContextId::Background,
                ContextId::Content,
                Message::GetSelectedText,
            )
            .await
            .unwrap();
        assert_eq!(reply, Reply::Selection { text: "hi".into() });
        handler.await.unwrap();
    }

    #[tokio::test]
    async fn send_to_unregistered_context_is_unreachable() {
        let bus = ContextBus::new();
        let err = bus
            .send(
                ContextId::Background,
                ContextId::Offscreen,
                Message::StopAudio,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::Unreachable(ContextId::Offscreen)));
    }

    #[tokio::test]
    async fn dropped_reply_slot_surfaces_as_error() {
        let bus = ContextBus::new();
        let mut inbox = bus.register(ContextId::Offscreen, 4);

        let handler = tokio::spawn(async move {
            let envelope = inbox.recv().await.expect("envelope");
            drop(envelope);
        });

        let err = bus
            .send(
                ContextId::Background,
                ContextId::Offscreen,
                Message::StopAudio,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::ReplyDropped(ContextId::Offscreen)));
        handler.await.unwrap();
    }

    #[tokio::test]
    async fn notify_to_unregistered_context_is_silent() {
        let bus = ContextBus::new();
        bus.notify(ContextId::Background, ContextId::Popup, Message::AudioEnded)
            .await;
    }

    #[tokio::test]
    async fn broadcast_skips_the_sender() {
        let bus = ContextBus::new();
        let mut background = bus.register(ContextId::Background, 4);
        let mut popup = bus.register(ContextId::Popup, 4);

        let status = Message::PlaybackStatus {
            status: Some(PlaybackStatus::idle()),
        };
        bus.broadcast(ContextId::Background, status.clone()).await;

        let delivered = popup.recv().await.expect("popup envelope");
        assert_eq!(delivered.message, status);
        assert!(delivered.reply.is_none());
        assert!(background.try_recv().is_err());
    }

    #[tokio::test]
    async fn reregistration_replaces_the_route() {
        let bus = ContextBus::new();
        let first = bus.register(ContextId::Content, 4);
        drop(first);
        let mut second = bus.register(ContextId::Content, 4);

        bus.notify(
            ContextId::Background,
            ContextId::Content,
            Message::AudioEnded,
        )
        .await;
        assert_eq!(
            second.recv().await.expect("envelope").message,
            Message::AudioEnded
        );
    }
}
