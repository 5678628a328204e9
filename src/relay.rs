//! Room-based notification fan-out.
//!
//! Rooms are keyed by role and identity (`seller:7`); a room is only ever
//! joined with the identity taken from a verified token, never one the client
//! claims. Delivery is at-most-once and best-effort: if nobody is connected,
//! or the session's channel is full, the event is dropped with a warning.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;

const SESSION_BUFFER: usize = 32;

pub fn seller_room(id: i32) -> String {
    format!("seller:{id}")
}

pub fn buyer_room(id: i32) -> String {
    format!("buyer:{id}")
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Notification {
    #[serde(rename_all = "camelCase")]
    NewOrder {
        order_id: i32,
        buyer_name: String,
        total_price: f32,
        item_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    OrderDecision {
        order_id: i32,
        accepted: bool,
    },
}

struct Session {
    id: u64,
    tx: mpsc::Sender<Notification>,
}

#[derive(Default)]
struct RelayInner {
    sessions: DashMap<String, Session>,
    next_session_id: AtomicU64,
}

#[derive(Clone, Default)]
pub struct NotificationRelay {
    inner: Arc<RelayInner>,
}

impl NotificationRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the caller as the room's live session, replacing any
    /// previous one (the old session's receiver closes). Returns the session
    /// id to pass back to [`leave`](Self::leave).
    pub fn join(&self, room: &str) -> (u64, mpsc::Receiver<Notification>) {
        let id = self.inner.next_session_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        self.inner
            .sessions
            .insert(room.to_string(), Session { id, tx });
        (id, rx)
    }

    /// Removes the session, but only if it is still the room's current one —
    /// a replaced session must not evict its replacement.
    pub fn leave(&self, room: &str, session_id: u64) {
        self.inner
            .sessions
            .remove_if(room, |_, session| session.id == session_id);
    }

    /// Best-effort publish; returns whether the event was handed to a live
    /// session.
    pub fn publish(&self, room: &str, event: Notification) -> bool {
        let Some(session) = self.inner.sessions.get(room) else {
            tracing::warn!(room, "No session connected, dropping notification");
            return false;
        };

        match session.tx.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(room, "Failed to push notification: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_order(order_id: i32) -> Notification {
        Notification::NewOrder {
            order_id,
            buyer_name: "Asha".to_string(),
            total_price: 120.0,
            item_count: 2,
        }
    }

    #[tokio::test]
    async fn joined_session_receives_published_events() {
        let relay = NotificationRelay::new();
        let (_, mut rx) = relay.join(&seller_room(7));

        assert!(relay.publish(&seller_room(7), new_order(1)));
        let got = rx.recv().await.unwrap();
        assert!(matches!(got, Notification::NewOrder { order_id: 1, .. }));
    }

    #[tokio::test]
    async fn publish_to_empty_room_is_dropped() {
        let relay = NotificationRelay::new();
        assert!(!relay.publish(&seller_room(7), new_order(1)));
    }

    #[tokio::test]
    async fn rejoin_replaces_the_previous_session() {
        let relay = NotificationRelay::new();
        let (old_id, mut old_rx) = relay.join(&seller_room(7));
        let (_, mut new_rx) = relay.join(&seller_room(7));

        assert!(relay.publish(&seller_room(7), new_order(2)));
        assert!(new_rx.recv().await.is_some());
        // Old session's sender was dropped on replacement.
        assert!(old_rx.recv().await.is_none());

        // A stale leave must not evict the live session.
        relay.leave(&seller_room(7), old_id);
        assert!(relay.publish(&seller_room(7), new_order(3)));
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let relay = NotificationRelay::new();
        let (_, mut seller_rx) = relay.join(&seller_room(1));
        let (_, mut buyer_rx) = relay.join(&buyer_room(1));

        relay.publish(&buyer_room(1), Notification::OrderDecision {
            order_id: 9,
            accepted: true,
        });

        assert!(buyer_rx.recv().await.is_some());
        assert!(seller_rx.try_recv().is_err());
    }
}
