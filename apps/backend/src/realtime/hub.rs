use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::cards_types::SessionId;
use crate::domain::events::{EventSink, GameEvent, SessionEvent};
use crate::domain::state::SessionState;

const DEFAULT_CAPACITY: usize = 256;

/// Fans session events out to per-session broadcast channels.
///
/// The transport layer subscribes per session; events published while a
/// session has no subscribers are dropped. A channel is closed after it
/// carries the session's final event (`SessionEmpty` or the move to
/// Abandoned).
#[derive(Debug)]
pub struct EventHub {
    channels: DashMap<SessionId, broadcast::Sender<SessionEvent>>,
    capacity: usize,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&self, session_id: SessionId) -> broadcast::Receiver<SessionEvent> {
        self.channels
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub fn subscriber_count(&self, session_id: SessionId) -> usize {
        self.channels
            .get(&session_id)
            .map_or(0, |tx| tx.receiver_count())
    }

    /// Drop the channel for a session. Subscribers see the stream end.
    pub fn close(&self, session_id: SessionId) {
        if self.channels.remove(&session_id).is_some() {
            debug!(session_id = %session_id, "Event channel closed");
        }
    }
}

impl EventSink for EventHub {
    fn publish(&self, session_id: SessionId, event: GameEvent) {
        let Some(tx) = self.channels.get(&session_id) else {
            return;
        };
        let name = event.name();
        let last = is_final(&event);
        // Err only means nobody is listening right now.
        if tx.send(SessionEvent { session_id, event }).is_err() {
            debug!(session_id = %session_id, event = name, "No subscribers for event");
        }
        drop(tx);
        if last {
            self.close(session_id);
        }
    }
}

fn is_final(event: &GameEvent) -> bool {
    matches!(
        event,
        GameEvent::SessionEmpty
            | GameEvent::StateTransition {
                to: SessionState::Abandoned,
                ..
            }
    )
}
