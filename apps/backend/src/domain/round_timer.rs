//! Single-slot delayed action per session.
//!
//! The timer never touches session state itself. When a deadline passes it
//! hands a [`TimerTicket`] to the configured callback, which feeds it back
//! into the session's command queue. A ticket is honoured only if it is still
//! the pending one, so a firing that races a cancel is ignored.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::AbortHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Deadline for non-judge players to submit cards.
    Playing,
    /// Deadline for the judge to pick a winner.
    Judging,
    /// Pause between a decided round and the next deal.
    RoundIntermission,
    /// Pause between a game win and the reset.
    GameWinIntermission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerTicket {
    pub generation: u64,
    pub kind: TimerKind,
}

pub type TimerCallback = Arc<dyn Fn(TimerTicket) + Send + Sync>;

struct Pending {
    ticket: TimerTicket,
    handle: Option<AbortHandle>,
}

#[derive(Default)]
pub struct RoundTimer {
    pending: Option<Pending>,
    generation: u64,
    callback: Option<TimerCallback>,
}

impl fmt::Debug for RoundTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundTimer")
            .field("pending", &self.pending_ticket())
            .field("generation", &self.generation)
            .field("driven", &self.callback.is_some())
            .finish()
    }
}

impl RoundTimer {
    /// A timer that only records deadlines; firing is left to the caller.
    pub fn detached() -> Self {
        Self::default()
    }

    /// A timer that spawns a tokio task per deadline and reports through
    /// `callback`. Must be used from within a tokio runtime.
    pub fn driven(callback: TimerCallback) -> Self {
        Self {
            pending: None,
            generation: 0,
            callback: Some(callback),
        }
    }

    /// Replace any pending deadline with a new one.
    pub fn start(&mut self, kind: TimerKind, delay: Duration) -> TimerTicket {
        self.cancel();
        self.generation += 1;
        let ticket = TimerTicket {
            generation: self.generation,
            kind,
        };

        let handle = self.callback.as_ref().map(|callback| {
            let callback = Arc::clone(callback);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                callback(ticket);
            })
            .abort_handle()
        });

        debug!(?kind, generation = ticket.generation, ?delay, "Timer started");
        self.pending = Some(Pending { ticket, handle });
        ticket
    }

    /// Drop the pending deadline, if any.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            if let Some(handle) = pending.handle {
                handle.abort();
            }
            debug!(
                kind = ?pending.ticket.kind,
                generation = pending.ticket.generation,
                "Timer cancelled"
            );
        }
    }

    /// Consume `ticket` if it is the pending one. Stale tickets return false.
    pub fn accept(&mut self, ticket: TimerTicket) -> bool {
        match &self.pending {
            Some(pending) if pending.ticket == ticket => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn pending_ticket(&self) -> Option<TimerTicket> {
        self.pending.as_ref().map(|p| p.ticket)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for RoundTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
