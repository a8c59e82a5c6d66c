//! Incremental per-turn emission.
//!
//! The orchestrator reports every completed model turn and tool turn to a
//! [`TurnObserver`]. The HTTP stream endpoint relays these updates as
//! NDJSON lines; `ask --verbose` logs them at debug level.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use super::message::ChatMessage;

/// Which phase produced an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    /// A model call completed.
    Model,
    /// All tool calls of a turn were dispatched.
    Tool,
}

/// Messages appended by one completed turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnUpdate {
    /// 1-based model turn number this update belongs to.
    pub turn: usize,
    /// Phase that produced the messages.
    pub kind: TurnKind,
    /// Messages appended during the turn, in order.
    pub messages: Vec<ChatMessage>,
}

/// Receives per-turn updates from a run.
pub trait TurnObserver: Send + Sync {
    /// Called once per completed model turn and once per completed tool turn.
    fn on_turn(&self, update: &TurnUpdate);
}

/// Observer that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl TurnObserver for NoopObserver {
    fn on_turn(&self, _update: &TurnUpdate) {}
}

impl<F> TurnObserver for F
where
    F: Fn(&TurnUpdate) + Send + Sync,
{
    fn on_turn(&self, update: &TurnUpdate) {
        self(update);
    }
}

impl TurnObserver for UnboundedSender<TurnUpdate> {
    fn on_turn(&self, update: &TurnUpdate) {
        // A closed receiver means the consumer went away; the run continues.
        let _ = self.send(update.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::agent::message::user_message;

    fn update() -> TurnUpdate {
        TurnUpdate {
            turn: 1,
            kind: TurnKind::Model,
            messages: vec![user_message("hi")],
        }
    }

    #[test]
    fn test_closure_observer() {
        let seen = Mutex::new(Vec::new());
        let observer = |u: &TurnUpdate| {
            if let Ok(mut seen) = seen.lock() {
                seen.push(u.turn);
            }
        };
        observer.on_turn(&update());
        assert_eq!(*seen.lock().unwrap_or_else(|_| unreachable!()), vec![1]);
    }

    #[tokio::test]
    async fn test_channel_observer() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.on_turn(&update());
        let received = rx.recv().await;
        assert_eq!(received, Some(update()));
    }

    #[test]
    fn test_channel_observer_ignores_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<TurnUpdate>();
        drop(rx);
        tx.on_turn(&update());
    }

    #[test]
    fn test_update_serialization() {
        let json = serde_json::to_value(update()).unwrap_or_default();
        assert_eq!(json["kind"], "model");
        assert_eq!(json["turn"], 1);
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
