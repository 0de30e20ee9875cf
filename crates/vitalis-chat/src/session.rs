//! A persona-bound multi-turn conversation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use vitalis_core::{Persona, Turn};

use crate::persona;

/// Conversation state for one persona.
///
/// The system instruction is fixed at creation. Turns are append-only and
/// guarded by an async mutex so sends against the same session run one at a
/// time.
#[derive(Debug)]
pub struct ConversationSession {
    persona: Persona,
    system_instruction: Option<&'static str>,
    created_at: DateTime<Utc>,
    turns: Mutex<Vec<Turn>>,
}

impl ConversationSession {
    pub(crate) fn new(persona: Persona) -> Self {
        Self {
            persona,
            system_instruction: persona::system_instruction(persona),
            created_at: Utc::now(),
            turns: Mutex::new(Vec::new()),
        }
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn system_instruction(&self) -> Option<&'static str> {
        self.system_instruction
    }

    /// Copy of the history, oldest first.
    pub async fn turns(&self) -> Vec<Turn> {
        self.turns.lock().await.clone()
    }

    pub async fn turn_count(&self) -> usize {
        self.turns.lock().await.len()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            persona: self.persona,
            turns: self.turn_count().await,
            created_at: self.created_at,
        }
    }

    /// Exclusive access to the history for the duration of one send.
    pub(crate) async fn lock_turns(&self) -> MutexGuard<'_, Vec<Turn>> {
        self.turns.lock().await
    }
}

/// Summary of a live session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub persona: Persona,
    pub turns: usize,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_session_is_empty() {
        let session = ConversationSession::new(Persona::Financial);
        assert_eq!(session.persona(), Persona::Financial);
        assert!(session
            .system_instruction()
            .unwrap()
            .starts_with("You are a financial management expert."));
        assert_eq!(session.turn_count().await, 0);
    }

    #[tokio::test]
    async fn test_snapshot_serializes_persona_key() {
        let session = ConversationSession::new(Persona::MentalHealth);
        session.lock_turns().await.push(Turn::new("hi", "hello"));

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.turns, 1);

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["persona"], "mental_health");
        assert_eq!(value["turns"], 1);
    }
}
