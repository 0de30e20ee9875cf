//! Session registry: one lazily created conversation per persona.
//!
//! The registry owns every session for the process lifetime, routes input to
//! the backend with the session's instruction and history, and records a turn
//! only when the backend call succeeds.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use vitalis_core::{Persona, Turn};
use vitalis_gemini::{ChatRequest, GenerativeBackend};

use crate::error::ChatError;
use crate::progress::ProgressReporter;
use crate::session::{ConversationSession, SessionSnapshot};

/// Owner of all conversation sessions.
pub struct SessionRegistry {
    backend: Arc<dyn GenerativeBackend>,
    progress: ProgressReporter,
    sessions: Mutex<HashMap<Persona, Arc<ConversationSession>>>,
}

impl SessionRegistry {
    /// Create a registry with the default session already live.
    pub fn new(backend: Arc<dyn GenerativeBackend>, progress: ProgressReporter) -> Self {
        let mut sessions = HashMap::new();
        sessions.insert(
            Persona::Default,
            Arc::new(ConversationSession::new(Persona::Default)),
        );
        Self {
            backend,
            progress,
            sessions: Mutex::new(sessions),
        }
    }

    /// Return the session for `persona`, creating it on first use.
    pub fn get_or_create(&self, persona: Persona) -> Arc<ConversationSession> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(sessions.entry(persona).or_insert_with(|| {
            tracing::info!(persona = %persona, "Created conversation session");
            Arc::new(ConversationSession::new(persona))
        }))
    }

    /// Send `input` into `session` and return the reply.
    ///
    /// Appends exactly one turn on success; the session is untouched on error.
    pub async fn send(
        &self,
        session: &ConversationSession,
        input: &str,
    ) -> Result<String, ChatError> {
        if input.trim().is_empty() {
            return Err(ChatError::EmptyInput);
        }

        let mut turns = session.lock_turns().await;
        let request = ChatRequest {
            system_instruction: session.system_instruction(),
            history: &turns[..],
            input,
        };

        let result = self
            .progress
            .track(session.persona().key(), self.backend.send_message(request))
            .await;

        match result {
            Ok(output) => {
                turns.push(Turn::new(input, output.clone()));
                tracing::debug!(
                    persona = %session.persona(),
                    turns = turns.len(),
                    "Recorded turn"
                );
                Ok(output)
            }
            Err(e) => {
                tracing::warn!(persona = %session.persona(), error = %e, "Backend call failed");
                Err(ChatError::Service(e))
            }
        }
    }

    /// `get_or_create` followed by `send`.
    pub async fn send_to(&self, persona: Persona, input: &str) -> Result<String, ChatError> {
        let session = self.get_or_create(persona);
        self.send(&session, input).await
    }

    /// Summary of a live session; never creates one.
    pub async fn snapshot(&self, persona: Persona) -> Option<SessionSnapshot> {
        let session = {
            let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
            sessions.get(&persona).cloned()
        }?;
        Some(session.snapshot().await)
    }

    /// Personas with a live session, in stable order.
    pub fn live_personas(&self) -> Vec<Persona> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let mut personas: Vec<Persona> = sessions.keys().copied().collect();
        personas.sort();
        personas
    }
}
