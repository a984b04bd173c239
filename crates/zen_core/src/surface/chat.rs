use super::{SubmitOutcome, Surface};
use crate::assistant::Assistant;
use crate::model::{ChatMessage, ChatRole};
use crate::session::{CommitOutcome, Session};
use crate::store::now_timestamp;
use std::sync::{Mutex, PoisonError};
use time::OffsetDateTime;

/// Chat transcript: user lines and assistant replies, append-only.
#[derive(Debug, Default)]
pub struct ChatSurface {
    surface: Surface,
    transcript: Mutex<Vec<ChatMessage>>,
}

impl ChatSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.surface.is_busy()
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The session lock is released while the interpreter runs.
    pub async fn submit(
        &self,
        assistant: &Assistant,
        session: &tokio::sync::Mutex<Session>,
        input: &str,
    ) -> SubmitOutcome {
        let input = input.trim();
        if input.is_empty() {
            return SubmitOutcome::Ignored;
        }
        let Some(_guard) = self.surface.try_begin() else {
            return SubmitOutcome::Busy;
        };

        self.record(ChatRole::User, input);
        let pending = session.lock().await.begin_command(input);
        let outcome = assistant.interpret(&pending).await;
        let committed = session.lock().await.commit(pending, outcome);

        match committed {
            CommitOutcome::Applied(reply) => {
                self.record(ChatRole::Assistant, &reply);
                SubmitOutcome::Replied(reply)
            }
            CommitOutcome::Superseded => SubmitOutcome::Superseded,
        }
    }

    fn record(&self, role: ChatRole, content: &str) {
        let mut transcript = self
            .transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = next_message_id(&transcript);
        transcript.push(ChatMessage {
            id,
            role,
            content: content.to_string(),
            timestamp: now_timestamp().unwrap_or_default(),
        });
    }
}

fn next_message_id(existing: &[ChatMessage]) -> String {
    let mut stamp = OffsetDateTime::now_utc().unix_timestamp_nanos();
    loop {
        let candidate = format!("msg-{stamp}");
        if !existing.iter().any(|message| message.id == candidate) {
            return candidate;
        }
        stamp += 1;
    }
}
