//! In-memory conversation history and the per-user session store.
//!
//! Nothing here is persisted: a conversation lives as long as its session.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;

use crate::inference::types::ChatMessage;
use crate::TokioMutex;

// ─── Conversation ───────────────────────────────────────────────────────────

/// Ordered message history of one conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a system prompt.
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(prompt)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::user(content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// The last `n` messages (fewer when the history is shorter).
    pub fn recent(&self, n: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// ─── SessionStore ───────────────────────────────────────────────────────────

/// One [`Conversation`] per session id, each behind its own async mutex.
///
/// Holding the guard for a whole turn gives one turn in flight per
/// session; turns on different sessions never contend.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: TokioMutex<HashMap<String, Arc<TokioMutex<Conversation>>>>,
    system_prompt: Option<String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// New sessions start with this system prompt.
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            sessions: TokioMutex::new(HashMap::new()),
            system_prompt: Some(prompt.into()),
        }
    }

    /// Get or create the session's conversation handle.
    pub async fn session(&self, id: &str) -> Arc<TokioMutex<Conversation>> {
        let mut sessions = self.sessions.lock().await;
        Arc::clone(sessions.entry(id.to_string()).or_insert_with(|| {
            tracing::debug!(session = %id, "creating session");
            Arc::new(TokioMutex::new(self.fresh_conversation()))
        }))
    }

    /// Wait for the session to be idle and take it for one turn.
    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<Conversation> {
        self.session(id).await.lock_owned().await
    }

    /// Take the session only if no turn is in flight.
    pub async fn try_lock(&self, id: &str) -> Option<OwnedMutexGuard<Conversation>> {
        self.session(id).await.try_lock_owned().ok()
    }

    /// Clear a session's history. Returns false for unknown sessions.
    pub async fn reset(&self, id: &str) -> bool {
        let handle = self.sessions.lock().await.get(id).cloned();
        match handle {
            Some(conversation) => {
                *conversation.lock().await = self.fresh_conversation();
                tracing::info!(session = %id, "session reset");
                true
            }
            None => false,
        }
    }

    /// Copy of the last `n` messages of a session (empty when unknown).
    pub async fn recent(&self, id: &str, n: usize) -> Vec<ChatMessage> {
        let handle = self.sessions.lock().await.get(id).cloned();
        match handle {
            Some(conversation) => conversation.lock().await.recent(n).to_vec(),
            None => Vec::new(),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    fn fresh_conversation(&self) -> Conversation {
        match &self.system_prompt {
            Some(prompt) => Conversation::with_system_prompt(prompt.clone()),
            None => Conversation::new(),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::Role;

    #[test]
    fn test_recent_returns_tail() {
        let mut conv = Conversation::new();
        for i in 0..5 {
            conv.push_user(format!("m{i}"));
        }
        let tail: Vec<&str> = conv.recent(2).iter().map(|m| m.content.as_str()).collect();
        assert_eq!(tail, vec!["m3", "m4"]);
        assert_eq!(conv.recent(50).len(), 5);
    }

    #[tokio::test]
    async fn test_session_is_created_once() {
        let store = SessionStore::new();
        store.lock("alice").await.push_user("hi");
        store.lock("alice").await.push_user("again");
        assert_eq!(store.recent("alice", 10).await.len(), 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_one_turn_in_flight_per_session() {
        let store = SessionStore::new();
        let guard = store.lock("alice").await;
        assert!(store.try_lock("alice").await.is_none());
        assert!(store.try_lock("bob").await.is_some());
        drop(guard);
        assert!(store.try_lock("alice").await.is_some());
    }

    #[tokio::test]
    async fn test_reset_restores_system_prompt() {
        let store = SessionStore::with_system_prompt("be brief");
        store.lock("alice").await.push_user("hi");
        assert!(store.reset("alice").await);
        let history = store.recent("alice", 10).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::System);
        assert!(!store.reset("nobody").await);
    }
}
