//! Session Management
//!
//! Maps opaque session ids to live agents. Sessions are created on first
//! reference and kept for the lifetime of the process; there is no eviction.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::orchestrator::{Agent, AgentFactory};

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

/// Agent shared between requests of one session; the mutex serializes turns
pub type SharedAgent = Arc<Mutex<Agent>>;

struct SessionEntry {
    agent: SharedAgent,
    created_at: DateTime<Utc>,
}

/// Process-wide map of live sessions
pub struct SessionRegistry {
    factory: AgentFactory,
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(factory: AgentFactory) -> Self {
        Self {
            factory,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a session, creating its agent on first reference
    ///
    /// Creation happens under the write lock, so concurrent first messages
    /// for the same id end up sharing one agent.
    pub fn get_or_create(&self, id: &SessionId) -> SharedAgent {
        if let Some(agent) = self.get(id) {
            return agent;
        }

        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sessions
            .entry(id.clone())
            .or_insert_with(|| {
                tracing::info!(session = %id, "Created new agent session");
                SessionEntry {
                    agent: Arc::new(Mutex::new(self.factory.create())),
                    created_at: Utc::now(),
                }
            })
            .agent
            .clone()
    }

    /// Look up an existing session
    pub fn get(&self, id: &SessionId) -> Option<SharedAgent> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(|entry| entry.agent.clone())
    }

    /// Session ids, oldest first
    pub fn ids(&self) -> Vec<SessionId> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<_> = sessions
            .iter()
            .map(|(id, entry)| (entry.created_at, id.clone()))
            .collect();
        ids.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.as_str().cmp(b.1.as_str())));
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Factory used for new sessions
    pub const fn factory(&self) -> &AgentFactory {
        &self.factory
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::orchestrator::AgentBuilder;
    use crate::provider::ScriptedProvider;
    use crate::tool::{ToolDispatcher, error_payload};

    struct NoTools;

    #[async_trait]
    impl ToolDispatcher for NoTools {
        async fn execute(&self, name: &str, _raw_arguments: &str) -> String {
            error_payload(format!("Unknown tool: {name}"))
        }
    }

    fn registry(provider: ScriptedProvider) -> SessionRegistry {
        let factory = AgentBuilder::new()
            .provider(Arc::new(provider))
            .dispatcher(Arc::new(NoTools))
            .build_factory()
            .unwrap();
        SessionRegistry::new(factory)
    }

    #[test]
    fn test_session_id_roundtrip() {
        let id = SessionId::from("default");
        assert_eq!(id.as_str(), "default");
        assert_eq!(id.to_string(), "default");
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_agent() {
        let sessions = registry(ScriptedProvider::new().then_text("hi"));
        let id = SessionId::from("abc");

        assert!(sessions.get(&id).is_none());
        let first = sessions.get_or_create(&id);
        first.lock().await.send_message("hello").await.unwrap();

        let second = sessions.get_or_create(&id);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.lock().await.history().len(), 2);
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let sessions = registry(ScriptedProvider::new().then_text("hi"));
        let a = sessions.get_or_create(&SessionId::from("a"));
        let b = sessions.get_or_create(&SessionId::from("b"));

        a.lock().await.send_message("hello").await.unwrap();
        assert_eq!(a.lock().await.history().len(), 2);
        assert!(b.lock().await.history().is_empty());
        assert_eq!(sessions.ids().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_messages_create_one_agent() {
        let sessions = Arc::new(registry(ScriptedProvider::new()));
        let id = SessionId::from("shared");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let sessions = sessions.clone();
                let id = id.clone();
                tokio::spawn(async move { sessions.get_or_create(&id) })
            })
            .collect();

        let mut agents = Vec::new();
        for handle in handles {
            agents.push(handle.await.unwrap());
        }
        assert!(agents.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_turns_on_one_session_are_serialized() {
        let mut provider = ScriptedProvider::new();
        for i in 0..8 {
            provider = provider.then_text(format!("reply {i}"));
        }
        let sessions = Arc::new(registry(provider));
        let id = SessionId::from("busy");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let agent = sessions.get_or_create(&id);
                tokio::spawn(async move {
                    agent.lock().await.send_message(&format!("msg {i}")).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Every user message is immediately followed by its own reply.
        let history = sessions.get(&id).unwrap().lock().await.history();
        assert_eq!(history.len(), 16);
        for pair in history.chunks(2) {
            assert_eq!(pair[0].role, crate::message::Role::User);
            assert_eq!(pair[1].role, crate::message::Role::Assistant);
        }
    }
}
