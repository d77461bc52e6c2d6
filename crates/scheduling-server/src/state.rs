//! Application State

use std::sync::Arc;
use std::time::Duration;

use agent_core::{LlmProvider, SessionRegistry};
use ehr_scheduling::InMemoryEhr;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// LLM provider, for health reporting
    pub provider: Arc<dyn LlmProvider>,

    /// One agent per chat session
    pub sessions: Arc<SessionRegistry>,

    /// Mock EHR backend served under `/api`
    pub ehr: Arc<InMemoryEhr>,

    /// Pace of fragments on the chat socket
    pub fragment_delay: Duration,
}
