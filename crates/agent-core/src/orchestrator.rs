//! Agent Orchestrator
//!
//! Runs one conversational turn against the completion service:
//!
//! ```text
//! Idle ─▶ AwaitingCompletion ─┬─▶ (no tool calls) ───────────────────────────▶ Idle
//!                             └─▶ ToolRound ─▶ AwaitingFinalCompletion ─▶ Idle
//! ```
//!
//! Exactly one tool round is performed per turn. Tool calls in the final
//! completion are logged and dropped.

use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message, Role};
use crate::provider::{Completion, GenerationOptions, LlmProvider};
use crate::tool::{ToolDispatcher, ToolRegistry};

/// Reply used when the first completion carries no text and no tool calls
pub const NO_RESPONSE_APOLOGY: &str =
    "I apologize, but I didn't receive a proper response. Could you please try again?";

/// Reply used when the completion after the tool round carries no text
pub const FINAL_RESPONSE_APOLOGY: &str =
    "I apologize, but I encountered an issue processing your request.";

const DEFAULT_GREETING_PROMPT: &str =
    "Hello, I'm here to schedule an appointment. Please help me get started.";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. \
Use the available tools to look up live data before answering.";

/// Where a turn currently is
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TurnPhase {
    #[default]
    Idle,
    AwaitingCompletion,
    ToolRound,
    AwaitingFinalCompletion,
}

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt seeding every conversation
    pub system_prompt: String,

    /// Canned user message sent by [`Agent::initial_greeting`]
    pub greeting_prompt: String,

    /// Generation options for both completion requests of a turn
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            greeting_prompt: DEFAULT_GREETING_PROMPT.into(),
            generation: GenerationOptions::default(),
        }
    }
}

/// Session-scoped orchestrator owning one conversation
///
/// Methods that run a turn take `&mut self`; share an agent behind an async
/// mutex to serialize concurrent turns.
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    dispatcher: Arc<dyn ToolDispatcher>,
    config: Arc<AgentConfig>,
    conversation: Conversation,
    phase: TurnPhase,
}

impl Agent {
    /// Create a new agent with a fresh conversation
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        dispatcher: Arc<dyn ToolDispatcher>,
        config: Arc<AgentConfig>,
    ) -> Self {
        let conversation = Conversation::new(config.system_prompt.clone());
        Self {
            provider,
            tools,
            dispatcher,
            config,
            conversation,
            phase: TurnPhase::Idle,
        }
    }

    /// Run one full turn for `text` and return the final reply
    ///
    /// On a completion-service failure the conversation is rolled back to the
    /// state right after the user message was appended.
    pub async fn send_message(&mut self, text: &str) -> Result<String> {
        self.conversation.push(Message::user(text));
        self.run_pending_turn().await
    }

    /// Re-run a turn that failed, reusing the pending user message
    pub async fn retry_last_turn(&mut self) -> Result<String> {
        let pending = self
            .conversation
            .last()
            .is_some_and(|m| m.role == Role::User);
        if !pending {
            return Err(AgentError::Session("No pending user message to retry".into()));
        }
        self.run_pending_turn().await
    }

    /// Run the turn protocol with the canned opening message
    pub async fn initial_greeting(&mut self) -> Result<String> {
        let prompt = self.config.greeting_prompt.clone();
        self.send_message(&prompt).await
    }

    /// Truncate the conversation back to the system prompt
    pub fn reset(&mut self) {
        self.conversation.reset();
        tracing::debug!("Conversation reset");
    }

    /// Conversation without the system prompt, in order
    pub fn history(&self) -> Vec<Message> {
        self.conversation.history().to_vec()
    }

    /// Full conversation, system prompt included
    pub const fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Current turn phase
    pub const fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Answer the trailing user message, rolling back on failure
    async fn run_pending_turn(&mut self) -> Result<String> {
        let checkpoint = self.conversation.len();

        let outcome = self.run_turn().await;
        if let Err(e) = &outcome {
            tracing::error!(phase = ?self.phase, error = %e, "Turn aborted");
            self.conversation.truncate(checkpoint);
        }
        self.set_phase(TurnPhase::Idle);
        outcome
    }

    async fn run_turn(&mut self) -> Result<String> {
        self.set_phase(TurnPhase::AwaitingCompletion);
        let first = self.request_completion().await?;

        if first.tool_calls.is_empty() {
            let reply = first
                .text_content()
                .map_or_else(|| NO_RESPONSE_APOLOGY.to_owned(), str::to_owned);
            self.conversation.push(Message::assistant(reply.clone()));
            return Ok(reply);
        }

        self.set_phase(TurnPhase::ToolRound);
        let calls = first.tool_calls;
        self.conversation.push(Message::assistant_tool_calls(
            first.content.unwrap_or_default(),
            calls.clone(),
        ));

        // Sequential: tool messages must follow the model's request order.
        for call in &calls {
            tracing::debug!(tool = %call.name, call_id = %call.id, "Dispatching tool call");
            let payload = self.dispatcher.execute(&call.name, &call.arguments).await;
            self.conversation.push(Message::tool(payload, call.id.clone()));
        }

        self.set_phase(TurnPhase::AwaitingFinalCompletion);
        let last = self.request_completion().await?;

        if !last.tool_calls.is_empty() {
            tracing::warn!(
                dropped = last.tool_calls.len(),
                "Ignoring tool calls after the tool round"
            );
        }

        let reply = last
            .text_content()
            .map_or_else(|| FINAL_RESPONSE_APOLOGY.to_owned(), str::to_owned);
        self.conversation.push(Message::assistant(reply.clone()));
        Ok(reply)
    }

    async fn request_completion(&self) -> Result<Completion> {
        let completion = self
            .provider
            .complete(
                self.conversation.messages(),
                self.tools.list(),
                &self.config.generation,
            )
            .await?;

        tracing::debug!(
            provider = self.provider.name(),
            tool_calls = completion.tool_calls.len(),
            "Completion received"
        );
        Ok(completion)
    }

    fn set_phase(&mut self, phase: TurnPhase) {
        if self.phase != phase {
            tracing::trace!(from = ?self.phase, to = ?phase, "Turn phase");
            self.phase = phase;
        }
    }
}

/// Shared pieces needed to spawn agents, one per session
#[derive(Clone)]
pub struct AgentFactory {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    dispatcher: Arc<dyn ToolDispatcher>,
    config: Arc<AgentConfig>,
}

impl AgentFactory {
    /// Create an agent with its own fresh conversation
    pub fn create(&self) -> Agent {
        Agent::new(
            self.provider.clone(),
            self.tools.clone(),
            self.dispatcher.clone(),
            self.config.clone(),
        )
    }

    /// Provider shared by all agents
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Tool registry shared by all agents
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }
}

/// Builder for Agent configuration
#[derive(Default)]
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    dispatcher: Option<Arc<dyn ToolDispatcher>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn dispatcher(mut self, dispatcher: Arc<dyn ToolDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn greeting_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.greeting_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn generation(mut self, generation: GenerationOptions) -> Self {
        self.config.generation = generation;
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, max: u32) -> Self {
        self.config.generation.max_tokens = max;
        self
    }

    /// Build a factory for per-session agents
    pub fn build_factory(self) -> Result<AgentFactory> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        let dispatcher = self
            .dispatcher
            .ok_or_else(|| AgentError::Config("Tool dispatcher is required".into()))?;

        Ok(AgentFactory {
            provider,
            tools: Arc::new(self.tools),
            dispatcher,
            config: Arc::new(self.config),
        })
    }

    /// Build a single agent
    pub fn build(self) -> Result<Agent> {
        Ok(self.build_factory()?.create())
    }
}
