//! LLM Provider Strategy Pattern
//!
//! Common interface for chat-completion backends with tool calling, so the
//! orchestrator never depends on a particular vendor's wire format.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{GenerationOptions, LlmProvider};
//!
//! let provider = OpenAiProvider::from_env()?;
//! let completion = provider
//!     .complete(conversation.messages(), tools.list(), &GenerationOptions::default())
//!     .await?;
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::tool::{ToolCallRequest, ToolDefinition};

/// How the model may use the offered tools
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Model decides whether to call tools
    #[default]
    Auto,
    /// Tools are described but must not be called
    None,
}

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gpt-3.5-turbo", "llama3.2")
    pub model: String,

    /// Sampling temperature; fixed per deployment for a consistent tone
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Tool selection mode
    #[serde(default)]
    pub tool_choice: ToolChoice,
}

const fn default_temperature() -> f32 {
    0.7
}
const fn default_max_tokens() -> u32 {
    500
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            tool_choice: ToolChoice::Auto,
        }
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text, if any
    pub content: Option<String>,

    /// Tool calls requested by the model, in emitted order
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRequest>,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    /// Plain text completion
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        }
    }

    /// Completion requesting tool calls
    pub fn with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            content,
            tool_calls,
            finish_reason: Some(FinishReason::ToolCalls),
            ..Default::default()
        }
    }

    /// Text content when present and not blank
    pub fn text_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other,
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new completion backends.
/// The orchestrator works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for the conversation, offering `tools`
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &GenerationOptions,
    ) -> Result<Completion>;

    /// Check if the provider is reachable and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// A request captured by [`ScriptedProvider`]
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
    pub options: GenerationOptions,
}

/// Provider that replays a fixed script of completions
///
/// Records every request it receives. Once the script runs out it answers
/// with an empty completion. Intended for tests and offline demos.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<std::result::Result<Completion, String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a plain-text reply
    #[must_use]
    pub fn then_text(self, content: impl Into<String>) -> Self {
        self.then(Completion::text(content))
    }

    /// Queue a tool-call reply
    #[must_use]
    pub fn then_tool_calls(self, tool_calls: Vec<ToolCallRequest>) -> Self {
        self.then(Completion::with_tool_calls(None, tool_calls))
    }

    /// Queue an arbitrary completion
    #[must_use]
    pub fn then(self, completion: Completion) -> Self {
        self.lock_script().push_back(Ok(completion));
        self
    }

    /// Queue a service failure
    #[must_use]
    pub fn then_fail(self, reason: impl Into<String>) -> Self {
        self.lock_script().push_back(Err(reason.into()));
        self
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_script(
        &self,
    ) -> std::sync::MutexGuard<'_, VecDeque<std::result::Result<Completion, String>>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                messages: messages.to_vec(),
                tool_names: tools.iter().map(|t| t.name.clone()).collect(),
                options: options.clone(),
            });

        match self.lock_script().pop_front() {
            Some(Ok(mut completion)) => {
                completion.model.clone_from(&options.model);
                Ok(completion)
            }
            Some(Err(reason)) => Err(AgentError::ProviderUnavailable(reason)),
            None => Ok(Completion {
                model: options.model.clone(),
                ..Default::default()
            }),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!((opts.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(opts.max_tokens, 500);
        assert_eq!(opts.tool_choice, ToolChoice::Auto);
    }

    #[test]
    fn test_blank_content_is_not_text() {
        let completion = Completion::with_tool_calls(Some("  ".into()), Vec::new());
        assert!(completion.text_content().is_none());
        assert_eq!(Completion::text("hi").text_content(), Some("hi"));
    }

    #[tokio::test]
    async fn test_scripted_provider_replays_in_order() {
        let provider = ScriptedProvider::new()
            .then_text("first")
            .then_fail("offline");
        let opts = GenerationOptions::default();

        let first = provider.complete(&[], &[], &opts).await.unwrap();
        assert_eq!(first.content.as_deref(), Some("first"));
        assert_eq!(first.model, opts.model);

        let second = provider.complete(&[], &[], &opts).await;
        assert!(matches!(second, Err(AgentError::ProviderUnavailable(_))));

        let exhausted = provider.complete(&[], &[], &opts).await.unwrap();
        assert!(exhausted.content.is_none());
        assert_eq!(provider.requests().len(), 3);
    }
}
