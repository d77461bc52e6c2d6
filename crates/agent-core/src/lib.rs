//! # agent-core
//!
//! Tool-calling conversation orchestrator with a provider-agnostic LLM
//! abstraction.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  SessionRegistry ── session id ──▶ Arc<Mutex<Agent>>             │
//! │                                                                  │
//! │  Agent                                                           │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────────┐  │
//! │  │ Conversation │  │ ToolRegistry │  │ LlmProvider (Strategy) │  │
//! │  └──────────────┘  └──────────────┘  └────────────────────────┘  │
//! │          │                 ToolDispatcher (domain-specific)      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A turn is at most two completion requests with one tool round between
//! them. See [`orchestrator`] for the state machine.

pub mod error;
pub mod message;
pub mod orchestrator;
pub mod provider;
pub mod session;
pub mod tool;

pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role};
pub use orchestrator::{Agent, AgentBuilder, AgentConfig, AgentFactory, TurnPhase};
pub use provider::{Completion, GenerationOptions, LlmProvider, ScriptedProvider};
pub use session::{SessionId, SessionRegistry, SharedAgent};
pub use tool::{ParameterSchema, ToolCallRequest, ToolDefinition, ToolDispatcher, ToolRegistry};
