//! # agent-runtime
//!
//! Runtime pieces for the scheduling agent.
//!
//! ## Providers
//!
//! - **OpenAI-compatible**: chat completions with tool calling against
//!   OpenAI, Ollama (`http://localhost:11434/v1`) or any compatible proxy
//!
//! ## Pacing
//!
//! [`pacing::paced_fragments`] turns a finished reply into a throttled stream
//! of word fragments for the chat socket.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env()?;
//! let factory = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .dispatcher(dispatcher)
//!     .tools(tools)
//!     .build_factory()?;
//! ```

pub mod openai;
pub mod pacing;

pub use openai::{OpenAiConfig, OpenAiProvider};
pub use pacing::{DEFAULT_FRAGMENT_DELAY, paced_fragments};

// Re-export core types for convenience
pub use agent_core::{AgentError, LlmProvider, Message, Result, Role};
