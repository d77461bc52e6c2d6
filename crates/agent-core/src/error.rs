//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Completion service returned an error or an unusable response
    #[error("Provider error: {0}")]
    Provider(String),

    /// Completion service unreachable or failing server-side
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Rate limited by the completion service
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication with the completion service failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Parse error (e.g., completion response parsing)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderUnavailable(_) | Self::RateLimited(_))
    }

    /// Whether this error came from the completion service itself
    pub const fn is_completion_failure(&self) -> bool {
        matches!(
            self,
            Self::Provider(_)
                | Self::ProviderUnavailable(_)
                | Self::RateLimited(_)
                | Self::Auth(_)
                | Self::Parse(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(_) | Self::Parse(_) => {
                "Something went wrong while talking to the assistant. Please try again.".into()
            }
            Self::ProviderUnavailable(_) => {
                "The assistant is currently unavailable. Please try again.".into()
            }
            Self::RateLimited(_) => "Too many requests right now. Please wait a moment.".into(),
            Self::Auth(_) => "The assistant is misconfigured (authentication failed).".into(),
            Self::Session(_) | Self::Config(_) => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AgentError::ProviderUnavailable("down".into()).is_retryable());
        assert!(AgentError::RateLimited("slow down".into()).is_retryable());
        assert!(!AgentError::Auth("bad key".into()).is_retryable());
    }

    #[test]
    fn test_completion_failures() {
        assert!(AgentError::Provider("boom".into()).is_completion_failure());
        assert!(!AgentError::Session("nothing to retry".into()).is_completion_failure());
        assert!(!AgentError::Config("Provider is required".into()).is_completion_failure());
    }

    #[test]
    fn test_user_message_hides_details() {
        let msg = AgentError::Provider("HTTP 400: secret payload".into()).user_message();
        assert!(!msg.contains("secret"));

        let msg = AgentError::Config("Tool dispatcher is required".into()).user_message();
        assert_eq!(msg, "An unexpected error occurred.");
    }
}
